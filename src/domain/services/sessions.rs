#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use super::prompts;
use super::Conversation;
use crate::domain::models::ChatStoreBox;
use crate::domain::models::SessionRecord;

/// Governs the transition between "no active session" (a local draft log
/// only) and "active session with persisted messages". Owns the unsent
/// draft side-channel, which is cleared on every session transition.
pub struct SessionManager {
    store: ChatStoreBox,
    active: Option<SessionRecord>,
    conversation: Conversation,
    draft: Option<String>,
    creating: bool,
}

impl SessionManager {
    pub fn new(store: ChatStoreBox) -> SessionManager {
        return SessionManager {
            store,
            active: None,
            conversation: Conversation::default(),
            draft: None,
            creating: false,
        };
    }

    pub fn store(&self) -> &ChatStoreBox {
        return &self.store;
    }

    pub fn active(&self) -> Option<&SessionRecord> {
        return self.active.as_ref();
    }

    pub fn conversation(&self) -> &Conversation {
        return &self.conversation;
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        return &mut self.conversation;
    }

    /// Back to a draft session: greeting-only log, no identifier, no draft.
    pub fn new_session(&mut self) {
        self.active = None;
        self.draft = None;
        self.creating = false;
        self.conversation.reset();
    }

    pub async fn select_session(&mut self, id: &str) -> Result<SessionRecord> {
        let record = self.store.get_chat(id).await?;
        self.conversation.load(&self.store, id).await?;
        self.active = Some(record.clone());
        self.draft = None;

        return Ok(record);
    }

    /// Creates the remote session on first submission, deriving the title
    /// from the first user message. Returns the existing record when a
    /// session is already active. At most one creation may be in flight; a
    /// second call during that window is a caller error.
    pub async fn ensure_session(&mut self, first_user_text: &str) -> Result<SessionRecord> {
        if let Some(active) = &self.active {
            return Ok(active.clone());
        }
        if self.creating {
            bail!("A session creation is already in flight.");
        }

        self.creating = true;
        let res = self.store.create_chat(&prompts::derive_title(first_user_text)).await;
        self.creating = false;

        let record = res?;
        self.active = Some(record.clone());
        self.draft = None;

        return Ok(record);
    }

    /// Cascade-deletes the chat. Deleting the active session falls back to
    /// a fresh draft session.
    pub async fn delete_session(&mut self, id: &str) -> Result<()> {
        self.store.delete_chat(id).await?;

        if self.active.as_ref().map(|e| return e.id.to_string()) == Some(id.to_string()) {
            self.new_session();
        }

        return Ok(());
    }

    pub async fn rename_session(&mut self, id: &str, title: &str) -> Result<()> {
        self.store.rename_chat(id, title).await?;

        if let Some(active) = &mut self.active {
            if active.id == id {
                active.title = title.to_string();
            }
        }

        return Ok(());
    }

    pub async fn list(&self) -> Result<Vec<SessionRecord>> {
        return self.store.list_chats().await;
    }

    /// Full reload of the active session's messages, used when the store
    /// signals a change. Reload replaces the whole sequence, so it is
    /// idempotent and last-write-wins.
    pub async fn reload(&mut self) -> Result<()> {
        if let Some(active) = &self.active {
            let id = active.id.to_string();
            self.conversation.load(&self.store, &id).await?;
        }

        return Ok(());
    }

    pub async fn edit_message(&mut self, position: usize, text: &str) -> Result<()> {
        return self.conversation.edit(&self.store, position, text).await;
    }

    pub async fn delete_message(&mut self, position: usize) -> Result<()> {
        return self.conversation.delete(&self.store, position).await;
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = Some(text.to_string());
    }

    pub fn take_draft(&mut self) -> Option<String> {
        return self.draft.take();
    }

    pub fn draft(&self) -> Option<&String> {
        return self.draft.as_ref();
    }
}
