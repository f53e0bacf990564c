#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::models::Author;
use crate::domain::models::ChangeStamp;
use crate::domain::models::ChatStore;
use crate::domain::models::MessageRecord;
use crate::domain::models::SessionRecord;
use crate::domain::models::StoreName;

#[derive(Default)]
struct MemoryState {
    chats: Vec<SessionRecord>,
    messages: Vec<MessageRecord>,
    last_touched: Option<ChangeStamp>,
}

static SHARED: Lazy<Arc<Mutex<MemoryState>>> =
    Lazy::new(|| return Arc::new(Mutex::new(MemoryState::default())));

/// Process-local store for running without any Supabase configuration.
/// Nothing survives an exit. `Default` shares one state across instances
/// so the worker and the change feed observe the same data.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> MemoryStore {
        return MemoryStore {
            state: SHARED.clone(),
        };
    }
}

impl MemoryStore {
    /// A store with its own empty state, detached from the process-wide
    /// one. Used by tests.
    pub fn isolated() -> MemoryStore {
        return MemoryStore {
            state: Arc::new(Mutex::new(MemoryState::default())),
        };
    }
}

impl MemoryState {
    fn touch(&mut self, chat_id: &str) {
        let now = Utc::now();
        if let Some(chat) = self.chats.iter_mut().find(|e| return e.id == chat_id) {
            chat.updated_at = now;
        }
        self.last_touched = Some(ChangeStamp {
            chat_id: chat_id.to_string(),
            updated_at: now,
        });
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    fn name(&self) -> StoreName {
        return StoreName::Memory;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_chat(&self, title: &str) -> Result<SessionRecord> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.chats.push(record.clone());
        state.last_touched = Some(ChangeStamp {
            chat_id: record.id.to_string(),
            updated_at: now,
        });

        return Ok(record);
    }

    #[allow(clippy::implicit_return)]
    async fn get_chat(&self, id: &str) -> Result<SessionRecord> {
        let state = self.state.lock().await;
        match state.chats.iter().find(|e| return e.id == id) {
            Some(record) => return Ok(record.clone()),
            None => bail!(format!("No session found for id {id}")),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn list_chats(&self) -> Result<Vec<SessionRecord>> {
        let state = self.state.lock().await;
        let mut chats = state.chats.clone();
        chats.sort_by(|a, b| return b.updated_at.cmp(&a.updated_at));

        return Ok(chats);
    }

    #[allow(clippy::implicit_return)]
    async fn rename_chat(&self, id: &str, title: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let found = match state.chats.iter_mut().find(|e| return e.id == id) {
            Some(chat) => {
                chat.title = title.to_string();
                true
            }
            None => false,
        };
        if !found {
            bail!(format!("No session found for id {id}"));
        }
        state.touch(id);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn touch_chat(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.touch(id);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_chat(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.messages.retain(|e| return e.chat_id != id);
        state.chats.retain(|e| return e.id != id);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn insert_message(
        &self,
        chat_id: &str,
        author: Author,
        content: &str,
    ) -> Result<MessageRecord> {
        let mut state = self.state.lock().await;
        if !state.chats.iter().any(|e| return e.id == chat_id) {
            bail!(format!("No session found for id {chat_id}"));
        }

        let record = MessageRecord {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            role: author.store_role().to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state.messages.push(record.clone());

        return Ok(record);
    }

    #[allow(clippy::implicit_return)]
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>> {
        let state = self.state.lock().await;

        return Ok(state
            .messages
            .iter()
            .filter(|e| return e.chat_id == chat_id)
            .cloned()
            .collect());
    }

    #[allow(clippy::implicit_return)]
    async fn update_message(&self, id: &str, content: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        match state.messages.iter_mut().find(|e| return e.id == id) {
            Some(record) => {
                record.content = content.to_string();
                return Ok(());
            }
            None => bail!(format!("No message found for id {id}")),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn delete_message(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.messages.retain(|e| return e.id != id);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_messages(&self, chat_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.messages.retain(|e| return e.chat_id != chat_id);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn latest_activity(&self) -> Result<Option<ChangeStamp>> {
        let state = self.state.lock().await;

        return Ok(state.last_touched.clone());
    }
}
