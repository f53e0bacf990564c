#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::collections::HashMap;

use anyhow::bail;
use anyhow::Result;
use uuid::Uuid;

use crate::domain::models::Author;
use crate::domain::models::ChatStoreBox;
use crate::domain::models::Message;

pub const GREETING: &str = "Hi! I'm Career Spark. I can help you draft cover letters, sharpen resume bullets, and rehearse interview answers. What are you working on today?";

/// The single source of truth for what the user sees right now: an ordered
/// message log mirroring the remote store, plus a position to remote
/// identifier index used to route edits and deletes to the right row.
///
/// The index is always rebuilt wholesale after a splice (load, delete,
/// truncate). Reconciliation of optimistic appends keys on the message's
/// local id, not its position, so a concurrent removal cannot attach a
/// remote identifier to the wrong row.
pub struct Conversation {
    messages: Vec<Message>,
    index: HashMap<usize, String>,
}

impl Default for Conversation {
    fn default() -> Conversation {
        let mut conversation = Conversation {
            messages: vec![],
            index: HashMap::new(),
        };
        conversation.reset();

        return conversation;
    }
}

impl Conversation {
    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn index(&self) -> &HashMap<usize, String> {
        return &self.index;
    }

    pub fn message(&self, local_id: Uuid) -> Option<&Message> {
        return self.messages.iter().find(|e| return e.local_id == local_id);
    }

    pub fn position_of(&self, local_id: Uuid) -> Option<usize> {
        return self
            .messages
            .iter()
            .position(|e| return e.local_id == local_id);
    }

    /// Drops everything and installs the synthetic greeting.
    pub fn reset(&mut self) {
        self.messages = vec![Message::new(Author::Assistant, GREETING)];
        self.rebuild_index();
    }

    /// Replaces the local sequence with the server-ordered message rows.
    /// Zero rows installs the synthetic greeting instead.
    pub async fn load(&mut self, store: &ChatStoreBox, chat_id: &str) -> Result<()> {
        let records = store.list_messages(chat_id).await?;
        if records.is_empty() {
            self.reset();
            return Ok(());
        }

        let mut messages: Vec<Message> = vec![];
        for record in records {
            let mut message =
                Message::new(Author::from_store_role(&record.role)?, &record.content);
            message.remote_id = Some(record.id);
            messages.push(message);
        }

        self.messages = messages;
        self.rebuild_index();

        return Ok(());
    }

    /// Optimistic append. Returns the local id used later to reconcile the
    /// server-assigned identifier.
    pub fn append_local(&mut self, author: Author, text: &str) -> Uuid {
        let message = Message::new(author, text);
        let local_id = message.local_id;
        self.add_message(message);

        return local_id;
    }

    pub fn add_message(&mut self, message: Message) {
        let position = self.messages.len();
        if let Some(remote_id) = &message.remote_id {
            self.index.insert(position, remote_id.to_string());
        }
        self.messages.push(message);
    }

    /// Attaches a server identifier to an optimistic message, if it still
    /// exists. Returns false when the message was removed in the meantime.
    pub fn reconcile(&mut self, local_id: Uuid, remote_id: &str) -> bool {
        let position = match self.position_of(local_id) {
            Some(position) => position,
            None => return false,
        };

        self.messages[position].remote_id = Some(remote_id.to_string());
        self.index.insert(position, remote_id.to_string());

        return true;
    }

    /// Remote-first edit. A message without an identifier has nothing to
    /// reconcile yet and is mutated locally only.
    pub async fn edit(
        &mut self,
        store: &ChatStoreBox,
        position: usize,
        text: &str,
    ) -> Result<()> {
        if position >= self.messages.len() {
            bail!(format!("No message at position {position}"));
        }

        if let Some(remote_id) = self.messages[position].remote_id.clone() {
            store.update_message(&remote_id, text).await?;
        }
        self.messages[position].text = text.to_string();

        return Ok(());
    }

    /// Remote-first delete. A remote failure leaves the local sequence and
    /// index untouched so the UI never drifts from the store.
    pub async fn delete(&mut self, store: &ChatStoreBox, position: usize) -> Result<()> {
        if position >= self.messages.len() {
            bail!(format!("No message at position {position}"));
        }

        if let Some(remote_id) = self.messages[position].remote_id.clone() {
            store.delete_message(&remote_id).await?;
        }
        self.messages.remove(position);
        self.rebuild_index();

        return Ok(());
    }

    /// Drops every message after the given user message. Local only; any
    /// remote rows among the dropped tail are the caller's responsibility.
    pub fn truncate_after(&mut self, user_position: usize) {
        if user_position + 1 >= self.messages.len() {
            return;
        }

        self.messages.truncate(user_position + 1);
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .messages
            .iter()
            .enumerate()
            .filter_map(|(position, message)| {
                let remote_id = message.remote_id.clone()?;
                return Some((position, remote_id));
            })
            .collect();
    }
}
