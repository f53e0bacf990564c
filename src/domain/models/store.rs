use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use strum::EnumIter;
use strum::EnumVariantNames;

use super::Author;
use super::MessageRecord;
use super::SessionRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreName {
    Supabase,
    Memory,
}

impl StoreName {
    pub fn parse(text: String) -> Result<StoreName> {
        if text == "supabase" {
            return Ok(StoreName::Supabase);
        }
        if text == "memory" {
            return Ok(StoreName::Memory);
        }

        bail!(format!("{text} is not a valid store."))
    }
}

/// The most recent write observed anywhere in the store, used as a
/// change-feed watermark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeStamp {
    pub chat_id: String,
    pub updated_at: DateTime<Utc>,
}

/// The hosted relational backend, reduced to the access pattern the app
/// needs: insert-and-return-identifier, ordered select, update/delete by
/// identifier, bulk delete by chat, and a latest-activity probe.
#[async_trait]
pub trait ChatStore {
    fn name(&self) -> StoreName;

    /// Used at startup to verify all configurations are available to work
    /// with the store.
    async fn health_check(&self) -> Result<()>;

    async fn create_chat(&self, title: &str) -> Result<SessionRecord>;

    async fn get_chat(&self, id: &str) -> Result<SessionRecord>;

    /// All chats, most recently updated first.
    async fn list_chats(&self) -> Result<Vec<SessionRecord>>;

    /// Updates the title and advances the updated timestamp.
    async fn rename_chat(&self, id: &str, title: &str) -> Result<()>;

    /// Advances the updated timestamp without touching the title.
    async fn touch_chat(&self, id: &str) -> Result<()>;

    /// Deletes a chat and, by cascade, its messages.
    async fn delete_chat(&self, id: &str) -> Result<()>;

    async fn insert_message(
        &self,
        chat_id: &str,
        author: Author,
        content: &str,
    ) -> Result<MessageRecord>;

    /// All messages for a chat, ordered by creation time ascending.
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>>;

    async fn update_message(&self, id: &str, content: &str) -> Result<()>;

    async fn delete_message(&self, id: &str) -> Result<()>;

    async fn delete_messages(&self, chat_id: &str) -> Result<()>;

    /// The newest chat-level write, if any. Stands in for the hosted
    /// store's push notification feed.
    async fn latest_activity(&self) -> Result<Option<ChangeStamp>>;
}

pub type ChatStoreBox = Box<dyn ChatStore + Send + Sync>;
