#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Author;
use crate::domain::models::ChangeStamp;
use crate::domain::models::ChatStore;
use crate::domain::models::MessageRecord;
use crate::domain::models::SessionRecord;
use crate::domain::models::StoreName;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NewChatRequest {
    title: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NewMessageRequest {
    chat_id: String,
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessagePatch {
    content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ActivityRow {
    id: String,
    updated_at: DateTime<Utc>,
}

/// PostgREST-style client for the hosted `chats` and `messages` tables.
/// Inserts ask for the created row back so the caller can reconcile the
/// server-assigned identifier.
pub struct Supabase {
    url: String,
    key: String,
    timeout: String,
}

impl Default for Supabase {
    fn default() -> Supabase {
        return Supabase {
            url: Config::get(ConfigKey::SupabaseURL),
            key: Config::get(ConfigKey::SupabaseKey),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

impl Supabase {
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        return builder
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key));
    }

    async fn expect_success(res: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if !res.status().is_success() {
            let status = res.status().as_u16();
            tracing::error!(status = status, context = context, "store request failed");
            bail!(format!("Store request failed ({context}), {status}"));
        }

        return Ok(res);
    }
}

#[async_trait]
impl ChatStore for Supabase {
    fn name(&self) -> StoreName {
        return StoreName::Supabase;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Supabase URL is not defined");
        }
        if self.key.is_empty() {
            bail!("Supabase key is not defined");
        }

        let res = self
            .authed(
                reqwest::Client::new().get(format!("{url}/rest/v1/chats?limit=1", url = self.url)),
            )
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "Supabase is not reachable");
            bail!("Supabase is not reachable");
        }

        let status = res.unwrap().status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Supabase health check failed");
            bail!("Supabase health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_chat(&self, title: &str) -> Result<SessionRecord> {
        let res = self
            .authed(
                reqwest::Client::new().post(format!("{url}/rest/v1/chats", url = self.url)),
            )
            .header("Prefer", "return=representation")
            .json(&NewChatRequest {
                title: title.to_string(),
            })
            .send()
            .await?;

        let res = Supabase::expect_success(res, "create chat").await?;
        let mut rows = res.json::<Vec<SessionRecord>>().await?;
        if rows.is_empty() {
            bail!("Store did not return the created chat row");
        }

        return Ok(rows.remove(0));
    }

    #[allow(clippy::implicit_return)]
    async fn get_chat(&self, id: &str) -> Result<SessionRecord> {
        let res = self
            .authed(reqwest::Client::new().get(format!(
                "{url}/rest/v1/chats?id=eq.{id}&limit=1",
                url = self.url
            )))
            .send()
            .await?;

        let res = Supabase::expect_success(res, "get chat").await?;
        let mut rows = res.json::<Vec<SessionRecord>>().await?;
        if rows.is_empty() {
            bail!(format!("No session found for id {id}"));
        }

        return Ok(rows.remove(0));
    }

    #[allow(clippy::implicit_return)]
    async fn list_chats(&self) -> Result<Vec<SessionRecord>> {
        let res = self
            .authed(reqwest::Client::new().get(format!(
                "{url}/rest/v1/chats?order=updated_at.desc",
                url = self.url
            )))
            .send()
            .await?;

        let res = Supabase::expect_success(res, "list chats").await?;

        return Ok(res.json::<Vec<SessionRecord>>().await?);
    }

    #[allow(clippy::implicit_return)]
    async fn rename_chat(&self, id: &str, title: &str) -> Result<()> {
        let res = self
            .authed(reqwest::Client::new().patch(format!(
                "{url}/rest/v1/chats?id=eq.{id}",
                url = self.url
            )))
            .json(&ChatPatch {
                title: Some(title.to_string()),
                updated_at: Utc::now(),
            })
            .send()
            .await?;

        Supabase::expect_success(res, "rename chat").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn touch_chat(&self, id: &str) -> Result<()> {
        let res = self
            .authed(reqwest::Client::new().patch(format!(
                "{url}/rest/v1/chats?id=eq.{id}",
                url = self.url
            )))
            .json(&ChatPatch {
                title: None,
                updated_at: Utc::now(),
            })
            .send()
            .await?;

        Supabase::expect_success(res, "touch chat").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_chat(&self, id: &str) -> Result<()> {
        // The messages go first so a failure can't orphan them.
        self.delete_messages(id).await?;

        let res = self
            .authed(reqwest::Client::new().delete(format!(
                "{url}/rest/v1/chats?id=eq.{id}",
                url = self.url
            )))
            .send()
            .await?;

        Supabase::expect_success(res, "delete chat").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn insert_message(
        &self,
        chat_id: &str,
        author: Author,
        content: &str,
    ) -> Result<MessageRecord> {
        let res = self
            .authed(
                reqwest::Client::new().post(format!("{url}/rest/v1/messages", url = self.url)),
            )
            .header("Prefer", "return=representation")
            .json(&NewMessageRequest {
                chat_id: chat_id.to_string(),
                role: author.store_role().to_string(),
                content: content.to_string(),
            })
            .send()
            .await?;

        let res = Supabase::expect_success(res, "insert message").await?;
        let mut rows = res.json::<Vec<MessageRecord>>().await?;
        if rows.is_empty() {
            bail!("Store did not return the created message row");
        }

        return Ok(rows.remove(0));
    }

    #[allow(clippy::implicit_return)]
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>> {
        let res = self
            .authed(reqwest::Client::new().get(format!(
                "{url}/rest/v1/messages?chat_id=eq.{chat_id}&order=created_at.asc",
                url = self.url
            )))
            .send()
            .await?;

        let res = Supabase::expect_success(res, "list messages").await?;

        return Ok(res.json::<Vec<MessageRecord>>().await?);
    }

    #[allow(clippy::implicit_return)]
    async fn update_message(&self, id: &str, content: &str) -> Result<()> {
        let res = self
            .authed(reqwest::Client::new().patch(format!(
                "{url}/rest/v1/messages?id=eq.{id}",
                url = self.url
            )))
            .json(&MessagePatch {
                content: content.to_string(),
            })
            .send()
            .await?;

        Supabase::expect_success(res, "update message").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_message(&self, id: &str) -> Result<()> {
        let res = self
            .authed(reqwest::Client::new().delete(format!(
                "{url}/rest/v1/messages?id=eq.{id}",
                url = self.url
            )))
            .send()
            .await?;

        Supabase::expect_success(res, "delete message").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_messages(&self, chat_id: &str) -> Result<()> {
        let res = self
            .authed(reqwest::Client::new().delete(format!(
                "{url}/rest/v1/messages?chat_id=eq.{chat_id}",
                url = self.url
            )))
            .send()
            .await?;

        Supabase::expect_success(res, "delete messages").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn latest_activity(&self) -> Result<Option<ChangeStamp>> {
        let res = self
            .authed(reqwest::Client::new().get(format!(
                "{url}/rest/v1/chats?select=id,updated_at&order=updated_at.desc&limit=1",
                url = self.url
            )))
            .send()
            .await?;

        let res = Supabase::expect_success(res, "latest activity").await?;
        let rows = res.json::<Vec<ActivityRow>>().await?;

        return Ok(rows.first().map(|row| {
            return ChangeStamp {
                chat_id: row.id.to_string(),
                updated_at: row.updated_at,
            };
        }));
    }
}
