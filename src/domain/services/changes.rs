use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::ChangeStamp;
use crate::domain::models::ChatStoreBox;

/// Polls the store's latest-activity watermark and asks the worker to
/// resynchronize whenever it moves. The worker answers with a full reload
/// of the affected session, so a notification can never partially merge.
pub struct ChangeFeed {}

impl ChangeFeed {
    pub async fn start(store: ChatStoreBox, tx: mpsc::UnboundedSender<Action>) -> Result<()> {
        let poll = Config::get(ConfigKey::StorePollSeconds).parse::<u64>()?;

        // Seed the watermark so startup never triggers a spurious reload.
        let mut watermark: Option<ChangeStamp> = match store.latest_activity().await {
            Ok(stamp) => stamp,
            Err(err) => {
                tracing::warn!(err = ?err, "change feed could not read initial watermark");
                None
            }
        };

        loop {
            time::sleep(Duration::from_secs(poll)).await;

            match store.latest_activity().await {
                Ok(Some(stamp)) => {
                    if watermark.as_ref() != Some(&stamp) {
                        watermark = Some(stamp.clone());
                        tx.send(Action::SyncSession(stamp.chat_id))?;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(err = ?err, "change feed poll failed");
                }
            }
        }
    }
}
