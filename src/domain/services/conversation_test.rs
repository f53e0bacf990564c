use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use super::Conversation;
use super::GREETING;
use crate::domain::models::Author;
use crate::domain::models::ChangeStamp;
use crate::domain::models::ChatStore;
use crate::domain::models::ChatStoreBox;
use crate::domain::models::MessageRecord;
use crate::domain::models::SessionRecord;
use crate::domain::models::StoreName;
use crate::infrastructure::stores::memory::MemoryStore;

/// A store whose row mutations always fail, for exercising the
/// remote-first guarantees.
struct FailingStore {}

#[async_trait]
impl ChatStore for FailingStore {
    fn name(&self) -> StoreName {
        return StoreName::Memory;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_chat(&self, _title: &str) -> Result<SessionRecord> {
        bail!("create failed")
    }

    #[allow(clippy::implicit_return)]
    async fn get_chat(&self, _id: &str) -> Result<SessionRecord> {
        bail!("get failed")
    }

    #[allow(clippy::implicit_return)]
    async fn list_chats(&self) -> Result<Vec<SessionRecord>> {
        bail!("list failed")
    }

    #[allow(clippy::implicit_return)]
    async fn rename_chat(&self, _id: &str, _title: &str) -> Result<()> {
        bail!("rename failed")
    }

    #[allow(clippy::implicit_return)]
    async fn touch_chat(&self, _id: &str) -> Result<()> {
        bail!("touch failed")
    }

    #[allow(clippy::implicit_return)]
    async fn delete_chat(&self, _id: &str) -> Result<()> {
        bail!("delete chat failed")
    }

    #[allow(clippy::implicit_return)]
    async fn insert_message(
        &self,
        _chat_id: &str,
        _author: Author,
        _content: &str,
    ) -> Result<MessageRecord> {
        bail!("insert failed")
    }

    #[allow(clippy::implicit_return)]
    async fn list_messages(&self, _chat_id: &str) -> Result<Vec<MessageRecord>> {
        bail!("list messages failed")
    }

    #[allow(clippy::implicit_return)]
    async fn update_message(&self, _id: &str, _content: &str) -> Result<()> {
        bail!("update failed")
    }

    #[allow(clippy::implicit_return)]
    async fn delete_message(&self, _id: &str) -> Result<()> {
        bail!("delete failed")
    }

    #[allow(clippy::implicit_return)]
    async fn delete_messages(&self, _chat_id: &str) -> Result<()> {
        bail!("delete messages failed")
    }

    #[allow(clippy::implicit_return)]
    async fn latest_activity(&self) -> Result<Option<ChangeStamp>> {
        return Ok(None);
    }
}

async fn seeded_store() -> Result<(ChatStoreBox, String)> {
    let store: ChatStoreBox = Box::new(MemoryStore::isolated());
    let chat = store.create_chat("Interview prep").await?;
    store.insert_message(&chat.id, Author::User, "Ask me something").await?;
    store
        .insert_message(&chat.id, Author::Assistant, "Tell me about yourself.")
        .await?;
    store.insert_message(&chat.id, Author::User, "Sure, I'm a...").await?;

    return Ok((store, chat.id));
}

#[test]
fn it_installs_the_greeting_by_default() {
    let conversation = Conversation::default();

    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.messages()[0].author, Author::Assistant);
    assert_eq!(conversation.messages()[0].text, GREETING);
    assert!(conversation.messages()[0].remote_id.is_none());
    assert!(conversation.index().is_empty());
}

#[tokio::test]
async fn it_loads_messages_in_server_order() -> Result<()> {
    let (store, chat_id) = seeded_store().await?;
    let mut conversation = Conversation::default();

    conversation.load(&store, &chat_id).await?;

    assert_eq!(conversation.messages().len(), 3);
    assert_eq!(conversation.messages()[0].author, Author::User);
    assert_eq!(conversation.messages()[1].author, Author::Assistant);
    assert_eq!(conversation.messages()[2].author, Author::User);
    assert!(conversation.messages().iter().all(|e| return e.is_persisted()));
    assert_eq!(conversation.index().len(), 3);

    return Ok(());
}

#[tokio::test]
async fn it_reloads_idempotently() -> Result<()> {
    let (store, chat_id) = seeded_store().await?;
    let mut conversation = Conversation::default();

    conversation.load(&store, &chat_id).await?;
    let first = conversation
        .messages()
        .iter()
        .map(|e| return (e.remote_id.clone(), e.text.to_string()))
        .collect::<Vec<(Option<String>, String)>>();

    conversation.load(&store, &chat_id).await?;
    let second = conversation
        .messages()
        .iter()
        .map(|e| return (e.remote_id.clone(), e.text.to_string()))
        .collect::<Vec<(Option<String>, String)>>();

    assert_eq!(first, second);

    return Ok(());
}

#[tokio::test]
async fn it_installs_the_greeting_when_the_store_is_empty() -> Result<()> {
    let store: ChatStoreBox = Box::new(MemoryStore::isolated());
    let chat = store.create_chat("Empty").await?;
    let mut conversation = Conversation::default();

    conversation.load(&store, &chat.id).await?;

    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.messages()[0].text, GREETING);
    assert!(!conversation.messages()[0].is_persisted());

    return Ok(());
}

#[test]
fn it_reconciles_by_local_id() {
    let mut conversation = Conversation::default();
    let local_id = conversation.append_local(Author::User, "Hello");
    let position = conversation.position_of(local_id).unwrap();

    assert!(conversation.reconcile(local_id, "row-1"));
    assert_eq!(conversation.index().get(&position).unwrap(), "row-1");
    assert_eq!(
        conversation.messages()[position].remote_id,
        Some("row-1".to_string())
    );
}

#[test]
fn it_refuses_to_reconcile_removed_messages() {
    let mut conversation = Conversation::default();
    let local_id = conversation.append_local(Author::User, "Hello");
    let position = conversation.position_of(local_id).unwrap();
    conversation.truncate_after(position - 1);

    assert!(!conversation.reconcile(local_id, "row-1"));
    assert!(!conversation.index().values().any(|e| return e == "row-1"));
}

#[test]
fn it_keeps_one_index_entry_per_reconciled_message() {
    let mut conversation = Conversation::default();
    let first = conversation.append_local(Author::User, "one");
    let second = conversation.append_local(Author::Assistant, "two");
    conversation.append_local(Author::User, "three");

    assert!(conversation.reconcile(first, "row-1"));
    assert!(conversation.reconcile(second, "row-2"));

    assert_eq!(conversation.index().len(), 2);
    assert_eq!(
        conversation.index().get(&conversation.position_of(first).unwrap()),
        Some(&"row-1".to_string())
    );
    assert_eq!(
        conversation.index().get(&conversation.position_of(second).unwrap()),
        Some(&"row-2".to_string())
    );
}

#[tokio::test]
async fn it_edits_unpersisted_messages_locally_only() -> Result<()> {
    let store: ChatStoreBox = Box::new(FailingStore {});
    let mut conversation = Conversation::default();
    let local_id = conversation.append_local(Author::User, "typoed");
    let position = conversation.position_of(local_id).unwrap();

    // The store would fail every write, but nothing is persisted yet so it
    // is never asked.
    conversation.edit(&store, position, "fixed").await?;
    assert_eq!(conversation.messages()[position].text, "fixed");

    return Ok(());
}

#[tokio::test]
async fn it_edits_persisted_messages_remote_first() -> Result<()> {
    let (store, chat_id) = seeded_store().await?;
    let mut conversation = Conversation::default();
    conversation.load(&store, &chat_id).await?;

    conversation.edit(&store, 0, "Ask me anything").await?;

    assert_eq!(conversation.messages()[0].text, "Ask me anything");
    let rows = store.list_messages(&chat_id).await?;
    assert_eq!(rows[0].content, "Ask me anything");

    return Ok(());
}

#[tokio::test]
async fn it_keeps_local_text_when_a_remote_edit_fails() -> Result<()> {
    let store: ChatStoreBox = Box::new(FailingStore {});
    let mut conversation = Conversation::default();
    let local_id = conversation.append_local(Author::User, "original");
    let position = conversation.position_of(local_id).unwrap();
    conversation.reconcile(local_id, "row-1");

    let res = conversation.edit(&store, position, "changed").await;

    assert!(res.is_err());
    assert_eq!(conversation.messages()[position].text, "original");

    return Ok(());
}

#[tokio::test]
async fn it_deletes_remote_first_and_rebuilds_the_index() -> Result<()> {
    let (store, chat_id) = seeded_store().await?;
    let mut conversation = Conversation::default();
    conversation.load(&store, &chat_id).await?;

    conversation.delete(&store, 1).await?;

    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(store.list_messages(&chat_id).await?.len(), 2);
    assert_eq!(conversation.index().len(), 2);
    assert!(conversation.index().contains_key(&0));
    assert!(conversation.index().contains_key(&1));
    assert!(!conversation.index().contains_key(&2));

    return Ok(());
}

#[tokio::test]
async fn it_leaves_state_untouched_when_a_remote_delete_fails() -> Result<()> {
    let store: ChatStoreBox = Box::new(FailingStore {});
    let mut conversation = Conversation::default();
    let local_id = conversation.append_local(Author::User, "keep me");
    let position = conversation.position_of(local_id).unwrap();
    conversation.reconcile(local_id, "row-1");
    let before_len = conversation.messages().len();
    let before_index = conversation.index().clone();

    let res = conversation.delete(&store, position).await;

    assert!(res.is_err());
    assert_eq!(conversation.messages().len(), before_len);
    assert_eq!(conversation.index(), &before_index);

    return Ok(());
}

#[tokio::test]
async fn it_deletes_unpersisted_messages_locally_only() -> Result<()> {
    let store: ChatStoreBox = Box::new(FailingStore {});
    let mut conversation = Conversation::default();
    let local_id = conversation.append_local(Author::User, "optimistic");
    let position = conversation.position_of(local_id).unwrap();

    conversation.delete(&store, position).await?;

    assert!(conversation.position_of(local_id).is_none());

    return Ok(());
}

#[tokio::test]
async fn it_truncates_after_a_user_message() -> Result<()> {
    let (store, chat_id) = seeded_store().await?;
    let mut conversation = Conversation::default();
    conversation.load(&store, &chat_id).await?;
    conversation.append_local(Author::Assistant, "And what do you do?");

    conversation.truncate_after(0);

    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.messages()[0].author, Author::User);
    assert_eq!(conversation.index().len(), 1);

    return Ok(());
}
