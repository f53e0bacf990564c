use anyhow::Result;
use test_utils::long_prompt_fixture;

use super::SessionManager;
use crate::domain::models::Author;
use crate::domain::models::ChatStore;
use crate::domain::models::ChatStoreBox;
use crate::domain::services::GREETING;
use crate::infrastructure::stores::memory::MemoryStore;

fn manager_with_memory() -> (SessionManager, MemoryStore) {
    let store = MemoryStore::isolated();
    let boxed: ChatStoreBox = Box::new(store.clone());

    return (SessionManager::new(boxed), store);
}

#[test]
fn it_starts_without_a_session() {
    let (manager, _store) = manager_with_memory();

    assert!(manager.active().is_none());
    assert_eq!(manager.conversation().messages()[0].text, GREETING);
}

#[tokio::test]
async fn it_creates_a_session_on_ensure() -> Result<()> {
    let (mut manager, store) = manager_with_memory();

    let record = manager.ensure_session("Write a cover letter").await?;

    assert_eq!(record.title, "Write a cover letter");
    assert_eq!(manager.active().unwrap().id, record.id);
    assert_eq!(store.get_chat(&record.id).await?.title, "Write a cover letter");

    return Ok(());
}

#[tokio::test]
async fn it_truncates_long_titles_on_ensure() -> Result<()> {
    let (mut manager, _store) = manager_with_memory();

    let record = manager.ensure_session(&long_prompt_fixture()).await?;

    assert_eq!(record.title.chars().count(), 51);
    assert_eq!(record.title, format!("{}…", "a".repeat(50)));

    return Ok(());
}

#[tokio::test]
async fn it_is_idempotent_once_active() -> Result<()> {
    let (mut manager, store) = manager_with_memory();

    let first = manager.ensure_session("First message").await?;
    let second = manager.ensure_session("Another message").await?;

    assert_eq!(first.id, second.id);
    assert_eq!(store.list_chats().await?.len(), 1);

    return Ok(());
}

#[tokio::test]
async fn it_resets_state_on_new_session() -> Result<()> {
    let (mut manager, _store) = manager_with_memory();
    manager.ensure_session("First message").await?;
    manager.conversation_mut().append_local(Author::User, "First message");
    manager.set_draft("unsent thought");

    manager.new_session();

    assert!(manager.active().is_none());
    assert!(manager.draft().is_none());
    assert_eq!(manager.conversation().messages().len(), 1);
    assert_eq!(manager.conversation().messages()[0].text, GREETING);
    assert!(manager.conversation().index().is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_selects_a_session_and_loads_its_log() -> Result<()> {
    let (mut manager, store) = manager_with_memory();
    let chat = store.create_chat("Older chat").await?;
    store.insert_message(&chat.id, Author::User, "hello").await?;
    store.insert_message(&chat.id, Author::Assistant, "hi!").await?;
    manager.set_draft("unsent thought");

    let record = manager.select_session(&chat.id).await?;

    assert_eq!(record.id, chat.id);
    assert_eq!(manager.active().unwrap().id, chat.id);
    assert!(manager.draft().is_none());
    assert_eq!(manager.conversation().messages().len(), 2);

    return Ok(());
}

#[tokio::test]
async fn it_fails_selecting_a_missing_session() {
    let (mut manager, _store) = manager_with_memory();
    let res = manager.select_session("nope").await;
    assert!(res.is_err());
    assert!(manager.active().is_none());
}

#[tokio::test]
async fn it_resets_when_the_active_session_is_deleted() -> Result<()> {
    let (mut manager, store) = manager_with_memory();
    let record = manager.ensure_session("Doomed").await?;
    manager.conversation_mut().append_local(Author::User, "Doomed");

    manager.delete_session(&record.id).await?;

    assert!(manager.active().is_none());
    assert_eq!(manager.conversation().messages()[0].text, GREETING);
    assert!(store.get_chat(&record.id).await.is_err());

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_active_session_when_deleting_another() -> Result<()> {
    let (mut manager, store) = manager_with_memory();
    let other = store.create_chat("Other").await?;
    let record = manager.ensure_session("Mine").await?;

    manager.delete_session(&other.id).await?;

    assert_eq!(manager.active().unwrap().id, record.id);

    return Ok(());
}

#[tokio::test]
async fn it_renames_and_syncs_the_active_record() -> Result<()> {
    let (mut manager, store) = manager_with_memory();
    let record = manager.ensure_session("Old title").await?;
    let created_at = record.created_at;

    manager.rename_session(&record.id, "New title").await?;

    assert_eq!(manager.active().unwrap().title, "New title");
    let stored = store.get_chat(&record.id).await?;
    assert_eq!(stored.title, "New title");
    assert!(stored.updated_at >= created_at);

    return Ok(());
}

#[tokio::test]
async fn it_lists_sessions_most_recently_updated_first() -> Result<()> {
    let (manager, store) = manager_with_memory();
    let first = store.create_chat("First").await?;
    let second = store.create_chat("Second").await?;
    store.touch_chat(&first.id).await?;

    let sessions = manager.list().await?;

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, first.id);
    assert_eq!(sessions[1].id, second.id);

    return Ok(());
}

#[test]
fn it_takes_the_draft_once() {
    let (mut manager, _store) = manager_with_memory();
    manager.set_draft("unsent thought");

    assert_eq!(manager.take_draft(), Some("unsent thought".to_string()));
    assert_eq!(manager.take_draft(), None);
}
