#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::analysis;
use super::prompts;
use super::SessionManager;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::AnalysisKind;
use crate::domain::models::Author;
use crate::domain::models::BackendBox;
use crate::domain::models::ChatStoreBox;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageType;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Start a fresh session. The current one stays saved.
- /open (/o) [SESSION_ID] - Open a previous session.
- /sessions (/s) - List saved sessions.
- /delete [SESSION_ID?] - Delete a session. Defaults to the active one.
- /rename [TITLE] - Rename the active session.
- /edit (/e) [MESSAGE_NUMBER] [TEXT] - Rewrite a message in place.
- /delmsg [MESSAGE_NUMBER] - Delete a message.
- /regen (/r) [MESSAGE_NUMBER?] - Regenerate an assistant reply. Defaults to the last one.
- /template (/t) [NAME?] - Print a snippet template, or list them all.
- /ats [RESUME_TEXT] - Score resume text for ATS compatibility.
- /breakdown (/jd) [JOB_TEXT] - Break a job description into requirements and keywords.
- /draft [TEXT?] - Stash text to send later, or submit the stashed draft.
- /modellist (/ml) - List available models from the backend.
- /quit /exit (/q) - Exit Career Spark.
- /help (/h) - Provides this help menu.

Anything that isn't a command is sent to the model as your next message.
Message numbers are the ones shown next to each message in the log.
        "#;

    return text.trim().to_string();
}

/// Submission state for a single in-flight exchange. `Sending` forbids a
/// new submission; the UI blocks input for the duration.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Sending,
}

impl SubmissionState {
    pub fn begin(&mut self) -> Result<()> {
        if *self == SubmissionState::Sending {
            bail!("A submission is already in flight.");
        }
        *self = SubmissionState::Sending;

        return Ok(());
    }

    pub fn finish(&mut self) {
        *self = SubmissionState::Idle;
    }
}

fn worker_error(err: anyhow::Error, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    tx.send(Event::ChatMessage(Message::new_with_type(
        Author::Spark,
        MessageType::Error,
        &format!("That didn't work: {:?}", err),
    )))?;

    return Ok(());
}

async fn bootstrap(
    backend: &BackendBox,
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    if let Err(err) = manager.store().health_check().await {
        tx.send(Event::ChatMessage(Message::new_with_type(
            Author::Spark,
            MessageType::Error,
            &format!("The {} store isn't reachable, so sessions won't be saved until it is.\n\nError: {err}", manager.store().name()),
        )))?;
    }

    if let Err(err) = backend.health_check().await {
        tx.send(Event::ChatMessage(Message::new_with_type(
            Author::Spark,
            MessageType::Error,
            &format!("Hey, it looks like backend {} isn't ready, I can't connect to it. You should double check that before we start talking, otherwise every message will fail.\n\nError: {err}", backend.name()),
        )))?;
    } else if let Ok(models) = backend.list_models().await {
        let model_name = Config::get(ConfigKey::Model);
        if !models.contains(&model_name) {
            tx.send(Event::ChatMessage(Message::new_with_type(
                Author::Spark,
                MessageType::Error,
                &format!("Model {model_name} doesn't exist for backend {}. You can use /modellist to view all available models.", backend.name()),
            )))?;
        }
    }

    let session_id = Config::get(ConfigKey::SessionID);
    if !session_id.is_empty() {
        let record = manager.select_session(&session_id).await?;
        tx.send(Event::SessionOpened(record))?;
    }

    tx.send(Event::MessagesReloaded(
        manager.conversation().messages().to_vec(),
    ))?;

    return Ok(());
}

/// Best-effort persistence of an optimistic turn: a write failure is logged
/// and the visible state carries on unreconciled.
async fn persist_turn(manager: &mut SessionManager, local_id: Uuid, chat_id: &str) {
    let (author, text) = match manager.conversation().message(local_id) {
        Some(message) => (message.author, message.text.to_string()),
        None => return,
    };

    let res = manager.store().insert_message(chat_id, author, &text).await;
    match res {
        Ok(record) => {
            manager.conversation_mut().reconcile(local_id, &record.id);
        }
        Err(err) => {
            tracing::warn!(err = ?err, chat_id = chat_id, "failed to persist message");
        }
    }
}

fn reload_event(manager: &SessionManager, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    tx.send(Event::MessagesReloaded(
        manager.conversation().messages().to_vec(),
    ))?;

    return Ok(());
}

async fn edit_message(
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    position: usize,
    text: &str,
) -> Result<()> {
    manager.edit_message(position, text).await?;

    return reload_event(manager, tx);
}

async fn delete_message(
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    position: usize,
) -> Result<()> {
    manager.delete_message(position).await?;

    return reload_event(manager, tx);
}

async fn delete_session(
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    id: Option<String>,
) -> Result<()> {
    let target = match id {
        Some(id) => Some(id),
        None => manager.active().map(|e| return e.id.to_string()),
    };
    let target = match target {
        Some(target) => target,
        None => return notice(tx, "There is no active session to delete."),
    };

    manager.delete_session(&target).await?;
    notice(tx, &format!("Deleted session {target}."))?;

    if manager.active().is_none() {
        tx.send(Event::SessionCleared())?;
        reload_event(manager, tx)?;
    }

    return Ok(());
}

async fn rename_session(
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    id: Option<String>,
    title: &str,
) -> Result<()> {
    let target = match id {
        Some(id) => Some(id),
        None => manager.active().map(|e| return e.id.to_string()),
    };
    let target = match target {
        Some(target) => target,
        None => return notice(tx, "There is no active session to rename."),
    };

    manager.rename_session(&target, title).await?;

    return notice(tx, &format!("Renamed session to \"{title}\"."));
}

async fn select_session(
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    id: &str,
) -> Result<()> {
    let record = manager.select_session(id).await?;
    tx.send(Event::SessionOpened(record))?;

    return reload_event(manager, tx);
}

async fn list_sessions(
    manager: &SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let records = manager.list().await?;
    tx.send(Event::SessionList(records))?;

    return Ok(());
}

async fn sync_session(
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    chat_id: &str,
) -> Result<()> {
    let is_active = manager
        .active()
        .map(|e| return e.id == chat_id)
        .unwrap_or(false);
    if !is_active {
        return Ok(());
    }

    manager.reload().await?;

    return reload_event(manager, tx);
}

async fn touch_session(manager: &SessionManager, chat_id: &str) {
    if let Err(err) = manager.store().touch_chat(chat_id).await {
        tracing::warn!(err = ?err, chat_id = chat_id, "failed to advance session timestamp");
    }
}

async fn submit(
    backend: &BackendBox,
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    text: &str,
) -> Result<()> {
    let first_exchange = manager.active().is_none();
    let record = manager.ensure_session(text).await?;
    if first_exchange {
        tx.send(Event::SessionOpened(record.clone()))?;
    }

    let prompt = prompts::build_request(manager.conversation().messages(), text);
    let user_local_id = manager.conversation_mut().append_local(Author::User, text);
    persist_turn(manager, user_local_id, &record.id).await;

    match backend.get_completion(prompt).await {
        Ok(response) => {
            let assistant_local_id =
                prompts::integrate_response(manager.conversation_mut(), &response.text);
            if let Some(message) = manager.conversation().message(assistant_local_id) {
                tx.send(Event::ChatMessage(message.clone()))?;
            }
            persist_turn(manager, assistant_local_id, &record.id).await;
            touch_session(manager, &record.id).await;

            // First exchange re-derives the title from the first user
            // message, best-effort.
            if first_exchange {
                let title = prompts::derive_title(text);
                if let Err(err) = manager.rename_session(&record.id, &title).await {
                    tracing::warn!(err = ?err, "failed to derive session title");
                }
            }
        }
        Err(err) => {
            let message = Message::new_with_type(
                Author::Spark,
                MessageType::Error,
                &format!("The model request failed with the following error:\n\n{:?}", err),
            );
            manager.conversation_mut().add_message(message.clone());
            tx.send(Event::ChatMessage(message))?;
        }
    }

    return Ok(());
}

async fn regenerate(
    backend: &BackendBox,
    manager: &mut SessionManager,
    tx: &mpsc::UnboundedSender<Event>,
    position: Option<usize>,
) -> Result<()> {
    let messages = manager.conversation().messages();
    let from = match position {
        Some(from) => from,
        None => match messages.iter().rposition(|message| {
            return message.author == Author::Assistant
                && message.message_type() == MessageType::Normal
                && message.is_persisted();
        }) {
            Some(from) => from,
            None => bail!("There is no assistant reply to regenerate yet."),
        },
    };

    if from >= messages.len() {
        bail!(format!("No message at position {from}"));
    }
    if messages[from].author != Author::Assistant {
        bail!(format!("Message {from} is not an assistant reply."));
    }

    let user_position = match prompts::preceding_user_position(messages, from) {
        Some(user_position) => user_position,
        None => bail!("There is no user message to regenerate from."),
    };

    let user_text = messages[user_position].text.to_string();
    let superseded = messages[user_position + 1..]
        .iter()
        .filter_map(|message| return message.remote_id.clone())
        .collect::<Vec<String>>();

    // Remote rows first. A failure here aborts with the log untouched.
    for remote_id in superseded {
        manager.store().delete_message(&remote_id).await?;
    }

    manager.conversation_mut().truncate_after(user_position);
    tx.send(Event::MessagesReloaded(
        manager.conversation().messages().to_vec(),
    ))?;

    let history = &manager.conversation().messages()[..user_position];
    let prompt = prompts::build_request(history, &user_text);

    match backend.get_completion(prompt).await {
        Ok(response) => {
            let assistant_local_id =
                prompts::integrate_response(manager.conversation_mut(), &response.text);
            if let Some(message) = manager.conversation().message(assistant_local_id) {
                tx.send(Event::ChatMessage(message.clone()))?;
            }
            let record = manager.active().cloned();
            if let Some(record) = record {
                persist_turn(manager, assistant_local_id, &record.id).await;
                touch_session(manager, &record.id).await;
            }
        }
        Err(err) => {
            // The superseded reply stays gone. Surface the failure without
            // appending it to the log so the sequence ends at the user turn.
            tx.send(Event::ChatMessage(Message::new_with_type(
                Author::Spark,
                MessageType::Error,
                &format!("Regenerating failed, and the previous reply was already discarded.\n\nError: {:?}", err),
            )))?;
        }
    }

    return Ok(());
}

async fn analyze(
    backend: &BackendBox,
    tx: &mpsc::UnboundedSender<Event>,
    kind: AnalysisKind,
    input: &str,
) -> Result<()> {
    if input.trim().is_empty() {
        bail!("Paste the text to analyze after the command. Run /help for usage.");
    }

    let report = analysis::run_analysis(backend, kind, input).await?;
    tx.send(Event::AnalysisReady(kind, report))?;

    return Ok(());
}

async fn model_list(backend: &BackendBox, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    let mut models = backend.list_models().await?;
    models.sort();

    let res = models
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            let n = idx + 1;
            return format!("- ({n}) {model}");
        })
        .collect::<Vec<String>>();

    tx.send(Event::ChatMessage(Message::new(
        Author::Spark,
        res.join("\n").as_str(),
    )))?;

    return Ok(());
}

fn notice(tx: &mpsc::UnboundedSender<Event>, text: &str) -> Result<()> {
    tx.send(Event::ChatMessage(Message::new(Author::Spark, text)))?;

    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        backend: BackendBox,
        store: ChatStoreBox,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let mut manager = SessionManager::new(store);
        let mut submission = SubmissionState::Idle;

        loop {
            let action = rx.recv().await;
            if action.is_none() {
                return Ok(());
            }

            let res = match action.unwrap() {
                Action::Analyze(kind, input) => analyze(&backend, &tx, kind, &input).await,
                Action::Bootstrap() => bootstrap(&backend, &mut manager, &tx).await,
                Action::DeleteMessage(position) => {
                    delete_message(&mut manager, &tx, position).await
                }
                Action::DeleteSession(id) => delete_session(&mut manager, &tx, id).await,
                Action::EditMessage(position, text) => {
                    edit_message(&mut manager, &tx, position, &text).await
                }
                Action::ListModels() => model_list(&backend, &tx).await,
                Action::ListSessions() => list_sessions(&manager, &tx).await,
                Action::NewSession() => {
                    manager.new_session();
                    tx.send(Event::SessionCleared())?;
                    reload_event(&manager, &tx)
                }
                Action::Regenerate(position) => match submission.begin() {
                    Ok(()) => {
                        let res = regenerate(&backend, &mut manager, &tx, position).await;
                        submission.finish();
                        res
                    }
                    Err(err) => Err(err),
                },
                Action::RenameSession(id, title) => {
                    rename_session(&mut manager, &tx, id, &title).await
                }
                Action::SaveDraft(text) => {
                    manager.set_draft(&text);
                    notice(&tx, "Draft stashed. Send it with /draft.")
                }
                Action::SelectSession(id) => select_session(&mut manager, &tx, &id).await,
                Action::SubmitDraft() => match manager.take_draft() {
                    Some(text) => match submission.begin() {
                        Ok(()) => {
                            let res = submit(&backend, &mut manager, &tx, &text).await;
                            submission.finish();
                            res
                        }
                        Err(err) => Err(err),
                    },
                    None => notice(&tx, "There is no stashed draft. Stash one with /draft <text>."),
                },
                Action::SubmitPrompt(text) => match submission.begin() {
                    Ok(()) => {
                        let res = submit(&backend, &mut manager, &tx, &text).await;
                        submission.finish();
                        res
                    }
                    Err(err) => Err(err),
                },
                Action::SyncSession(chat_id) => sync_session(&mut manager, &tx, &chat_id).await,
            };

            if let Err(err) = res {
                worker_error(err, &tx)?;
            }

            tx.send(Event::Idle())?;
        }
    }
}
