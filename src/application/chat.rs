use std::io::Write;

use anyhow::Result;
use tokio::io::stdin;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::domain::models::Action;
use crate::domain::models::AnalysisKind;
use crate::domain::models::Author;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::SessionRecord;
use crate::domain::models::SlashCommand;
use crate::domain::services::actions::help_text;
use crate::domain::services::Templates;

enum Flow {
    Continue,
    Quit,
}

fn print_prompt() {
    print!("{} ", Paint::new("›").bold());
    let _ = std::io::stdout().flush();
}

fn render_message(message: &Message, position: Option<usize>) {
    let author = message.author.to_string();
    let label = match position {
        Some(position) => format!("({position}) {author}"),
        None => author,
    };

    if message.message_type() == MessageType::Error {
        println!("{}: {}", Paint::red(label).bold(), Paint::red(&message.text));
        return;
    }

    let painted = match message.author {
        Author::User => Paint::cyan(label).bold(),
        Author::Assistant => Paint::green(label).bold(),
        Author::Spark => Paint::yellow(label).bold(),
    };
    println!("{painted}: {}", message.text);
}

fn format_session(session: &SessionRecord) -> String {
    return format!(
        "- (ID: {}) {}, {}",
        session.id,
        session.updated_at.format("%Y-%m-%dT%H:%M:%S"),
        session.title,
    );
}

fn render_event(event: &Event) {
    match event {
        Event::AnalysisReady(kind, report) => {
            println!("{}", Paint::new(format!("[{kind}]")).bold());
            println!("{report}");
        }
        Event::ChatMessage(message) => {
            render_message(message, None);
        }
        Event::Idle() => {}
        Event::MessagesReloaded(messages) => {
            println!("{}", Paint::new("---").dimmed());
            for (position, message) in messages.iter().enumerate() {
                render_message(message, Some(position));
            }
        }
        Event::SessionCleared() => {
            println!("Started a fresh session.");
        }
        Event::SessionList(sessions) => {
            if sessions.is_empty() {
                println!("There are no sessions available. You should start your first one!");
                return;
            }
            for session in sessions {
                println!("{}", format_session(session));
            }
        }
        Event::SessionOpened(session) => {
            println!("Opened session \"{}\" (ID: {})", session.title, session.id);
        }
    }
}

/// Renders events until the worker reports the action finished. This is
/// what keeps a second submission impossible while one is in flight.
async fn wait_until_idle(rx: &mut mpsc::UnboundedReceiver<Event>) {
    while let Some(event) = rx.recv().await {
        if let Event::Idle() = event {
            return;
        }
        render_event(&event);
    }
}

async fn dispatch(
    tx: &mpsc::UnboundedSender<Action>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
    action: Action,
) -> Result<()> {
    tx.send(action)?;
    wait_until_idle(rx).await;

    return Ok(());
}

fn parse_position(text: &str) -> Option<usize> {
    return text.parse::<usize>().ok();
}

async fn handle_input(
    text: &str,
    tx: &mpsc::UnboundedSender<Action>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<Flow> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Flow::Continue);
    }

    let command = match SlashCommand::parse(trimmed) {
        Some(command) => command,
        None => {
            if trimmed.starts_with('/') {
                println!("Unknown command. Use /help to list what's available.");
                return Ok(Flow::Continue);
            }
            dispatch(tx, rx, Action::SubmitPrompt(trimmed.to_string())).await?;
            return Ok(Flow::Continue);
        }
    };

    if command.is_quit() {
        return Ok(Flow::Quit);
    }

    if command.is_help() {
        println!("{}", help_text());
        return Ok(Flow::Continue);
    }

    if command.is_template() {
        if command.args.is_empty() {
            for name in Templates::list() {
                println!("- {name}");
            }
            return Ok(Flow::Continue);
        }
        match Templates::get(&command.args[0]) {
            Ok(template) => println!("{template}"),
            Err(err) => println!("{err}"),
        }
        return Ok(Flow::Continue);
    }

    if command.is_new_session() {
        dispatch(tx, rx, Action::NewSession()).await?;
        return Ok(Flow::Continue);
    }

    if command.is_open_session() {
        if command.args.is_empty() {
            println!("Pass a session ID, e.g. /open ID. Use /sessions to list them.");
            return Ok(Flow::Continue);
        }
        dispatch(tx, rx, Action::SelectSession(command.args[0].to_string())).await?;
        return Ok(Flow::Continue);
    }

    if command.is_list_sessions() {
        dispatch(tx, rx, Action::ListSessions()).await?;
        return Ok(Flow::Continue);
    }

    if command.is_delete_session() {
        dispatch(tx, rx, Action::DeleteSession(command.args.first().cloned())).await?;
        return Ok(Flow::Continue);
    }

    if command.is_rename_session() {
        let title = command.rest_from(0);
        if title.is_empty() {
            println!("Pass the new title, e.g. /rename Interview prep.");
            return Ok(Flow::Continue);
        }
        dispatch(tx, rx, Action::RenameSession(None, title)).await?;
        return Ok(Flow::Continue);
    }

    if command.is_edit_message() {
        let position = command.args.first().and_then(|e| return parse_position(e));
        let new_text = command.rest_from(1);
        if position.is_none() || new_text.is_empty() {
            println!("Usage: /edit MESSAGE_NUMBER NEW_TEXT");
            return Ok(Flow::Continue);
        }
        dispatch(tx, rx, Action::EditMessage(position.unwrap(), new_text)).await?;
        return Ok(Flow::Continue);
    }

    if command.is_delete_message() {
        let position = command.args.first().and_then(|e| return parse_position(e));
        if position.is_none() {
            println!("Usage: /delmsg MESSAGE_NUMBER");
            return Ok(Flow::Continue);
        }
        dispatch(tx, rx, Action::DeleteMessage(position.unwrap())).await?;
        return Ok(Flow::Continue);
    }

    if command.is_regenerate() {
        let position = command.args.first().and_then(|e| return parse_position(e));
        dispatch(tx, rx, Action::Regenerate(position)).await?;
        return Ok(Flow::Continue);
    }

    if command.is_analyze_ats() {
        dispatch(
            tx,
            rx,
            Action::Analyze(AnalysisKind::AtsScore, command.rest_from(0)),
        )
        .await?;
        return Ok(Flow::Continue);
    }

    if command.is_analyze_breakdown() {
        dispatch(
            tx,
            rx,
            Action::Analyze(AnalysisKind::JobBreakdown, command.rest_from(0)),
        )
        .await?;
        return Ok(Flow::Continue);
    }

    if command.is_draft() {
        if command.args.is_empty() {
            dispatch(tx, rx, Action::SubmitDraft()).await?;
        } else {
            dispatch(tx, rx, Action::SaveDraft(command.rest_from(0))).await?;
        }
        return Ok(Flow::Continue);
    }

    if command.is_model_list() {
        dispatch(tx, rx, Action::ListModels()).await?;
        return Ok(Flow::Continue);
    }

    return Ok(Flow::Continue);
}

enum PromptInput {
    Line(Option<String>),
    Notification(Option<Event>),
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    dispatch(&tx, rx, Action::Bootstrap()).await?;

    let mut lines = BufReader::new(stdin()).lines();

    loop {
        print_prompt();

        let input = tokio::select! {
            line = lines.next_line() => PromptInput::Line(line?),
            event = rx.recv() => PromptInput::Notification(event),
        };

        match input {
            PromptInput::Line(Some(line)) => {
                if let Flow::Quit = handle_input(&line, &tx, rx).await? {
                    return Ok(());
                }
            }
            // Store change notifications land here while the prompt is
            // open; anything else is worker chatter from a past action.
            PromptInput::Notification(Some(event)) => {
                println!();
                render_event(&event);
            }
            PromptInput::Line(None) | PromptInput::Notification(None) => return Ok(()),
        }
    }
}
