#[cfg(test)]
#[path = "prompts_test.rs"]
mod tests;

use crate::domain::models::Author;
use crate::domain::models::BackendPrompt;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::PromptTurn;

use super::Conversation;

pub const SYSTEM_PROMPT: &str = "You are Career Spark, a practical career coach for job seekers. You help draft cover letters, critique resume text, and rehearse interview answers. Be concrete and encouraging. Tailor advice to the role and company when the user shares them, ask one clarifying question when the request is too vague to act on, and keep answers skimmable.";

pub const EMPTY_RESPONSE_FALLBACK: &str = "I couldn't come up with a response for that. Could you try rephrasing?";

const TITLE_MAX_CHARS: usize = 50;

/// Session title from the first user message: first 50 characters, with an
/// ellipsis appended when truncated. Counted in characters, not bytes.
pub fn derive_title(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return trimmed.to_string();
    }

    let head = trimmed.chars().take(TITLE_MAX_CHARS).collect::<String>();
    return format!("{head}…");
}

/// Maps the visible log to role-tagged turns and appends the new user turn.
/// Synthetic error notices are UI artifacts, never persisted, and are left
/// out of the payload.
pub fn build_request(messages: &[Message], new_user_text: &str) -> BackendPrompt {
    let mut turns = messages
        .iter()
        .filter(|message| {
            return message.message_type() == MessageType::Normal
                && message.author != Author::Spark;
        })
        .map(|message| return PromptTurn::new(message.author, &message.text))
        .collect::<Vec<PromptTurn>>();

    turns.push(PromptTurn::new(Author::User, new_user_text));

    return BackendPrompt::new(SYSTEM_PROMPT, turns);
}

/// Appends the assistant reply, substituting a fixed fallback when the
/// response carries no usable text. Returns the local id for reconciliation.
pub fn integrate_response(conversation: &mut Conversation, response_text: &str) -> uuid::Uuid {
    let cleaned = response_text.trim();
    let text = if cleaned.is_empty() {
        EMPTY_RESPONSE_FALLBACK
    } else {
        cleaned
    };

    return conversation.append_local(Author::Assistant, text);
}

/// The nearest user message strictly before `from`, used by regenerate to
/// find the turn to resubmit.
pub fn preceding_user_position(messages: &[Message], from: usize) -> Option<usize> {
    return messages[..from.min(messages.len())]
        .iter()
        .rposition(|message| return message.author == Author::User);
}
