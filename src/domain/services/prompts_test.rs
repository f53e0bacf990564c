use test_utils::long_prompt_fixture;

use super::build_request;
use super::derive_title;
use super::integrate_response;
use super::preceding_user_position;
use super::Conversation;
use super::EMPTY_RESPONSE_FALLBACK;
use super::SYSTEM_PROMPT;
use crate::domain::models::Author;
use crate::domain::models::Message;
use crate::domain::models::MessageType;

#[test]
fn it_keeps_short_titles_unchanged() {
    assert_eq!(derive_title("Write a cover letter"), "Write a cover letter");
    assert_eq!(derive_title(&"a".repeat(50)), "a".repeat(50));
}

#[test]
fn it_truncates_titles_at_fifty_characters() {
    let res = derive_title(&"a".repeat(51));
    assert_eq!(res, format!("{}…", "a".repeat(50)));

    let res = derive_title(&long_prompt_fixture());
    assert_eq!(res, format!("{}…", "a".repeat(50)));
    assert_eq!(res.chars().count(), 51);
}

#[test]
fn it_counts_title_characters_not_bytes() {
    let text = "é".repeat(60);
    let res = derive_title(&text);
    assert_eq!(res, format!("{}…", "é".repeat(50)));
}

#[test]
fn it_builds_requests_from_the_visible_log() {
    let messages = vec![
        Message::new(Author::Assistant, "What are you working on today?"),
        Message::new(Author::User, "A cover letter"),
        Message::new(Author::Assistant, "Here's a draft"),
    ];

    let prompt = build_request(&messages, "Make it shorter");

    assert_eq!(prompt.system, SYSTEM_PROMPT);
    assert_eq!(prompt.turns.len(), 4);
    assert_eq!(prompt.turns[0].author, Author::Assistant);
    assert_eq!(prompt.turns[1].author, Author::User);
    assert_eq!(prompt.turns[3].author, Author::User);
    assert_eq!(prompt.turns[3].text, "Make it shorter");
}

#[test]
fn it_skips_error_notices_in_requests() {
    let messages = vec![
        Message::new(Author::User, "A cover letter"),
        Message::new_with_type(Author::Spark, MessageType::Error, "The model request failed"),
    ];

    let prompt = build_request(&messages, "Try again");

    assert_eq!(prompt.turns.len(), 2);
    assert_eq!(prompt.turns[0].text, "A cover letter");
    assert_eq!(prompt.turns[1].text, "Try again");
}

#[test]
fn it_integrates_responses() {
    let mut conversation = Conversation::default();

    let local_id = integrate_response(&mut conversation, "Here you go.");

    let message = conversation.message(local_id).unwrap();
    assert_eq!(message.author, Author::Assistant);
    assert_eq!(message.text, "Here you go.");
    assert!(!message.is_persisted());
}

#[test]
fn it_falls_back_when_the_response_is_empty() {
    let mut conversation = Conversation::default();

    let local_id = integrate_response(&mut conversation, "   \n");

    assert_eq!(
        conversation.message(local_id).unwrap().text,
        EMPTY_RESPONSE_FALLBACK
    );
}

#[test]
fn it_finds_the_preceding_user_message() {
    let messages = vec![
        Message::new(Author::Assistant, "greeting"),
        Message::new(Author::User, "ask"),
        Message::new(Author::Assistant, "answer"),
    ];

    assert_eq!(preceding_user_position(&messages, 2), Some(1));
    assert_eq!(preceding_user_position(&messages, 1), None);
    assert_eq!(preceding_user_position(&messages, 0), None);
}
