use super::AnalysisKind;
use super::Message;
use super::SessionRecord;

pub enum Event {
    AnalysisReady(AnalysisKind, String),
    ChatMessage(Message),
    Idle(),
    MessagesReloaded(Vec<Message>),
    SessionCleared(),
    SessionList(Vec<SessionRecord>),
    SessionOpened(SessionRecord),
}
