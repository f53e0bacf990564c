#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::Author;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

/// One visible turn in the conversation log. `local_id` is assigned at
/// creation time and is the reconciliation key; `remote_id` is attached
/// once the row is confirmed by the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub local_id: Uuid,
    pub remote_id: Option<String>,
    pub author: Author,
    pub text: String,
    mtype: MessageType,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            local_id: Uuid::new_v4(),
            remote_id: None,
            author,
            text: text.to_string(),
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(author: Author, mtype: MessageType, text: &str) -> Message {
        return Message {
            local_id: Uuid::new_v4(),
            remote_id: None,
            author,
            text: text.to_string(),
            mtype,
        };
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn is_persisted(&self) -> bool {
        return self.remote_id.is_some();
    }
}
