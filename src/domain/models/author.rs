use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    Spark,
    Assistant,
}

impl ToString for Author {
    fn to_string(&self) -> String {
        match self {
            Author::User => return Config::get(ConfigKey::Username),
            Author::Spark => return String::from("Career Spark"),
            Author::Assistant => return Config::get(ConfigKey::Model),
        }
    }
}

impl Author {
    /// Role string recorded in the messages table. Only `user` and
    /// `assistant` are ever persisted.
    pub fn store_role(&self) -> &'static str {
        match self {
            Author::User => return "user",
            _ => return "assistant",
        }
    }

    /// Role string expected by the model endpoint.
    pub fn model_role(&self) -> &'static str {
        match self {
            Author::User => return "user",
            _ => return "model",
        }
    }

    pub fn from_store_role(role: &str) -> Result<Author> {
        match role {
            "user" => return Ok(Author::User),
            "assistant" => return Ok(Author::Assistant),
            _ => bail!(format!("Unknown message role {role}")),
        }
    }
}
