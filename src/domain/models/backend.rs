use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;

use super::Author;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Gemini,
}

impl BackendName {
    pub fn parse(text: String) -> Result<BackendName> {
        if text == "gemini" {
            return Ok(BackendName::Gemini);
        }

        bail!(format!("{text} is not a valid backend."))
    }
}

/// One role-tagged turn in a model request payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTurn {
    pub author: Author,
    pub text: String,
}

impl PromptTurn {
    pub fn new(author: Author, text: &str) -> PromptTurn {
        return PromptTurn {
            author,
            text: text.to_string(),
        };
    }
}

pub struct BackendPrompt {
    pub system: String,
    pub turns: Vec<PromptTurn>,
}

impl BackendPrompt {
    pub fn new(system: &str, turns: Vec<PromptTurn>) -> BackendPrompt {
        return BackendPrompt {
            system: system.to_string(),
            turns,
        };
    }
}

#[derive(Debug)]
pub struct BackendResponse {
    pub author: Author,
    pub text: String,
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify all configurations are available to work
    /// with the backend. Missing configuration must surface here rather
    /// than as a crash at request time.
    async fn health_check(&self) -> Result<()>;

    /// Called when using the `/modellist` slash command to provide all
    /// available models for the backend.
    async fn list_models<'a>(&'a self) -> Result<Vec<String>>;

    /// Requests a single completion from the backend. The request carries
    /// the full ordered turn history; there is no backend-held state
    /// between calls.
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<BackendResponse>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
