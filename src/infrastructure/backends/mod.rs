pub mod gemini;
pub mod retry;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;

pub struct BackendManager {}

impl BackendManager {
    pub fn get(name: BackendName) -> Result<BackendBox> {
        if name == BackendName::Gemini {
            return Ok(Box::<gemini::Gemini>::default());
        }

        bail!(format!("No backend implemented for {name}"))
    }
}
