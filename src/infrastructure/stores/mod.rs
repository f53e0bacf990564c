pub mod memory;
pub mod supabase;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::ChatStoreBox;
use crate::domain::models::StoreName;

pub struct StoreManager {}

impl StoreManager {
    pub fn get(name: StoreName) -> Result<ChatStoreBox> {
        if name == StoreName::Supabase {
            return Ok(Box::<supabase::Supabase>::default());
        }

        if name == StoreName::Memory {
            return Ok(Box::<memory::MemoryStore>::default());
        }

        bail!(format!("No store implemented for {name}"))
    }
}
