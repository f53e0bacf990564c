#[cfg(test)]
#[path = "templates_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

pub struct Templates {}

impl Templates {
    pub fn list() -> Vec<String> {
        let mut names = TemplateAssets::iter()
            .filter_map(|file| {
                let name = file.to_string();
                return name.strip_suffix(".md").map(|e| return e.to_string());
            })
            .collect::<Vec<String>>();
        names.sort();

        return names;
    }

    pub fn get(name: &str) -> Result<String> {
        let asset = match TemplateAssets::get(&format!("{name}.md")) {
            Some(asset) => asset,
            None => bail!(format!(
                "No template named {name}. Use /template to list what's available."
            )),
        };

        return Ok(String::from_utf8(asset.data.to_vec())?);
    }
}
