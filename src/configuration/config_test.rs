use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());
}

#[test]
fn it_returns_defaults() {
    assert_eq!(Config::default(ConfigKey::Backend), "gemini");
    assert_eq!(Config::default(ConfigKey::Store), "supabase");
    assert_eq!(Config::default(ConfigKey::RequestMaxAttempts), "3");
    assert_eq!(
        Config::default(ConfigKey::GeminiURL),
        "https://generativelanguage.googleapis.com"
    );
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec!["chat", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["chat", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
