use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::notion::DEFAULT_API_URL;

/// Application configuration loaded from environment variables.
/// Every variable is optional; a missing remote credential only disables
/// remote writes.
#[derive(Debug, Clone)]
pub struct Config {
    pub notion_api_key: Option<String>,
    pub notion_api_url: String,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub publish_child_pages: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            notion_api_key: var("NOTION_API_KEY"),
            notion_api_url: var("NOTION_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "./data".to_string()).into(),
            output_dir: var("OUTPUT_DIR")
                .unwrap_or_else(|| "./output".to_string())
                .into(),
            publish_child_pages: match var("PUBLISH_CHILD_PAGES") {
                Some(raw) => parse_flag(&raw).context("PUBLISH_CHILD_PAGES must be a boolean")?,
                None => true,
            },
            port: var("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognized flag value '{other}'"),
    }
}
