use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8787";
const DEFAULT_IDENTITY_FILE: &str = ".feed_identity.json";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) api_base_url: String,
    pub(crate) identity_file: PathBuf,
    pub(crate) log_level: String,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) request_timeout_secs: u64,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = non_blank(lookup("FEED_API_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let identity_file: PathBuf = non_blank(lookup("FEED_IDENTITY_FILE"))
            .unwrap_or_else(|| DEFAULT_IDENTITY_FILE.to_string())
            .into();
        let log_level = non_blank(lookup("LOG_LEVEL"))
            .or_else(|| non_blank(lookup("RUST_LOG")))
            .unwrap_or_else(|| "warn".to_string());
        let connect_timeout_secs =
            parse_secs("FEED_CONNECT_TIMEOUT_SECS", lookup("FEED_CONNECT_TIMEOUT_SECS"), 5)?;
        let request_timeout_secs =
            parse_secs("FEED_REQUEST_TIMEOUT_SECS", lookup("FEED_REQUEST_TIMEOUT_SECS"), 15)?;

        Ok(Self {
            api_base_url,
            identity_file,
            log_level,
            connect_timeout_secs,
            request_timeout_secs,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_secs(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let Some(raw) = non_blank(raw) else {
        return Ok(default);
    };

    let value = raw
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;
    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
