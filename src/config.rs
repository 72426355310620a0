use anyhow::{Result, bail};
use std::path::PathBuf;
use tracing::info;

use crate::insights::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const LOG_DIRECTIVE: &str = "nakshatra_path=info";
const DEFAULT_DATA_DIR: &str = ".nakshatra";

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables (after `.env`, if any)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY"));
        if gemini_api_key.is_none() {
            info!("GEMINI_API_KEY not set: birthday insights are disabled");
        }

        let gemini_base_url = non_empty("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !gemini_base_url.starts_with("http://") && !gemini_base_url.starts_with("https://") {
            bail!("GEMINI_BASE_URL must be an http(s) URL, got {gemini_base_url:?}");
        }

        Ok(Self {
            gemini_api_key,
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url,
            data_dir: non_empty("NAKSHATRA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.data_dir, PathBuf::from(".nakshatra"));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("NAKSHATRA_DATA_DIR", "/tmp/birthdays"),
        ])
        .unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/birthdays"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config(&[("GEMINI_API_KEY", "  "), ("API_KEY", "fallback")]).unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(config(&[("GEMINI_BASE_URL", "ftp://example.com")]).is_err());
    }
}
