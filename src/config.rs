use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::TranscriptSource;
use crate::captions::Dedup;

pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub default_format: Option<String>,
    pub method: Option<TranscriptSource>,
    pub timeout_secs: Option<u64>,
    pub dedup: Option<Dedup>,
}

impl Config {
    /// Load config from ~/.config/ytxt/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn lang(&self) -> &str {
        self.default_lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytxt")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
default_lang = "es"
default_format = "json"
method = "innertube"
timeout_secs = 15
dedup = "adjacent"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_lang.as_deref(), Some("es"));
        assert_eq!(config.default_format.as_deref(), Some("json"));
        assert_eq!(config.method, Some(TranscriptSource::InnerTube));
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.dedup, Some(Dedup::Adjacent));
    }

    #[test]
    fn test_parse_empty_config() {
        let toml_str = "";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.default_lang.is_none());
        assert!(config.default_format.is_none());
        assert_eq!(config.lang(), "en");
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"default_lang = "fr""#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.lang(), "fr");
        assert!(config.method.is_none());
        assert!(config.dedup.is_none());
    }

    #[test]
    fn test_parse_yt_dlp_method() {
        let config: Config = toml::from_str(r#"method = "yt-dlp""#).unwrap();
        assert_eq!(config.method, Some(TranscriptSource::YtDlp));
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(toml::from_str::<Config>(r#"method = "whisper""#).is_err());
    }
}
