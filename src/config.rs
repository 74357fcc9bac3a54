use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use teloxide::types::ChatId;

use crate::locale::Locale;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Unknown IANA timezone name.
    InvalidTimezone(String),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::InvalidTimezone(name) => write!(f, "unknown timezone '{}'", name),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::InvalidTimezone(_) | Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    #[serde(default = "default_ai_endpoint")]
    ai_endpoint: String,
    /// License token the AI proxy expects on every query.
    #[serde(default)]
    ai_license: String,
    #[serde(default = "default_image_endpoint")]
    image_endpoint: String,
    /// Directory for admins/users/responses JSON and logs. Defaults to ./data.
    data_dir: Option<String>,
    #[serde(default = "default_cache_ttl_ms")]
    cache_ttl_ms: u64,
    #[serde(default = "default_timezone")]
    timezone: String,
    log_chat_id: Option<i64>,
    /// Overrides for user-facing strings; missing keys keep the defaults.
    #[serde(default)]
    locale: Locale,
}

fn default_ai_endpoint() -> String {
    "https://api3.haji-api.ir/lic/gpt/4".to_string()
}

fn default_image_endpoint() -> String {
    "https://api-free.ir/api/img.php".to_string()
}

fn default_cache_ttl_ms() -> u64 {
    60_000
}

fn default_timezone() -> String {
    "Asia/Tehran".to_string()
}

pub struct Config {
    pub telegram_bot_token: String,
    pub ai_endpoint: String,
    pub ai_license: String,
    pub image_endpoint: String,
    /// Directory for state files (stores, logs).
    pub data_dir: PathBuf,
    /// How long a cached AI answer is served.
    pub cache_ttl: Duration,
    /// Timezone used for "today" in date replies.
    pub timezone: Tz,
    /// Chat that receives forwarded WARN/ERROR logs.
    pub log_chat_id: Option<ChatId>,
    pub locale: Locale,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.cache_ttl_ms == 0 {
            return Err(ConfigError::Validation("cache_ttl_ms must be greater than zero".into()));
        }
        for (name, value) in file.locale.triggers() {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("locale.{name} must not be empty")));
            }
        }

        let timezone: Tz = file
            .timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(file.timezone.clone()))?;

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            ai_endpoint: file.ai_endpoint,
            ai_license: file.ai_license,
            image_endpoint: file.image_endpoint,
            data_dir,
            cache_ttl: Duration::from_millis(file.cache_ttl_ms),
            timezone,
            log_chat_id: file.log_chat_id.map(ChatId),
            locale: file.locale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config_uses_defaults() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.ai_endpoint, "https://api3.haji-api.ir/lic/gpt/4");
        assert_eq!(config.image_endpoint, "https://api-free.ir/api/img.php");
        assert_eq!(config.cache_ttl, Duration::from_millis(60_000));
        assert_eq!(config.timezone, chrono_tz::Asia::Tehran);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.log_chat_id.is_none());
        assert_eq!(config.locale, Locale::default());
    }

    #[test]
    fn test_overrides() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "ai_license": "secret",
            "data_dir": "/var/lib/dastyar",
            "cache_ttl_ms": 5000,
            "timezone": "Europe/Berlin",
            "log_chat_id": -100123,
            "locale": { "date_trigger": "date" }
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.ai_license, "secret");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/dastyar"));
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.log_chat_id, Some(ChatId(-100123)));
        assert_eq!(config.locale.date_trigger, "date");
        assert_eq!(config.locale.ai_prefix, "+");
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{ "telegram_bot_token": "" }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let file = write_config(r#"{ "telegram_bot_token": "invalid_token_no_colon" }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let file = write_config(r#"{ "telegram_bot_token": "123456789:" }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "cache_ttl_ms": 0
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("cache_ttl_ms"));
    }

    #[test]
    fn test_empty_trigger_rejected() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "locale": { "ai_prefix": " " }
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("ai_prefix"));
    }

    #[test]
    fn test_empty_reply_commands_rejected() {
        for key in ["promote_command", "demote_command"] {
            let file = write_config(&format!(
                r#"{{ "telegram_bot_token": "123456789:ABCdef", "locale": {{ "{key}": "" }} }}"#
            ));
            let err = assert_err(Config::load(file.path()));
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(err.to_string().contains(key), "{err}");
        }
    }

    #[test]
    fn test_unknown_timezone() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "timezone": "Mars/Olympus"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::InvalidTimezone(_)));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
