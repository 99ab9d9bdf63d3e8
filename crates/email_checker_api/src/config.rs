//! Configuration management for the email checker
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! `Config.toml`, then `EMAIL_CHECKER_*` environment variables using `__` as
//! the section separator (e.g. `EMAIL_CHECKER_VALIDATION__API_KEY`).
//! Credentials have no defaults and must come from the file or environment.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use screening_core::{notifier::parse_mailbox, ClientConfig, SmtpConfig, DEFAULT_API_BASE_URL};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;

/// Optional configuration file in the working directory
pub const CONFIG_FILE: &str = "Config.toml";
/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "EMAIL_CHECKER_";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub validation: ValidationSettings,
    pub notifications: NotificationSettings,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Largest accepted bulk upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Reputation API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Base URL; the API key is appended as a path segment
    pub api_base_url: String,
    pub api_key: String,
    /// Request timeout; unset keeps the HTTP client default
    pub timeout_secs: Option<u64>,
    /// Lookups in flight during a bulk job (1 = strictly sequential)
    pub bulk_concurrency: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: None,
            bulk_concurrency: 1,
        }
    }
}

impl ValidationSettings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Operator alert settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub sender: String,
    pub recipient: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            sender: String::new(),
            recipient: String::new(),
        }
    }
}

impl NotificationSettings {
    pub fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory holding the rotating log files
    pub directory: String,
    pub file_prefix: String,
    /// One of `minutely`, `hourly`, `daily`, `never`
    pub rotation: String,
    /// Rotated files kept on disk
    pub max_files: usize,
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    /// Write the log file as JSON lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "email_checker".to_string(),
            rotation: "daily".to_string(),
            max_files: 10,
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration problems detected at startup
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

impl AppConfig {
    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSetting("validation.api_key"));
        }

        if self.validation.bulk_concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "validation.bulk_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.notifications.enabled {
            let required = [
                ("notifications.smtp_host", &self.notifications.smtp_host),
                ("notifications.smtp_username", &self.notifications.smtp_username),
                ("notifications.smtp_password", &self.notifications.smtp_password),
                ("notifications.sender", &self.notifications.sender),
                ("notifications.recipient", &self.notifications.recipient),
            ];
            if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
                return Err(ConfigError::MissingSetting(*name));
            }

            let addresses = [
                ("notifications.sender", &self.notifications.sender),
                ("notifications.recipient", &self.notifications.recipient),
            ];
            for (name, address) in addresses {
                parse_mailbox(address).map_err(|e| ConfigError::InvalidSetting {
                    name,
                    reason: e.to_string(),
                })?;
            }
        }

        Ok(())
    }
}

/// Defaults merged with the optional configuration file
fn base_figment(config_file: &Path) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if config_file.exists() {
        figment = figment.merge(Toml::file(config_file));
    }

    figment
}

/// Load application configuration from file and environment
pub fn load_config() -> Result<AppConfig, figment::Error> {
    base_figment(Path::new(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
}
