//! Application configuration management.
//!
//! Configuration is resolved once at startup into an immutable [`Config`] and
//! handed to each component's constructor. Sources are merged with `figment`,
//! lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `config.toml` in the platform config directory)
//! 3. Environment variables (`WEBSITE_URL`, `SMTP_PORT`, ...)
//! 4. CLI overrides on the `check` subcommand

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::CheckArgs;
use crate::monitor::{HistoryPolicy, MonitorSettings, SmtpSettings};

/// Environment variables read into the configuration.
///
/// Each name lowercased is the field it sets.
pub const ENV_KEYS: [&str; 7] = [
    "WEBSITE_URL",
    "HISTORY_FILE",
    "SMTP_SERVER",
    "SMTP_PORT",
    "SMTP_USER",
    "SMTP_PASSWORD",
    "RECEIVER_EMAIL",
];

/// Environment variables parsed as typed values rather than taken verbatim.
const TYPED_ENV_KEYS: [&str; 1] = ["SMTP_PORT"];

/// Default location of the history file, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = "website_history.json";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A source could not be parsed or a value had the wrong type.
    #[error("invalid configuration: {0}")]
    Extract(#[source] Box<figment::Error>),

    /// A value parsed but is unusable.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Resolved application configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page to monitor.
    pub website_url: String,
    /// JSON file holding the last fingerprint.
    pub history_file: PathBuf,
    /// SMTP relay host.
    pub smtp_server: String,
    /// SMTP relay port (STARTTLS).
    pub smtp_port: u16,
    /// SMTP login, also used as the sender address.
    pub smtp_user: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Recipient of change notifications.
    pub receiver_email: String,
    /// Treat a malformed history file as an error instead of a fresh start.
    pub strict_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            website_url: "https://example.com".to_string(),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_user: "your_email@example.com".to_string(),
            smtp_password: "your_password".to_string(),
            receiver_email: "notify@example.com".to_string(),
            strict_history: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("website_url", &self.website_url)
            .field("history_file", &self.history_file)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &"<redacted>")
            .field("receiver_email", &self.receiver_email)
            .field("strict_history", &self.strict_history)
            .finish()
    }
}

impl Config {
    /// Load configuration from defaults, the config file, and the environment.
    ///
    /// An explicit `path` must exist; the platform default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(path)?)
    }

    /// Build the layered figment without extracting it.
    pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default_path) = Self::default_config_path().filter(|p| p.exists()) {
                    log::debug!("Using config file {}", default_path.display());
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        Ok(figment
            .merge(Serialized::defaults(Self::env_strings()))
            .merge(Env::raw().only(&TYPED_ENV_KEYS)))
    }

    /// Text settings from the environment, kept as strings so values like
    /// `123456` or `[abc]` are not read as numbers or arrays.
    fn env_strings() -> BTreeMap<String, String> {
        ENV_KEYS
            .iter()
            .filter(|key| !TYPED_ENV_KEYS.contains(*key))
            .filter_map(|key| {
                env::var(key)
                    .ok()
                    .map(|value| (key.to_ascii_lowercase(), value))
            })
            .collect()
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `check` subcommand overrides.
    pub fn with_overrides(mut self, args: &CheckArgs) -> Result<Self, ConfigError> {
        if let Some(url) = &args.url {
            self.website_url = url.clone();
        }
        if let Some(history_file) = &args.history_file {
            self.history_file = history_file.clone();
        }
        if args.strict_history {
            self.strict_history = true;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_empty = [
            ("website_url", &self.website_url),
            ("smtp_server", &self.smtp_server),
            ("receiver_email", &self.receiver_email),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty",
                });
            }
        }
        if self.history_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "history_file",
                reason: "must not be empty",
            });
        }
        if self.smtp_port == 0 {
            return Err(ConfigError::Invalid {
                field: "smtp_port",
                reason: "must be between 1 and 65535",
            });
        }
        Ok(())
    }

    /// Settings for the check orchestrator.
    #[must_use]
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            url: self.website_url.clone(),
            history_policy: if self.strict_history {
                HistoryPolicy::Strict
            } else {
                HistoryPolicy::Lenient
            },
        }
    }

    /// Settings for the SMTP notifier.
    #[must_use]
    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            server: self.smtp_server.clone(),
            port: self.smtp_port,
            user: self.smtp_user.clone(),
            password: self.smtp_password.clone(),
            receiver: self.receiver_email.clone(),
        }
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "pagewatch", "pagewatch")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
