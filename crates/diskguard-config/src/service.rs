use config::{Config, Environment, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::env_file::{self, EnvFileError};

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_FREE_DISK_SPACE: &str = "2";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_CODE_VERSION: &str = "v1";

/// Setting names as they appear in the `.env` file. Lookup ignores case.
pub mod keys {
    pub const FREE_DISK_SPACE: &str = "FreeDiskSpace";
    pub const HOST: &str = "THOST";
    pub const ADMIN_EMAIL: &str = "ADMIN_EMAIL";
    pub const SMTP_FROM: &str = "SMTP_FROM";
    pub const SMTP_USER: &str = "SMTP_USER";
    pub const SMTP_PASS: &str = "SMTP_PASS";
    pub const SMTP_HOST: &str = "SMTP_HOST";
    pub const SMTP_PORT: &str = "SMTP_PORT";
    pub const ROLLBAR_CREDENTIALS: &str = "ROLLBAR_CREDENTIALS";
    pub const ROLLBAR_ENV_TYPE: &str = "ROLLBAR_ENV_TYPE";
    pub const ROLLBAR_CODE_VERSION: &str = "ROLLBAR_CODE_VERSION";
}

#[derive(Error, Debug)]
pub enum ConfigServiceError {
    #[error("Settings file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: EnvFileError,
    },

    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid free disk space threshold {value:?}: {reason}")]
    InvalidThreshold { value: String, reason: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidSetting { key: &'static str, value: String },
}

/// SMTP submission settings
#[derive(Clone, Default)]
pub struct SmtpSettings {
    pub from: String,
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: String,
}

impl SmtpSettings {
    pub fn port(&self) -> Result<u16, ConfigServiceError> {
        self.port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigServiceError::InvalidSetting {
                key: keys::SMTP_PORT,
                value: self.port.clone(),
            })
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("from", &self.from)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Telemetry sink settings
#[derive(Clone, Default)]
pub struct RollbarSettings {
    pub access_token: String,
    pub environment: String,
    pub code_version: String,
}

impl RollbarSettings {
    pub fn environment(&self) -> &str {
        non_empty(&self.environment).unwrap_or(DEFAULT_ENVIRONMENT)
    }

    pub fn code_version(&self) -> &str {
        non_empty(&self.code_version).unwrap_or(DEFAULT_CODE_VERSION)
    }
}

impl fmt::Debug for RollbarSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollbarSettings")
            .field("access_token", &"<redacted>")
            .field("environment", &self.environment)
            .field("code_version", &self.code_version)
            .finish()
    }
}

/// Settings for one check run. Unset keys are empty strings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub free_disk_space: String,
    pub host: String,
    pub admin_email: String,
    pub smtp: SmtpSettings,
    pub rollbar: RollbarSettings,
}

impl Settings {
    /// Build settings from raw key/value pairs
    pub fn from_map(raw: HashMap<String, String>) -> Self {
        let values: HashMap<String, String> = raw
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        let get = |key: &str| {
            values
                .get(&key.to_lowercase())
                .cloned()
                .unwrap_or_default()
        };

        Self {
            free_disk_space: get(keys::FREE_DISK_SPACE),
            host: get(keys::HOST),
            admin_email: get(keys::ADMIN_EMAIL),
            smtp: SmtpSettings {
                from: get(keys::SMTP_FROM),
                username: get(keys::SMTP_USER),
                password: get(keys::SMTP_PASS),
                host: get(keys::SMTP_HOST),
                port: get(keys::SMTP_PORT),
            },
            rollbar: RollbarSettings {
                access_token: get(keys::ROLLBAR_CREDENTIALS),
                environment: get(keys::ROLLBAR_ENV_TYPE),
                code_version: get(keys::ROLLBAR_CODE_VERSION),
            },
        }
    }

    /// Free space threshold in GB. Empty means the default of 2.
    ///
    /// Parsed at single precision; values outside the `f32` range are rejected.
    pub fn required_free_disk_space(&self) -> Result<f64, ConfigServiceError> {
        let raw = if self.free_disk_space.is_empty() {
            DEFAULT_FREE_DISK_SPACE
        } else {
            self.free_disk_space.as_str()
        };

        let invalid = |reason: String| ConfigServiceError::InvalidThreshold {
            value: raw.to_string(),
            reason,
        };

        let threshold = raw.parse::<f32>().map_err(|e| invalid(e.to_string()))?;
        if !threshold.is_finite() {
            return Err(invalid("value out of range".to_string()));
        }

        Ok(f64::from(threshold))
    }

    /// The configured host tag, if any
    pub fn host_tag(&self) -> Option<&str> {
        non_empty(&self.host)
    }
}

/// Loads [`Settings`] from a `.env` file with the process environment laid over it.
///
/// Variables already present in the environment take precedence over the file.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    env_file: Option<PathBuf>,
    include_environment: bool,
}

impl SettingsLoader {
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self {
            env_file: Some(env_file.into()),
            include_environment: true,
        }
    }

    /// Read only the process environment
    pub fn environment_only() -> Self {
        Self {
            env_file: None,
            include_environment: true,
        }
    }

    /// Skip the process environment overlay
    pub fn without_environment(mut self) -> Self {
        self.include_environment = false;
        self
    }

    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    pub fn load(&self) -> Result<Settings, ConfigServiceError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.env_file {
            if !path.is_file() {
                return Err(ConfigServiceError::FileNotFound { path: path.clone() });
            }
            debug!("Loading settings from {}", path.display());
            let values = read_env_file(path)?;
            builder = builder.add_source(Environment::default().source(Some(values)));
        }

        if self.include_environment {
            builder = builder.add_source(Environment::default());
        }

        let table: HashMap<String, Value> = builder.build()?.try_deserialize()?;

        // Dotted variable names become nested tables and are ignored
        let raw = table
            .into_iter()
            .filter_map(|(k, v)| v.into_string().ok().map(|s| (k, s)))
            .collect();

        Ok(Settings::from_map(raw))
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_FILE)
    }
}

fn read_env_file(path: &Path) -> Result<Map<String, String>, ConfigServiceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigServiceError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let entries = env_file::parse(&contents).map_err(|source| ConfigServiceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(entries.into_iter().collect())
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
