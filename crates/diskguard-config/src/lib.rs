mod env_file;
mod service;

pub use env_file::EnvFileError;
pub use service::{
    keys, ConfigServiceError, RollbarSettings, Settings, SettingsLoader, SmtpSettings,
    DEFAULT_CODE_VERSION, DEFAULT_ENVIRONMENT, DEFAULT_ENV_FILE, DEFAULT_FREE_DISK_SPACE,
};
