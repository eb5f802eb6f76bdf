//! Configuration errors.

use thiserror::Error;

/// Errors raised while loading `webmarker.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Malformed config: {0}")]
    InvalidFormat(String),

    /// A value parsed but failed validation.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A `${VAR}` reference names an unset variable.
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config is not valid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}
