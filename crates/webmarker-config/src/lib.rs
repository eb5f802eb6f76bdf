//! # WebMarker Config
//!
//! Configuration management for WebMarker: the `webmarker.toml` schema,
//! a loader with `${VAR}` and `~` expansion, and a validator.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
