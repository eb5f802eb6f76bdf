//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;
use crate::validator::{ConfigValidator, ValidationWarning};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "webmarker.toml";

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load an explicit file, else `./webmarker.toml` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Load as [`load_or_default`](Self::load_or_default), apply `overrides`
    /// (command-line flags), then validate.
    ///
    /// The first validation error is returned as [`ConfigError::InvalidValue`];
    /// warnings are handed back with the config for the caller to log.
    pub fn load_validated(
        path: Option<&Path>,
        overrides: impl FnOnce(&mut Config),
    ) -> Result<(Config, Vec<ValidationWarning>), ConfigError> {
        let mut config = Self::load_or_default(path)?;
        overrides(&mut config);

        let result = ConfigValidator::validate(&config)?;
        if let Some(error) = result.errors.into_iter().next() {
            return Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            });
        }
        Ok((config, result.warnings))
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.webmarker`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}
