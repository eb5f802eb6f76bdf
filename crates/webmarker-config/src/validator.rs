//! Configuration validation.

use webmarker_core::SelectorList;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_mark(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.browser.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "endpoint must start with http:// or https:// (the discovery endpoint, not a WebSocket URL)",
            ));
        }

        if config.browser.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "browser.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        } else if config.browser.request_timeout_secs > 300 {
            result.add_warning(ValidationWarning::new(
                "browser.request_timeout_secs",
                "request_timeout_secs is very high (>300), a hung page will block for that long",
            ));
        }
    }

    fn validate_mark(config: &Config, result: &mut ValidationResult) {
        let mark = &config.mark;

        if mark.selector.trim().is_empty() {
            result.add_error(ValidationError::new("mark.selector", "Selector cannot be empty"));
        } else if let Err(e) = SelectorList::parse(&mark.selector) {
            // The browser's selector engine is a superset of the offline one.
            result.add_warning(ValidationWarning::new(
                "mark.selector",
                format!("Selector is not understood by the offline document: {}", e),
            ));
        }

        let names = [
            ("mark.label_attribute", &mark.label_attribute),
            ("mark.root_attribute", &mark.root_attribute),
            ("mark.label_class", &mark.label_class),
            ("mark.mask_class", &mark.mask_class),
            ("mark.id_prefix", &mark.id_prefix),
        ];
        for (path, value) in names {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                result.add_error(ValidationError::new(
                    path,
                    "must be non-empty and contain no whitespace",
                ));
            }
        }

        if mark.label_attribute == mark.root_attribute {
            result.add_error(ValidationError::new(
                "mark.root_attribute",
                "root_attribute must differ from label_attribute",
            ));
        }

        if mark.label_class == mark.mask_class {
            result.add_error(ValidationError::new(
                "mark.mask_class",
                "mask_class must differ from label_class",
            ));
        }

        if !mark.show_masks && mark.mask_style.is_some() {
            result.add_warning(ValidationWarning::new(
                "mark.mask_style",
                "mask_style is set but show_masks is false, it will be ignored",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        // Full filter directives such as "webmarker=debug" are passed through.
        if !level.contains('=') && !LOG_LEVELS.contains(&level.as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        }

        if config.logging.file.trim().is_empty() {
            result.add_error(ValidationError::new("logging.file", "Log file name cannot be empty"));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
