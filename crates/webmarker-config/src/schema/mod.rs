//! Configuration schema definitions.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use webmarker_core::{
    DEFAULT_ID_PREFIX, DEFAULT_LABEL_ATTRIBUTE, DEFAULT_LABEL_CLASS, DEFAULT_MASK_CLASS,
    DEFAULT_ROOT_ATTRIBUTE, DEFAULT_SELECTOR, DuplicateLabelPolicy, LabelGenerator, MarkOptions,
    Placement, StyleMap, label_style_with, mask_style_with,
};

use crate::loader::ConfigLoader;

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub mark: MarkConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Remote debugging endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Target id of the tab to mark; first open tab when unset.
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            target: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BrowserConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Built-in label generators selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelScheme {
    /// `0`, `1`, `2`, ...
    #[default]
    Numeric,
    /// `A` .. `Z`, `AA`, `AB`, ...
    Alpha,
}

impl LabelScheme {
    pub fn generator(self) -> LabelGenerator {
        match self {
            LabelScheme::Numeric => LabelGenerator::Index,
            LabelScheme::Alpha => LabelGenerator::Alphabetic,
        }
    }
}

impl FromStr for LabelScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" | "index" => Ok(LabelScheme::Numeric),
            "alpha" | "alphabetic" => Ok(LabelScheme::Alpha),
            other => Err(format!("unknown label scheme '{}', expected numeric or alpha", other)),
        }
    }
}

/// Defaults for `mark`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkConfig {
    #[serde(default = "default_selector")]
    pub selector: String,

    #[serde(default)]
    pub labels: LabelScheme,

    #[serde(default)]
    pub duplicate_labels: DuplicateLabelPolicy,

    #[serde(default)]
    pub placement: Placement,

    #[serde(default = "default_true")]
    pub show_masks: bool,

    #[serde(default)]
    pub viewport_only: bool,

    #[serde(default = "default_label_attribute")]
    pub label_attribute: String,

    #[serde(default = "default_root_attribute")]
    pub root_attribute: String,

    #[serde(default = "default_label_class")]
    pub label_class: String,

    #[serde(default = "default_mask_class")]
    pub mask_class: String,

    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Declarations layered over the default label style.
    #[serde(default)]
    pub label_style: Option<StyleMap>,

    /// Declarations layered over the default mask style.
    #[serde(default)]
    pub mask_style: Option<StyleMap>,
}

impl Default for MarkConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            labels: LabelScheme::default(),
            duplicate_labels: DuplicateLabelPolicy::default(),
            placement: Placement::default(),
            show_masks: true,
            viewport_only: false,
            label_attribute: default_label_attribute(),
            root_attribute: default_root_attribute(),
            label_class: default_label_class(),
            mask_class: default_mask_class(),
            id_prefix: default_id_prefix(),
            label_style: None,
            mask_style: None,
        }
    }
}

impl MarkConfig {
    /// Build engine options from this section.
    pub fn to_options(&self) -> MarkOptions {
        let mut options = MarkOptions::new()
            .with_selector(self.selector.clone())
            .with_label_generator(self.labels.generator())
            .with_duplicate_labels(self.duplicate_labels)
            .with_placement(self.placement)
            .with_masks(self.show_masks)
            .with_viewport_only(self.viewport_only)
            .with_label_attribute(self.label_attribute.clone())
            .with_root_attribute(self.root_attribute.clone())
            .with_classes(self.label_class.clone(), self.mask_class.clone())
            .with_id_prefix(self.id_prefix.clone());
        if let Some(style) = &self.label_style {
            options = options.with_label_style(label_style_with(style));
        }
        if let Some(style) = &self.mask_style {
            options = options.with_mask_style(mask_style_with(style));
        }
        options
    }
}

fn default_selector() -> String {
    DEFAULT_SELECTOR.to_string()
}

fn default_label_attribute() -> String {
    DEFAULT_LABEL_ATTRIBUTE.to_string()
}

fn default_root_attribute() -> String {
    DEFAULT_ROOT_ATTRIBUTE.to_string()
}

fn default_label_class() -> String {
    DEFAULT_LABEL_CLASS.to_string()
}

fn default_mask_class() -> String {
    DEFAULT_MASK_CLASS.to_string()
}

fn default_id_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files; `~/.webmarker/logs` when unset.
    #[serde(default)]
    pub directory: Option<String>,

    /// File name prefix of the daily log files.
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file: default_log_file(),
        }
    }
}

impl LoggingConfig {
    /// Resolved log directory, with `~` expanded.
    pub fn log_dir(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".webmarker")
                .join("logs"),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "webmarker.log".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
