use super::*;
use webmarker_core::{ElementInfo, NodeId, StyleSpec};

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.browser.endpoint, "http://localhost:9222");
    assert!(config.browser.target.is_none());
    assert_eq!(config.browser.request_timeout(), Duration::from_secs(30));
    assert_eq!(config.mark.selector, DEFAULT_SELECTOR);
    assert!(config.mark.show_masks);
    assert!(!config.mark.viewport_only);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file, "webmarker.log");
}

#[test]
fn test_empty_toml_uses_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.mark.label_attribute, DEFAULT_LABEL_ATTRIBUTE);
    assert_eq!(config.mark.root_attribute, DEFAULT_ROOT_ATTRIBUTE);
    assert_eq!(config.mark.placement, Placement::TopStart);
    assert_eq!(config.mark.labels, LabelScheme::Numeric);
}

#[test]
fn test_partial_mark_section() {
    let config: Config = toml::from_str(
        r#"
        [mark]
        selector = "button"
        placement = "bottom-end"
        labels = "alpha"
        duplicate_labels = "last-write-wins"
        show_masks = false
        "#,
    )
    .unwrap();
    assert_eq!(config.mark.selector, "button");
    assert_eq!(config.mark.placement, Placement::BottomEnd);
    assert_eq!(config.mark.labels, LabelScheme::Alpha);
    assert_eq!(config.mark.duplicate_labels, DuplicateLabelPolicy::LastWriteWins);
    assert!(!config.mark.show_masks);
    assert_eq!(config.mark.label_class, DEFAULT_LABEL_CLASS);
}

#[test]
fn test_style_tables() {
    let config: Config = toml::from_str(
        r#"
        [mark.label_style]
        background-color = "blue"
        fontSize = "16px"
        "#,
    )
    .unwrap();
    let style = config.mark.label_style.unwrap();
    assert_eq!(style.get("background-color"), Some("blue"));
    assert!(config.mark.mask_style.is_none());
}

#[test]
fn test_to_options_copies_fields() {
    let mark = MarkConfig {
        selector: "a".to_string(),
        placement: Placement::Left,
        show_masks: false,
        viewport_only: true,
        id_prefix: "wm".to_string(),
        ..Default::default()
    };
    let options = mark.to_options();
    assert_eq!(options.selector, "a");
    assert_eq!(options.label_placement, Placement::Left);
    assert!(!options.show_masks);
    assert!(options.viewport_only);
    assert_eq!(options.id_prefix, "wm");
    assert!(options.container.is_none());
}

#[test]
fn test_to_options_layers_styles_over_defaults() {
    let mark = MarkConfig {
        label_style: Some(StyleMap::new().with("background-color", "green")),
        ..Default::default()
    };
    let options = mark.to_options();
    let StyleSpec::Static(style) = &options.label_style else {
        panic!("expected static style");
    };
    assert_eq!(style.get("background-color"), Some("green"));
    assert_eq!(style.get("padding"), webmarker_core::default_label_style().get("padding"));
}

#[test]
fn test_label_scheme_generator() {
    let info = ElementInfo::new(NodeId::new(1), "button");
    assert_eq!(LabelScheme::Numeric.generator().label(&info, 27), "27");
    assert_eq!(LabelScheme::Alpha.generator().label(&info, 27), "AB");
}

#[test]
fn test_label_scheme_from_str() {
    assert_eq!("numeric".parse::<LabelScheme>().unwrap(), LabelScheme::Numeric);
    assert_eq!("Alpha".parse::<LabelScheme>().unwrap(), LabelScheme::Alpha);
    assert!("roman".parse::<LabelScheme>().is_err());
}

#[test]
fn test_log_dir_expands_tilde() {
    let logging = LoggingConfig {
        directory: Some("~/wm-logs".to_string()),
        ..Default::default()
    };
    let dir = logging.log_dir();
    assert!(!dir.to_string_lossy().starts_with('~'));
    assert!(dir.ends_with("wm-logs"));
}

#[test]
fn test_log_dir_default() {
    let dir = LoggingConfig::default().log_dir();
    assert!(dir.ends_with(".webmarker/logs"));
}

#[test]
fn test_config_serialize_roundtrip_keeps_sections() {
    let config = Config::default();
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("[browser]"));
    assert!(text.contains("[mark]"));
    let back: Config = toml::from_str(&text).unwrap();
    assert_eq!(back.mark.selector, config.mark.selector);
}
