//! Per-call configuration for `mark`.

use crate::document::NodeId;
use crate::label::{DuplicateLabelPolicy, LabelGenerator};
use crate::placement::Placement;
use crate::selector::escape_ident;
use crate::style::{StyleMap, StyleSpec, default_label_style, default_mask_style};

/// Native interactive tags plus the common interactive ARIA roles.
pub const DEFAULT_SELECTOR: &str = "button, input, a, select, textarea, \
[role=\"button\"], [role=\"link\"], [role=\"checkbox\"], [role=\"radio\"], [role=\"tab\"], \
[role=\"menuitem\"], [role=\"option\"], [role=\"switch\"], [role=\"combobox\"], [role=\"textbox\"]";

pub const DEFAULT_LABEL_ATTRIBUTE: &str = "data-webmarkeredby";
pub const DEFAULT_ROOT_ATTRIBUTE: &str = "data-webmarkered";
pub const DEFAULT_LABEL_CLASS: &str = "webmarker";
pub const DEFAULT_MASK_CLASS: &str = "webmarkermask";
pub const DEFAULT_ID_PREFIX: &str = "webmarker";

/// Options for one `mark` invocation. Every field has a default.
#[derive(Debug, Clone)]
pub struct MarkOptions {
    /// CSS selector choosing the elements to mark.
    pub selector: String,
    pub label_generator: LabelGenerator,
    pub duplicate_labels: DuplicateLabelPolicy,
    /// Attribute set on each marked element, carrying its label.
    pub label_attribute: String,
    /// Attribute set on the document element while a session is active.
    pub root_attribute: String,
    pub label_placement: Placement,
    pub label_style: StyleSpec,
    pub mask_style: StyleSpec,
    /// Draw a bounding box around each marked element.
    pub show_masks: bool,
    /// Skip elements entirely outside the visible window.
    pub viewport_only: bool,
    /// Subtree to search; the document body when `None`.
    pub container: Option<NodeId>,
    pub label_class: String,
    pub mask_class: String,
    pub id_prefix: String,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            label_generator: LabelGenerator::Index,
            duplicate_labels: DuplicateLabelPolicy::Reject,
            label_attribute: DEFAULT_LABEL_ATTRIBUTE.to_string(),
            root_attribute: DEFAULT_ROOT_ATTRIBUTE.to_string(),
            label_placement: Placement::TopStart,
            label_style: StyleSpec::Static(default_label_style()),
            mask_style: StyleSpec::Static(default_mask_style()),
            show_masks: true,
            viewport_only: false,
            container: None,
            label_class: DEFAULT_LABEL_CLASS.to_string(),
            mask_class: DEFAULT_MASK_CLASS.to_string(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

impl MarkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn with_label_generator(mut self, generator: LabelGenerator) -> Self {
        self.label_generator = generator;
        self
    }

    pub fn with_duplicate_labels(mut self, policy: DuplicateLabelPolicy) -> Self {
        self.duplicate_labels = policy;
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.label_placement = placement;
        self
    }

    pub fn with_label_style(mut self, style: impl Into<StyleSpec>) -> Self {
        self.label_style = style.into();
        self
    }

    pub fn with_mask_style(mut self, style: impl Into<StyleSpec>) -> Self {
        self.mask_style = style.into();
        self
    }

    pub fn with_masks(mut self, show: bool) -> Self {
        self.show_masks = show;
        self
    }

    pub fn with_viewport_only(mut self, viewport_only: bool) -> Self {
        self.viewport_only = viewport_only;
        self
    }

    pub fn with_container(mut self, container: NodeId) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_label_attribute(mut self, name: impl Into<String>) -> Self {
        self.label_attribute = name.into();
        self
    }

    pub fn with_root_attribute(mut self, name: impl Into<String>) -> Self {
        self.root_attribute = name.into();
        self
    }

    pub fn with_classes(mut self, label_class: impl Into<String>, mask_class: impl Into<String>) -> Self {
        self.label_class = label_class.into();
        self.mask_class = mask_class.into();
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Id given to the label overlay for `label`.
    pub fn label_id(&self, label: &str) -> String {
        label_node_id(&self.id_prefix, label)
    }

    /// Id given to the mask overlay for `label`.
    pub fn mask_id(&self, label: &str) -> String {
        mask_node_id(&self.id_prefix, label)
    }

    pub(crate) fn naming(&self) -> Naming {
        Naming {
            label_attribute: self.label_attribute.clone(),
            root_attribute: self.root_attribute.clone(),
            label_class: self.label_class.clone(),
            mask_class: self.mask_class.clone(),
        }
    }
}

pub(crate) fn label_node_id(prefix: &str, label: &str) -> String {
    format!("{}-{}", prefix, label)
}

pub(crate) fn mask_node_id(prefix: &str, label: &str) -> String {
    format!("{}-mask-{}", prefix, label)
}

/// Attribute and class names needed to find and sweep a session's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Naming {
    pub label_attribute: String,
    pub root_attribute: String,
    pub label_class: String,
    pub mask_class: String,
}

impl Default for Naming {
    fn default() -> Self {
        MarkOptions::default().naming()
    }
}

impl Naming {
    /// Selector matching every overlay node.
    pub fn overlay_selector(&self) -> String {
        format!(
            ".{}, .{}",
            escape_ident(&self.label_class),
            escape_ident(&self.mask_class)
        )
    }

    /// Selector matching every tagged element.
    pub fn tagged_selector(&self) -> String {
        format!("[{}]", escape_ident(&self.label_attribute))
    }
}

/// Default label style with `overrides` layered on top.
pub fn label_style_with(overrides: &StyleMap) -> StyleMap {
    let mut style = default_label_style();
    style.merge(overrides);
    style
}

/// Default mask style with `overrides` layered on top.
pub fn mask_style_with(overrides: &StyleMap) -> StyleMap {
    let mut style = default_mask_style();
    style.merge(overrides);
    style
}
