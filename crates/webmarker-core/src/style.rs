//! Inline style declarations for overlay nodes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::ElementInfo;

/// A set of CSS declarations keyed by kebab-case property name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap(BTreeMap<String, String>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(normalize_property(&property.into()), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(&normalize_property(property)).map(String::as_str)
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.0.remove(&normalize_property(property))
    }

    /// Overlay `other` on top of `self`; later declarations win.
    pub fn merge(&mut self, other: &StyleMap) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a `style` attribute value such as `color: red; top: 4px`.
    pub fn parse(css: &str) -> Self {
        let mut map = StyleMap::new();
        for decl in css.split(';') {
            if let Some((k, v)) = decl.split_once(':') {
                let (k, v) = (k.trim(), v.trim());
                if !k.is_empty() {
                    map.set(k, v);
                }
            }
        }
        map
    }

    /// Serialize as a `style` attribute value.
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = StyleMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

/// Accepts both `backgroundColor` and `background-color`.
fn normalize_property(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Callback computing a style from the anchor element and its index.
pub type StyleFn = Arc<dyn Fn(&ElementInfo, usize) -> StyleMap + Send + Sync>;

/// Static style or per-element style, resolved once when the overlay is created.
#[derive(Clone)]
pub enum StyleSpec {
    Static(StyleMap),
    Computed(StyleFn),
}

impl StyleSpec {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&ElementInfo, usize) -> StyleMap + Send + Sync + 'static,
    {
        StyleSpec::Computed(Arc::new(f))
    }

    pub fn resolve(&self, element: &ElementInfo, index: usize) -> StyleMap {
        match self {
            StyleSpec::Static(map) => map.clone(),
            StyleSpec::Computed(f) => f(element, index),
        }
    }
}

impl fmt::Debug for StyleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleSpec::Static(map) => f.debug_tuple("Static").field(map).finish(),
            StyleSpec::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl From<StyleMap> for StyleSpec {
    fn from(map: StyleMap) -> Self {
        StyleSpec::Static(map)
    }
}

/// Default look of a label node.
pub fn default_label_style() -> StyleMap {
    StyleMap::new()
        .with("background-color", "red")
        .with("color", "white")
        .with("padding", "2px 4px")
        .with("font-size", "12px")
        .with("font-weight", "bold")
}

/// Default look of a bounding-box node.
pub fn default_mask_style() -> StyleMap {
    StyleMap::new()
        .with("outline", "2px dashed red")
        .with("background-color", "transparent")
}

/// Declarations every overlay node carries so it floats above the page.
pub(crate) fn overlay_base_style() -> StyleMap {
    StyleMap::new()
        .with("position", "absolute")
        .with("z-index", "999999999")
        .with("pointer-events", "none")
}

pub(crate) fn px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{:.2}px", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeId;

    #[test]
    fn test_camel_case_is_normalized() {
        let style = StyleMap::new().with("backgroundColor", "blue");
        assert_eq!(style.get("background-color"), Some("blue"));
        assert_eq!(style.get("backgroundColor"), Some("blue"));
    }

    #[test]
    fn test_merge_later_wins() {
        let mut base = default_label_style();
        base.merge(&StyleMap::new().with("background-color", "blue"));
        assert_eq!(base.get("background-color"), Some("blue"));
        assert_eq!(base.get("color"), Some("white"));
    }

    #[test]
    fn test_parse_and_to_css() {
        let style = StyleMap::parse("color: red; top: 4px;; bogus");
        assert_eq!(style.len(), 2);
        assert_eq!(style.to_css(), "color: red; top: 4px;");
    }

    #[test]
    fn test_custom_properties_kept_verbatim() {
        let style = StyleMap::new().with("--markColor", "red");
        assert_eq!(style.get("--markColor"), Some("red"));
    }

    #[test]
    fn test_computed_style_resolves_per_element() {
        let spec = StyleSpec::computed(|el, _| {
            let color = if el.tag_name == "button" { "red" } else { "green" };
            StyleMap::new().with("color", color)
        });
        let button = ElementInfo::new(NodeId::new(1), "BUTTON");
        let link = ElementInfo::new(NodeId::new(2), "a");
        assert_eq!(spec.resolve(&button, 0).get("color"), Some("red"));
        assert_eq!(spec.resolve(&link, 1).get("color"), Some("green"));
    }

    #[test]
    fn test_px_formatting() {
        assert_eq!(px(12.0), "12px");
        assert_eq!(px(-3.0), "-3px");
        assert_eq!(px(1.5), "1.50px");
    }
}
