//! Host abstraction over a live or simulated DOM.
//!
//! The overlay engine never touches a concrete DOM. Everything it needs, from
//! selector queries to layout boxes and overlay creation, goes through the
//! [`Document`] trait so the same engine can drive an in-memory page or a
//! browser over the DevTools protocol.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::geometry::{Rect, Viewport};
use crate::style::StyleMap;

/// Opaque handle to a node owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag and attributes of an element, as seen by label generators and style callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub node: NodeId,
    /// Tag name (lowercase).
    pub tag_name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementInfo {
    pub fn new(node: NodeId, tag_name: impl Into<String>) -> Self {
        Self {
            node,
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn role(&self) -> Option<&str> {
        self.attribute("role")
    }
}

/// An overlay node to be appended to the document body.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub id: String,
    pub class_name: String,
    pub text: Option<String>,
}

/// Layout change notification used to drive overlay tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEvent {
    Scroll,
    Resize,
    Mutation,
}

/// DOM host the overlay engine operates on.
///
/// Coordinates returned by [`Document::bounding_rect`] are viewport-relative,
/// like `Element.getBoundingClientRect()`.
#[async_trait]
pub trait Document: Send + Sync {
    /// The root `<html>` element.
    async fn document_element(&self) -> Result<NodeId>;

    /// The `<body>` element, default container and overlay parent.
    async fn body(&self) -> Result<NodeId>;

    /// Descendants of `container` matching `selector`, in document order.
    async fn query_selector_all(&self, container: NodeId, selector: &str) -> Result<Vec<NodeId>>;

    async fn describe(&self, node: NodeId) -> Result<ElementInfo>;

    /// Viewport-relative border box, or `None` when the node has no box or is detached.
    async fn bounding_rect(&self, node: NodeId) -> Result<Option<Rect>>;

    async fn viewport(&self) -> Result<Viewport>;

    async fn is_connected(&self, node: NodeId) -> Result<bool>;

    /// Create a `div` overlay and append it to the body.
    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<NodeId>;

    async fn set_text(&self, node: NodeId, text: &str) -> Result<()>;

    /// Merge the given declarations into the node's inline style.
    async fn apply_style(&self, node: NodeId, style: &StyleMap) -> Result<()>;

    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()>;

    async fn remove_attribute(&self, node: NodeId, name: &str) -> Result<()>;

    async fn has_attribute(&self, node: NodeId, name: &str) -> Result<bool>;

    /// Detach the node from its parent. Removing a detached node is a no-op.
    async fn remove_node(&self, node: NodeId) -> Result<()>;

    /// Subscribe to scroll, resize and mutation notifications.
    fn layout_events(&self) -> broadcast::Receiver<LayoutEvent>;
}
