//! In-memory [`Document`] with explicit layout boxes.
//!
//! Elements are added with [`StaticDocument::append`] and carry the box a
//! browser would have laid them out at, in document coordinates. Overlay
//! nodes are sized with a fixed text metric. Scrolling, resizing and layout
//! changes emit [`LayoutEvent`]s so tracking behaves as it would on a page.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::trace;

use crate::document::{Document, ElementInfo, LayoutEvent, NodeId, OverlaySpec};
use crate::error::{MarkError, Result};
use crate::geometry::{Rect, Viewport};
use crate::selector::{SelectorElement, SelectorList};
use crate::style::StyleMap;

/// Approximate glyph width used to size overlay text.
const CHAR_WIDTH: f64 = 7.0;
/// Horizontal padding added around overlay text.
const TEXT_PADDING: f64 = 8.0;
/// Line height of an overlay.
const LINE_HEIGHT: f64 = 18.0;

/// Description of an element to append.
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    rect: Option<Rect>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Layout box in document coordinates.
    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Some(Rect::new(x, y, width, height));
        self
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layout: Option<Rect>,
    style: StyleMap,
    overlay: bool,
}

impl NodeData {
    fn from_spec(spec: ElementSpec, parent: Option<NodeId>) -> Self {
        Self {
            tag: spec.tag,
            attributes: spec.attributes,
            text: spec.text,
            parent,
            children: Vec::new(),
            layout: spec.rect,
            style: StyleMap::new(),
            overlay: false,
        }
    }

    /// Box in document coordinates.
    fn document_box(&self) -> Option<Rect> {
        if !self.overlay {
            return self.layout;
        }
        let parse = |prop: &str| {
            self.style
                .get(prop)
                .and_then(|v| v.trim_end_matches("px").trim().parse::<f64>().ok())
        };
        let width = parse("width")
            .unwrap_or_else(|| self.text.chars().count() as f64 * CHAR_WIDTH + TEXT_PADDING);
        let height = parse("height").unwrap_or(LINE_HEIGHT);
        Some(Rect::new(
            parse("left").unwrap_or(0.0),
            parse("top").unwrap_or(0.0),
            width,
            height,
        ))
    }
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<NodeId, NodeData>,
    next_id: u64,
    html: NodeId,
    body: NodeId,
    viewport: Viewport,
}

impl Tree {
    fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(&id).ok_or(MarkError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes.get_mut(&id).ok_or(MarkError::NodeNotFound(id))
    }

    fn insert(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        if let Some(parent) = data.parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.push(id);
            }
        }
        self.nodes.insert(id, data);
        id
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.html {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node_mut(id)?.parent.take();
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        Ok(())
    }

    /// Descendants of `root` in document (pre-)order, excluding `root`.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(&root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn select(&self, root: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| selector.matches(&ElementRef { tree: self, id: *id }))
            .collect()
    }
}

#[derive(Clone, Copy)]
struct ElementRef<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> ElementRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[&self.id]
    }
}

impl SelectorElement for ElementRef<'_> {
    fn tag_name(&self) -> &str {
        &self.data().tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.data()
            .attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn parent_element(&self) -> Option<Self> {
        self.data().parent.map(|id| ElementRef {
            tree: self.tree,
            id,
        })
    }
}

/// In-memory page model implementing [`Document`].
#[derive(Debug)]
pub struct StaticDocument {
    tree: RwLock<Tree>,
    events: broadcast::Sender<LayoutEvent>,
}

impl StaticDocument {
    /// Empty `<html><body></body></html>` page with the given viewport size.
    pub fn new(viewport: Viewport) -> Self {
        let mut tree = Tree {
            nodes: HashMap::new(),
            next_id: 1,
            html: NodeId::new(0),
            body: NodeId::new(0),
            viewport,
        };
        let html = tree.insert(NodeData::from_spec(
            ElementSpec::new("html").rect(0.0, 0.0, viewport.width, viewport.height),
            None,
        ));
        let body = tree.insert(NodeData::from_spec(
            ElementSpec::new("body").rect(0.0, 0.0, viewport.width, viewport.height),
            Some(html),
        ));
        tree.html = html;
        tree.body = body;

        let (events, _) = broadcast::channel(64);
        Self {
            tree: RwLock::new(tree),
            events,
        }
    }

    pub fn html(&self) -> NodeId {
        self.tree.read().html
    }

    pub fn body_id(&self) -> NodeId {
        self.tree.read().body
    }

    /// Append an element under `parent` and return its handle.
    pub fn append(&self, parent: NodeId, spec: ElementSpec) -> Result<NodeId> {
        let mut tree = self.tree.write();
        tree.node(parent)?;
        Ok(tree.insert(NodeData::from_spec(spec, Some(parent))))
    }

    /// Query the whole document synchronously.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        let parsed = parse_selector(selector)?;
        let tree = self.tree.read();
        Ok(tree.select(tree.html, &parsed))
    }

    /// Number of elements matching `selector` in the whole document.
    pub fn count(&self, selector: &str) -> usize {
        self.select(selector).map(|v| v.len()).unwrap_or(0)
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        self.tree.read().nodes.get(&node).map(|n| n.text.clone())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .read()
            .nodes
            .get(&node)
            .and_then(|n| n.attributes.get(&name.to_ascii_lowercase()).cloned())
    }

    pub fn style(&self, node: NodeId) -> Option<StyleMap> {
        self.tree.read().nodes.get(&node).map(|n| n.style.clone())
    }

    pub fn connected(&self, node: NodeId) -> bool {
        self.tree.read().is_connected(node)
    }

    pub fn current_viewport(&self) -> Viewport {
        self.tree.read().viewport
    }

    /// Scroll the document and notify subscribers.
    pub fn scroll_to(&self, x: f64, y: f64) {
        {
            let mut tree = self.tree.write();
            tree.viewport.scroll_x = x;
            tree.viewport.scroll_y = y;
        }
        self.emit(LayoutEvent::Scroll);
    }

    /// Resize the viewport and notify subscribers.
    pub fn resize(&self, width: f64, height: f64) {
        {
            let mut tree = self.tree.write();
            tree.viewport.width = width;
            tree.viewport.height = height;
        }
        self.emit(LayoutEvent::Resize);
    }

    /// Move an element to a new layout box (reflow) and notify subscribers.
    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<()> {
        self.tree.write().node_mut(node)?.layout = Some(rect);
        self.emit(LayoutEvent::Mutation);
        Ok(())
    }

    /// Remove an element from the page, as a page script would, and notify subscribers.
    pub fn detach(&self, node: NodeId) -> Result<()> {
        self.tree.write().detach(node)?;
        self.emit(LayoutEvent::Mutation);
        Ok(())
    }

    fn emit(&self, event: LayoutEvent) {
        trace!(?event, "layout event");
        // No receivers simply means nothing is tracking.
        let _ = self.events.send(event);
    }
}

impl Default for StaticDocument {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

fn parse_selector(selector: &str) -> Result<SelectorList> {
    SelectorList::parse(selector).map_err(|e| MarkError::invalid_selector(selector, e.to_string()))
}

#[async_trait]
impl Document for StaticDocument {
    async fn document_element(&self) -> Result<NodeId> {
        Ok(self.html())
    }

    async fn body(&self) -> Result<NodeId> {
        Ok(self.body_id())
    }

    async fn query_selector_all(&self, container: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let parsed = parse_selector(selector)?;
        let tree = self.tree.read();
        tree.node(container)?;
        Ok(tree.select(container, &parsed))
    }

    async fn describe(&self, node: NodeId) -> Result<ElementInfo> {
        let tree = self.tree.read();
        let data = tree.node(node)?;
        let mut info = ElementInfo::new(node, data.tag.clone());
        info.attributes = data.attributes.clone();
        Ok(info)
    }

    async fn bounding_rect(&self, node: NodeId) -> Result<Option<Rect>> {
        let tree = self.tree.read();
        let data = tree.node(node)?;
        if !tree.is_connected(node) {
            return Ok(None);
        }
        let viewport = tree.viewport;
        Ok(data
            .document_box()
            .map(|r| r.translate(-viewport.scroll_x, -viewport.scroll_y)))
    }

    async fn viewport(&self) -> Result<Viewport> {
        Ok(self.current_viewport())
    }

    async fn is_connected(&self, node: NodeId) -> Result<bool> {
        Ok(self.connected(node))
    }

    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<NodeId> {
        let mut tree = self.tree.write();
        let body = tree.body;
        let mut data = NodeData::from_spec(
            ElementSpec::new("div")
                .attr("id", spec.id.clone())
                .attr("class", spec.class_name.clone())
                .text(spec.text.clone().unwrap_or_default()),
            Some(body),
        );
        data.overlay = true;
        Ok(tree.insert(data))
    }

    async fn set_text(&self, node: NodeId, text: &str) -> Result<()> {
        self.tree.write().node_mut(node)?.text = text.to_string();
        Ok(())
    }

    async fn apply_style(&self, node: NodeId, style: &StyleMap) -> Result<()> {
        self.tree.write().node_mut(node)?.style.merge(style);
        Ok(())
    }

    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.tree
            .write()
            .node_mut(node)?
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    async fn remove_attribute(&self, node: NodeId, name: &str) -> Result<()> {
        self.tree
            .write()
            .node_mut(node)?
            .attributes
            .remove(&name.to_ascii_lowercase());
        Ok(())
    }

    async fn has_attribute(&self, node: NodeId, name: &str) -> Result<bool> {
        Ok(self
            .tree
            .read()
            .node(node)?
            .attributes
            .contains_key(&name.to_ascii_lowercase()))
    }

    async fn remove_node(&self, node: NodeId) -> Result<()> {
        self.tree.write().detach(node)
    }

    fn layout_events(&self) -> broadcast::Receiver<LayoutEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "static_doc_tests.rs"]
mod tests;
