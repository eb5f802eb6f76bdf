//! [`Document`] implementation backed by a live page.
//!
//! Element handles are CDP DOM node ids. Overlays are created with a small
//! page-side helper and adopted into the DOM agent with `DOM.requestNode`.
//! Layout changes are reported by a listener injected into the page that
//! calls a `Runtime.addBinding` binding once per animation frame.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use webmarker_core::{
    Document, ElementInfo, LayoutEvent, MarkError, MarkOptions, NodeId, OverlaySpec, Rect, Result,
    StyleMap, Viewport,
};

use crate::error::CdpError;
use crate::protocol::{BindingCalled, CdpResponse, attribute_pairs};
use crate::session::{PageSession, quad_bounds};

/// Name of the page binding receiving layout notifications.
pub const LAYOUT_BINDING: &str = "__webmarkerLayout";

/// Attribute carried by every overlay node so the page listener can ignore
/// mutations of the overlays themselves.
const OVERLAY_ATTRIBUTE: &str = "data-webmarker-overlay";

/// Node ids the DOM agent handed out for the current document.
#[derive(Debug, Clone, Copy)]
struct Roots {
    html: i64,
    body: i64,
}

/// A browser page seen through the [`Document`] trait.
pub struct CdpDocument {
    page: Arc<PageSession>,
    roots: Arc<Mutex<Option<Roots>>>,
    events: broadcast::Sender<LayoutEvent>,
    pump: Option<JoinHandle<()>>,
}

impl CdpDocument {
    /// Wrap an attached page and install the layout listener.
    pub async fn new(page: PageSession) -> std::result::Result<Self, CdpError> {
        let page = Arc::new(page);
        let (events, _) = broadcast::channel(64);
        let roots = Arc::new(Mutex::new(None));

        page.add_binding(LAYOUT_BINDING).await?;
        let script = layout_listener_script(LAYOUT_BINDING);
        page.add_script_on_new_document(&script).await?;
        page.evaluate(&script).await?;

        let pump = page
            .take_events()
            .map(|rx| tokio::spawn(pump_events(rx, events.clone(), roots.clone())));
        if pump.is_none() {
            warn!("page events already taken, layout tracking disabled");
        }

        debug!(target_id = page.target_id(), "layout listener installed");
        Ok(Self {
            page,
            roots,
            events,
            pump,
        })
    }

    /// The underlying page session.
    pub fn page(&self) -> &PageSession {
        &self.page
    }

    /// Keep the overlays of a mark made with `options` attached to their
    /// anchors from inside the page, after this process has gone.
    ///
    /// The page-side updater stops itself once the document element loses
    /// `options.root_attribute`, so any later unmark also ends it. Installing
    /// again replaces the previous updater.
    pub async fn keep_attached(&self, options: &MarkOptions) -> std::result::Result<(), CdpError> {
        let installed = self.page.evaluate(&auto_update_script(options)).await?;
        if installed.as_bool() == Some(true) {
            debug!(placement = %options.label_placement, "page-side updater installed");
        } else {
            warn!("page is not marked, page-side updater not installed");
        }
        Ok(())
    }

    async fn roots(&self) -> std::result::Result<Roots, CdpError> {
        if let Some(roots) = *self.roots.lock() {
            return Ok(roots);
        }
        let document = self.page.get_document().await?;
        let html = document
            .children
            .unwrap_or_default()
            .into_iter()
            .find(|n| n.is_element())
            .map(|n| n.node_id)
            .ok_or_else(|| CdpError::ElementNotFound("document element".to_string()))?;
        let body = self
            .page
            .query_selector(html, "body")
            .await?
            .ok_or_else(|| CdpError::ElementNotFound("body".to_string()))?;

        let roots = Roots { html, body };
        *self.roots.lock() = Some(roots);
        Ok(roots)
    }

    /// Run `function` with `this` bound to `node`.
    async fn call_on(
        &self,
        node: NodeId,
        function: &str,
        args: Vec<Value>,
    ) -> std::result::Result<Value, CdpError> {
        let object_id = self.page.resolve_node(cdp_id(node)).await?;
        let result = self.page.call_function_on(&object_id, function, args).await;
        if let Err(e) = self.page.release_object(&object_id).await {
            trace!(error = %e, "failed to release remote object");
        }
        result
    }
}

impl Drop for CdpDocument {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

fn cdp_id(node: NodeId) -> i64 {
    node.raw() as i64
}

fn node_id(id: i64) -> NodeId {
    NodeId::new(id as u64)
}

/// Forward page notifications to layout event subscribers.
async fn pump_events(
    mut rx: mpsc::UnboundedReceiver<CdpResponse>,
    events: broadcast::Sender<LayoutEvent>,
    roots: Arc<Mutex<Option<Roots>>>,
) {
    while let Some(message) = rx.recv().await {
        let Some(method) = message.method.as_deref() else {
            continue;
        };
        let event = match method {
            "Runtime.bindingCalled" => {
                let Some(params) = message.params else { continue };
                match serde_json::from_value::<BindingCalled>(params) {
                    Ok(call) if call.name == LAYOUT_BINDING => parse_layout_event(&call.payload),
                    Ok(_) => None,
                    Err(e) => {
                        warn!(error = %e, "malformed binding event");
                        None
                    }
                }
            }
            "DOM.documentUpdated" => {
                *roots.lock() = None;
                Some(LayoutEvent::Mutation)
            }
            _ => None,
        };
        if let Some(event) = event {
            trace!(?event, "page layout event");
            let _ = events.send(event);
        }
    }
    debug!("page event stream ended");
}

fn parse_layout_event(payload: &str) -> Option<LayoutEvent> {
    match payload {
        "scroll" => Some(LayoutEvent::Scroll),
        "resize" => Some(LayoutEvent::Resize),
        "mutation" => Some(LayoutEvent::Mutation),
        other => {
            debug!(payload = other, "unknown layout payload");
            None
        }
    }
}

/// Page-side listener reporting scrolls, resizes and DOM changes to `binding`,
/// at most once per kind per animation frame.
fn layout_listener_script(binding: &str) -> String {
    format!(
        r#"(() => {{
  if (window.__webmarkerListening) return;
  window.__webmarkerListening = true;
  const binding = {binding};
  const pending = new Set();
  let scheduled = false;
  const notify = (kind) => {{
    pending.add(kind);
    if (scheduled) return;
    scheduled = true;
    requestAnimationFrame(() => {{
      scheduled = false;
      const kinds = [...pending];
      pending.clear();
      if (typeof window[binding] !== 'function') return;
      for (const k of kinds) window[binding](k);
    }});
  }};
  const isOverlay = (node) => node instanceof Element && node.hasAttribute({overlay});
  const relevant = (r) => {{
    if (isOverlay(r.target)) return false;
    if (r.type !== 'childList') return true;
    return [...r.addedNodes, ...r.removedNodes].some((n) => !isOverlay(n));
  }};
  const start = () => {{
    window.addEventListener('scroll', () => notify('scroll'), {{ capture: true, passive: true }});
    window.addEventListener('resize', () => notify('resize'), {{ passive: true }});
    new ResizeObserver(() => notify('resize')).observe(document.documentElement);
    new MutationObserver((records) => {{
      if (records.some(relevant)) notify('mutation');
    }}).observe(document.documentElement, {{
      attributes: true, childList: true, subtree: true, characterData: true
    }});
  }};
  if (document.documentElement) start();
  else document.addEventListener('DOMContentLoaded', start, {{ once: true }});
}})()"#,
        binding = json!(binding),
        overlay = json!(OVERLAY_ATTRIBUTE),
    )
}

/// Page-side repositioner for the overlays of one mark.
///
/// Uses the same geometry as `compute_position`: anchors are found by the
/// label attribute and their overlays by id, all in document coordinates.
fn auto_update_script(options: &MarkOptions) -> String {
    let config = json!({
        "labelAttribute": options.label_attribute,
        "rootAttribute": options.root_attribute,
        "labelId": options.label_id(""),
        "maskId": options.mask_id(""),
        "placement": options.label_placement.as_str(),
    });
    format!(
        r#"(() => {{
  const cfg = {config};
  if (window.__webmarkerAutoUpdate) window.__webmarkerAutoUpdate.stop();
  const root = document.documentElement;
  if (!root || !root.hasAttribute(cfg.rootAttribute)) return false;
  const [side, align = 'center'] = cfg.placement.split('-');
  const horizontal = side === 'top' || side === 'bottom';
  const px = (v) => v + 'px';
  const place = () => {{
    const anchors = document.querySelectorAll('[' + CSS.escape(cfg.labelAttribute) + ']');
    for (const anchor of anchors) {{
      const label = anchor.getAttribute(cfg.labelAttribute);
      const tag = document.getElementById(cfg.labelId + label);
      if (!tag || anchor.getClientRects().length === 0) continue;
      const r = anchor.getBoundingClientRect();
      const ax = r.left + window.scrollX;
      const ay = r.top + window.scrollY;
      const t = tag.getBoundingClientRect();
      let x = ax + r.width / 2 - t.width / 2;
      let y = ay + r.height / 2 - t.height / 2;
      if (side === 'top') y = ay - t.height;
      else if (side === 'bottom') y = ay + r.height;
      else if (side === 'right') x = ax + r.width;
      else x = ax - t.width;
      if (align === 'start') {{
        if (horizontal) x = ax; else y = ay;
      }} else if (align === 'end') {{
        if (horizontal) x = ax + r.width - t.width; else y = ay + r.height - t.height;
      }}
      tag.style.left = px(x);
      tag.style.top = px(y);
      const mask = document.getElementById(cfg.maskId + label);
      if (mask) {{
        mask.style.left = px(ax);
        mask.style.top = px(ay);
        mask.style.width = px(r.width);
        mask.style.height = px(r.height);
      }}
    }}
  }};
  let scheduled = false;
  const schedule = () => {{
    if (scheduled) return;
    scheduled = true;
    requestAnimationFrame(() => {{
      scheduled = false;
      place();
    }});
  }};
  const isOverlay = (node) => node instanceof Element && node.hasAttribute({overlay});
  const relevant = (r) => {{
    if (isOverlay(r.target)) return false;
    if (r.type !== 'childList') return true;
    return [...r.addedNodes, ...r.removedNodes].some((n) => !isOverlay(n));
  }};
  const resizes = new ResizeObserver(schedule);
  const mutations = new MutationObserver((records) => {{
    if (!root.hasAttribute(cfg.rootAttribute)) {{
      stop();
      return;
    }}
    if (records.some(relevant)) schedule();
  }});
  const stop = () => {{
    window.removeEventListener('scroll', schedule, true);
    window.removeEventListener('resize', schedule);
    resizes.disconnect();
    mutations.disconnect();
    if (window.__webmarkerAutoUpdate === handle) delete window.__webmarkerAutoUpdate;
  }};
  const handle = {{ stop }};
  window.addEventListener('scroll', schedule, {{ capture: true, passive: true }});
  window.addEventListener('resize', schedule, {{ passive: true }});
  resizes.observe(root);
  mutations.observe(root, {{
    attributes: true, childList: true, subtree: true, characterData: true
  }});
  window.__webmarkerAutoUpdate = handle;
  schedule();
  return true;
}})()"#,
        config = config,
        overlay = json!(OVERLAY_ATTRIBUTE),
    )
}

/// Expression creating one overlay `div` under `body` and returning it.
fn create_overlay_script(spec: &OverlaySpec) -> String {
    format!(
        r#"(() => {{
  const el = document.createElement('div');
  el.id = {id};
  el.className = {class};
  el.setAttribute({overlay}, '');
  el.textContent = {text};
  document.body.appendChild(el);
  return el;
}})()"#,
        id = json!(spec.id),
        class = json!(spec.class_name),
        overlay = json!(OVERLAY_ATTRIBUTE),
        text = json!(spec.text.as_deref().unwrap_or_default()),
    )
}

fn element_info(node: NodeId, tag_name: String, flat: &[String]) -> ElementInfo {
    let mut info = ElementInfo::new(node, tag_name);
    for (name, value) in attribute_pairs(flat) {
        info.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
    }
    info
}

#[async_trait]
impl Document for CdpDocument {
    async fn document_element(&self) -> Result<NodeId> {
        Ok(node_id(self.roots().await?.html))
    }

    async fn body(&self) -> Result<NodeId> {
        Ok(node_id(self.roots().await?.body))
    }

    async fn query_selector_all(&self, container: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        self.roots().await?;
        match self.page.query_selector_all(cdp_id(container), selector).await {
            Ok(ids) => Ok(ids.into_iter().map(node_id).collect()),
            Err(e) if e.is_invalid_selector() => Err(MarkError::invalid_selector(selector, e.to_string())),
            Err(e) if e.is_server_error() => Err(MarkError::NodeNotFound(container)),
            Err(e) => Err(e.into()),
        }
    }

    async fn describe(&self, node: NodeId) -> Result<ElementInfo> {
        let described = match self.page.describe_node(cdp_id(node)).await {
            Ok(described) => described,
            Err(e) if e.is_server_error() => return Err(MarkError::NodeNotFound(node)),
            Err(e) => return Err(e.into()),
        };
        let tag_name = described.tag_name();
        let attributes = described.attributes.unwrap_or_default();
        Ok(element_info(node, tag_name, &attributes))
    }

    async fn bounding_rect(&self, node: NodeId) -> Result<Option<Rect>> {
        let model = self.page.get_box_model(cdp_id(node)).await?;
        Ok(model
            .and_then(|m| quad_bounds(&m.border))
            .map(|(x, y, w, h)| Rect::new(x, y, w, h)))
    }

    async fn viewport(&self) -> Result<Viewport> {
        let metrics = self.page.layout_metrics().await?;
        let v = metrics.viewport();
        Ok(Viewport {
            width: v.client_width,
            height: v.client_height,
            scroll_x: v.page_x,
            scroll_y: v.page_y,
        })
    }

    async fn is_connected(&self, node: NodeId) -> Result<bool> {
        match self.call_on(node, "function() { return this.isConnected; }", Vec::new()).await {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            // The DOM agent forgets removed nodes.
            Err(e) if e.is_server_error() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<NodeId> {
        self.roots().await?;
        let handle = self.page.evaluate_handle(&create_overlay_script(spec)).await?;
        let object_id = handle
            .object_id
            .ok_or_else(|| CdpError::InvalidResponse("overlay handle has no objectId".to_string()))?;
        let id = self.page.request_node(&object_id).await;
        if let Err(e) = self.page.release_object(&object_id).await {
            trace!(error = %e, "failed to release overlay handle");
        }
        Ok(node_id(id?))
    }

    async fn set_text(&self, node: NodeId, text: &str) -> Result<()> {
        self.call_on(node, "function(t) { this.textContent = t; }", vec![json!(text)])
            .await?;
        Ok(())
    }

    async fn apply_style(&self, node: NodeId, style: &StyleMap) -> Result<()> {
        self.call_on(
            node,
            "function(decls) { for (const [k, v] of Object.entries(decls)) this.style.setProperty(k, v); }",
            vec![serde_json::to_value(style).map_err(CdpError::from)?],
        )
        .await?;
        Ok(())
    }

    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        Ok(self.page.set_attribute_value(cdp_id(node), name, value).await?)
    }

    async fn remove_attribute(&self, node: NodeId, name: &str) -> Result<()> {
        Ok(self.page.remove_attribute(cdp_id(node), name).await?)
    }

    async fn has_attribute(&self, node: NodeId, name: &str) -> Result<bool> {
        let flat = match self.page.get_attributes(cdp_id(node)).await {
            Ok(flat) => flat,
            Err(e) if e.is_server_error() => return Err(MarkError::NodeNotFound(node)),
            Err(e) => return Err(e.into()),
        };
        Ok(attribute_pairs(&flat).any(|(n, _)| n.eq_ignore_ascii_case(name)))
    }

    async fn remove_node(&self, node: NodeId) -> Result<()> {
        match self.page.remove_node(cdp_id(node)).await {
            Ok(()) => Ok(()),
            // Already gone.
            Err(e) if e.is_server_error() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn layout_events(&self) -> broadcast::Receiver<LayoutEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
