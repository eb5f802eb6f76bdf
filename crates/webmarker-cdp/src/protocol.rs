//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP response or event message.
#[derive(Debug, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Error member of a failed response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
}

/// One debuggable target as listed by `/json/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// Target id, accepted by `Target.attachToTarget`.
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl PageInfo {
    /// Whether the target is a regular tab (not a worker or extension page).
    pub fn is_page(&self) -> bool {
        self.page_type == "page"
    }
}

/// The parts of `/json/version` needed to open the browser socket.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

// -- DOM --

/// `DOM.Node`, reduced to what element discovery reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomNode {
    pub node_id: i64,
    pub node_type: i64,
    pub node_name: String,
    pub local_name: Option<String>,
    pub children: Option<Vec<DomNode>>,
    /// Flat `[name, value, name, value, ...]` list.
    pub attributes: Option<Vec<String>>,
}

impl DomNode {
    /// `nodeType` of element nodes.
    pub const ELEMENT_NODE: i64 = 1;

    pub fn is_element(&self) -> bool {
        self.node_type == Self::ELEMENT_NODE
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.local_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.node_name.to_ascii_lowercase())
    }
}

/// Split CDP's flat attribute list into pairs.
pub fn attribute_pairs(flat: &[String]) -> impl Iterator<Item = (&str, &str)> {
    flat.chunks_exact(2).map(|pair| (pair[0].as_str(), pair[1].as_str()))
}

/// `DOM.BoxModel`. Quads are `[x1, y1, x2, y2, x3, y3, x4, y4]` in viewport coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct BoxModel {
    pub content: Vec<f64>,
    pub border: Vec<f64>,
}

// -- Page --

/// Result of `Page.getLayoutMetrics`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    /// CSS-pixel layout viewport (Chrome 92+).
    pub css_layout_viewport: Option<LayoutViewport>,
    /// Device-pixel layout viewport.
    pub layout_viewport: LayoutViewport,
}

impl LayoutMetrics {
    /// The CSS-pixel viewport, falling back to the legacy field.
    pub fn viewport(&self) -> &LayoutViewport {
        self.css_layout_viewport.as_ref().unwrap_or(&self.layout_viewport)
    }
}

/// Layout viewport geometry.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutViewport {
    pub page_x: f64,
    pub page_y: f64,
    pub client_width: f64,
    pub client_height: f64,
}

// -- Runtime --

/// `Runtime.RemoteObject`; `object_id` is set for non-primitive results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub subtype: Option<String>,
    pub object_id: Option<String>,
}

/// Parameters of the `Runtime.bindingCalled` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingCalled {
    pub name: String,
    pub payload: String,
}

/// Image encoding for `Page.captureScreenshot`; `quality` only applies to JPEG.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    Png,
    Jpeg,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
