//! Core session struct and CDP command dispatch.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::Transport;
use crate::error::CdpError;
use crate::protocol::{CdpResponse, LayoutMetrics, ScreenshotFormat};

/// A session attached to a single page/target.
pub struct PageSession {
    /// Target ID.
    pub(super) target_id: String,
    /// Session ID for this target.
    pub(super) session_id: String,
    /// Socket shared with the client.
    pub(super) transport: Arc<Transport>,
    /// Events for this session, until someone takes them.
    pub(super) events: Mutex<Option<mpsc::UnboundedReceiver<CdpResponse>>>,
}

impl PageSession {
    /// Create a new page session.
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Arc<Transport>,
        event_rx: mpsc::UnboundedReceiver<CdpResponse>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            transport,
            events: Mutex::new(Some(event_rx)),
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Get session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Take the event stream of this session. Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<CdpResponse>> {
        self.events.lock().take()
    }

    /// Enable required CDP domains.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Current URL of the page.
    pub async fn url(&self) -> Result<String, CdpError> {
        let value = self.evaluate("location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Viewport size and scroll offsets in CSS pixels.
    pub async fn layout_metrics(&self) -> Result<LayoutMetrics, CdpError> {
        let result = self.call("Page.getLayoutMetrics", None).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Take a screenshot and return the base64 payload.
    pub async fn screenshot(
        &self,
        format: ScreenshotFormat,
        quality: Option<u8>,
        full_page: bool,
    ) -> Result<String, CdpError> {
        let mut params = json!({
            "format": format,
            "captureBeyondViewport": full_page,
        });

        if let Some(q) = quality {
            params["quality"] = json!(q);
        }

        let result = self.call("Page.captureScreenshot", Some(params)).await?;

        result["data"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CdpError::InvalidResponse("Missing screenshot data".to_string()))
    }

    /// Capture the visible viewport as PNG bytes.
    pub async fn screenshot_png(&self) -> Result<Vec<u8>, CdpError> {
        let data = self.screenshot(ScreenshotFormat::Png, None, false).await?;
        decode_screenshot(&data)
    }
}

pub(super) fn decode_screenshot(data: &str) -> Result<Vec<u8>, CdpError> {
    STANDARD
        .decode(data)
        .map_err(|e| CdpError::InvalidResponse(format!("Screenshot is not base64: {}", e)))
}
