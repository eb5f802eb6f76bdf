//! CDP error types.

use thiserror::Error;
use webmarker_core::MarkError;

/// CDP message emitted when `DOM.querySelectorAll` rejects a selector.
const INVALID_SELECTOR_MESSAGE: &str = "DOM Error while querying";

/// CDP error code for server-side failures (missing node, no box model, ...).
pub(crate) const SERVER_ERROR: i64 = -32000;

/// Errors raised while talking to the browser.
#[derive(Debug, Error)]
pub enum CdpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// An `error` member in a CDP response.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Target discovery over `/json/*` failed.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// A node id could not be resolved to a live element.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A page script threw.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// The socket closed while a request was in flight.
    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CdpError {
    /// Whether this is the generic server error CDP returns for stale or
    /// layout-less nodes.
    pub fn is_server_error(&self) -> bool {
        matches!(self, CdpError::Protocol { code, .. } if *code == SERVER_ERROR)
    }

    /// Whether CDP rejected a selector as syntactically invalid.
    pub fn is_invalid_selector(&self) -> bool {
        matches!(self, CdpError::Protocol { message, .. } if message.contains(INVALID_SELECTOR_MESSAGE))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for MarkError {
    fn from(e: CdpError) -> Self {
        MarkError::Backend(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selector_detection() {
        let err = CdpError::Protocol {
            code: SERVER_ERROR,
            message: "DOM Error while querying".to_string(),
        };
        assert!(err.is_invalid_selector());
        assert!(err.is_server_error());

        let err = CdpError::Protocol {
            code: SERVER_ERROR,
            message: "Could not compute box model.".to_string(),
        };
        assert!(!err.is_invalid_selector());
    }

    #[test]
    fn test_converts_to_backend_error() {
        let err: MarkError = CdpError::SessionClosed.into();
        assert!(matches!(err, MarkError::Backend(ref m) if m == "Session closed"));
    }
}
