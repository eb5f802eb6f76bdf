//! Live-browser host for WebMarker.
//!
//! Drives a Chrome/Chromium tab over the Chrome DevTools Protocol (CDP) and
//! exposes it to the overlay engine as a [`webmarker_core::Document`].
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │  CdpDocument    │ ◄──────────────► │   Chrome/Edge    │
//! │  (this crate)   │       CDP        │  (user's browser)│
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! ## Setup
//!
//! Start Chrome with remote debugging enabled:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let page = client.attach(None).await?;
//! let marker = Marker::new(Arc::new(CdpDocument::new(page).await?));
//! let session = marker.mark(MarkOptions::default()).await?;
//! ```

mod client;
mod document;
mod error;
mod protocol;
mod session;

pub use client::{CdpClient, DEFAULT_REQUEST_TIMEOUT};
pub use document::{CdpDocument, LAYOUT_BINDING};
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
