//! # WebMarker Core
//!
//! Overlay engine that marks the interactive elements of a page with
//! short labels and bounding boxes, so a vision model can refer to an
//! element by its label.
//!
//! ```text
//! Marker::mark(options)
//!   ├─ select     query_selector_all(container, selector) [+ viewport filter]
//!   ├─ label      LabelGenerator -> unique labels
//!   ├─ overlay    label (+ mask) nodes appended to <body>
//!   ├─ position   compute_position(anchor, label, placement)
//!   └─ track      LayoutEvent stream -> reposition until unmark
//! ```
//!
//! The engine talks to the page through the [`Document`] trait. This crate
//! ships [`StaticDocument`], an in-memory page; `webmarker-cdp` drives a
//! real browser.

mod document;
mod error;
mod geometry;
mod label;
mod marker;
mod options;
mod placement;
mod positioner;
mod selector;
mod session;
mod static_doc;
mod style;

pub use document::{Document, ElementInfo, LayoutEvent, NodeId, OverlaySpec};
pub use error::{MarkError, Result};
pub use geometry::{Rect, Size, Viewport};
pub use label::{
    Assignment, DuplicateLabelPolicy, LabelFn, LabelGenerator, alphabetic_label, assign_labels,
};
pub use marker::Marker;
pub use options::{
    DEFAULT_ID_PREFIX, DEFAULT_LABEL_ATTRIBUTE, DEFAULT_LABEL_CLASS, DEFAULT_MASK_CLASS,
    DEFAULT_ROOT_ATTRIBUTE, DEFAULT_SELECTOR, MarkOptions, label_style_with, mask_style_with,
};
pub use placement::{Alignment, Placement, Side, compute_position};
pub use selector::{SelectorElement, SelectorList, SelectorParseError};
pub use session::{MarkSession, MarkedElement, MarkedElements};
pub use static_doc::{ElementSpec, StaticDocument};
pub use style::{StyleFn, StyleMap, StyleSpec, default_label_style, default_mask_style};
