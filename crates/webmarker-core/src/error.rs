//! Overlay engine errors.

use thiserror::Error;

use crate::document::NodeId;

/// Errors surfaced by `mark`, `unmark` and the `Document` hosts.
#[derive(Debug, Error)]
pub enum MarkError {
    /// The selector could not be parsed by the host.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The container element is absent or detached from the document.
    #[error("Container element not found: {0}")]
    ContainerNotFound(String),

    /// A label generator produced the same label twice in one pass.
    #[error("Duplicate label generated: {0}")]
    DuplicateLabel(String),

    /// No marked element carries this label.
    #[error("Label not found: {0}")]
    LabelNotFound(String),

    /// The host does not know this node.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The document host failed (transport, protocol, script error).
    #[error("Document backend error: {0}")]
    Backend(String),
}

impl MarkError {
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        MarkError::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, MarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selector_display() {
        let err = MarkError::invalid_selector("button[", "unterminated attribute selector");
        let display = err.to_string();
        assert!(display.contains("button["));
        assert!(display.contains("unterminated"));
    }

    #[test]
    fn test_duplicate_label_display() {
        let err = MarkError::DuplicateLabel("7".to_string());
        assert!(err.to_string().contains("Duplicate"));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_node_not_found_display() {
        let err = MarkError::NodeNotFound(NodeId::new(42));
        assert!(err.to_string().contains("42"));
    }
}
