//! The overlay engine entry point: `mark`, `unmark`, `is_marked`.

use std::sync::Arc;

use parking_lot::RwLock;

use tracing::{debug, info, warn};

use crate::document::{Document, ElementInfo, NodeId, OverlaySpec};
use crate::error::{MarkError, Result};
use crate::label::assign_labels;
use crate::options::{MarkOptions, Naming};
use crate::positioner;
use crate::session::{MarkSession, MarkedElement, MarkedElements};
use crate::style::overlay_base_style;

/// Marks interactive elements of a [`Document`] with labels and bounding boxes.
///
/// Concurrent `mark` calls against the same document are not serialized here;
/// callers own that ordering. Calling `mark` twice without an `unmark` in
/// between leaves both sets of overlays in the page.
pub struct Marker {
    document: Arc<dyn Document>,
    /// Names of the most recent successful `mark`, or of `with_naming`.
    naming: RwLock<Naming>,
}

impl Marker {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            naming: RwLock::new(Naming::default()),
        }
    }

    /// Use the attribute and class names of `options` for [`Marker::is_marked`]
    /// and session-less [`Marker::unmark`] until the next successful `mark`.
    pub fn with_naming(mut self, options: &MarkOptions) -> Self {
        *self.naming.get_mut() = options.naming();
        self
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    /// Select, label and overlay the matching elements.
    pub async fn mark(&self, options: MarkOptions) -> Result<MarkSession> {
        let document = &self.document;

        let container = match options.container {
            Some(container) => container,
            None => document.body().await?,
        };
        if !document.is_connected(container).await? {
            return Err(MarkError::ContainerNotFound(container.to_string()));
        }

        let candidates = document
            .query_selector_all(container, &options.selector)
            .await
            .inspect_err(|e| {
                if matches!(e, MarkError::InvalidSelector { .. }) {
                    warn!(selector = %options.selector, error = %e, "rejected selector");
                }
            })?;

        let viewport = document.viewport().await?;
        let mut selected = Vec::with_capacity(candidates.len());
        for node in candidates {
            if options.viewport_only {
                let visible = document
                    .bounding_rect(node)
                    .await?
                    .is_some_and(|rect| rect.is_visible_in(&viewport));
                if !visible {
                    debug!(%node, "outside viewport, skipping");
                    continue;
                }
            }
            selected.push(document.describe(node).await?);
        }

        let assignments = assign_labels(selected, &options.label_generator, options.duplicate_labels)?;

        // Subscribe before the first placement so no layout change is missed.
        let events = document.layout_events();

        let mut elements = MarkedElements::default();
        for assignment in assignments {
            let created = self
                .create_overlays(&options, &assignment.label, assignment.index, &assignment.element)
                .await;
            let marked = match created {
                Ok(marked) => marked,
                Err(e) => {
                    warn!(error = %e, "mark failed, removing partial overlays");
                    if let Err(sweep_err) = self.sweep(&options.naming()).await {
                        warn!(error = %sweep_err, "cleanup after failed mark also failed");
                    }
                    return Err(e);
                }
            };
            if let Err(e) =
                positioner::place(&**document, &marked, options.label_placement, &viewport).await
            {
                warn!(label = %marked.label, error = %e, "initial placement failed");
            }
            elements.insert(marked);
        }

        let root = document.document_element().await?;
        document
            .set_attribute(root, &options.root_attribute, "true")
            .await?;

        *self.naming.write() = options.naming();

        let mut session = MarkSession::new(document.clone(), &options, elements);
        session.start_tracking(events);

        info!(count = session.len(), selector = %options.selector, "marked elements");
        Ok(session)
    }

    async fn create_overlays(
        &self,
        options: &MarkOptions,
        label: &str,
        index: usize,
        element: &ElementInfo,
    ) -> Result<MarkedElement> {
        let document = &self.document;

        let label_node = document
            .create_overlay(&OverlaySpec {
                id: options.label_id(label),
                class_name: options.label_class.clone(),
                text: Some(label.to_string()),
            })
            .await?;
        let mut style = overlay_base_style();
        style.merge(&options.label_style.resolve(element, index));
        document.apply_style(label_node, &style).await?;

        let mask_node = if options.show_masks {
            let mask = document
                .create_overlay(&OverlaySpec {
                    id: options.mask_id(label),
                    class_name: options.mask_class.clone(),
                    text: None,
                })
                .await?;
            let mut style = overlay_base_style();
            style.merge(&options.mask_style.resolve(element, index));
            document.apply_style(mask, &style).await?;
            Some(mask)
        } else {
            None
        };

        document
            .set_attribute(element.node, &options.label_attribute, label)
            .await?;

        Ok(MarkedElement {
            label: label.to_string(),
            element: element.node,
            tag_name: element.tag_name.clone(),
            label_node,
            mask_node,
        })
    }

    /// Remove every overlay, stop tracking and clear marking attributes.
    ///
    /// Safe to call with no session and when nothing is marked.
    pub async fn unmark(&self, session: impl Into<Option<MarkSession>>) -> Result<()> {
        let naming = match session.into() {
            Some(session) => {
                let (naming, elements) = session.stop().await;
                self.remove_recorded(&naming, &elements).await;
                naming
            }
            None => self.naming.read().clone(),
        };
        self.sweep(&naming).await
    }

    /// Whether the document element carries the marking attribute.
    pub async fn is_marked(&self) -> Result<bool> {
        let root_attribute = self.naming.read().root_attribute.clone();
        let root = self.document.document_element().await?;
        self.document.has_attribute(root, &root_attribute).await
    }

    /// Unmark if needed, then mark again with `options`.
    pub async fn refresh(
        &self,
        session: impl Into<Option<MarkSession>>,
        options: MarkOptions,
    ) -> Result<MarkSession> {
        match session.into() {
            Some(session) => self.unmark(session).await?,
            None if self.is_marked().await? => self.unmark(None).await?,
            None => {}
        }
        self.mark(options).await
    }

    /// Remove a session's own overlays and label attributes by handle. Nodes a
    /// page script already removed are skipped.
    async fn remove_recorded(&self, naming: &Naming, elements: &[MarkedElement]) {
        let document = &self.document;
        for marked in elements {
            let nodes = std::iter::once(marked.label_node).chain(marked.mask_node);
            for node in nodes {
                if let Err(e) = document.remove_node(node).await {
                    debug!(label = %marked.label, error = %e, "overlay already gone");
                }
            }
            if let Err(e) = document
                .remove_attribute(marked.element, &naming.label_attribute)
                .await
            {
                debug!(label = %marked.label, error = %e, "anchor already gone");
            }
        }
    }

    async fn sweep(&self, naming: &Naming) -> Result<()> {
        let document = &self.document;
        let root = document.document_element().await?;

        let overlays = document
            .query_selector_all(root, &naming.overlay_selector())
            .await?;
        let overlay_count = overlays.len();
        for node in overlays {
            document.remove_node(node).await?;
        }

        let tagged: Vec<NodeId> = document
            .query_selector_all(root, &naming.tagged_selector())
            .await?;
        for node in &tagged {
            document
                .remove_attribute(*node, &naming.label_attribute)
                .await?;
        }

        document
            .remove_attribute(root, &naming.root_attribute)
            .await?;

        info!(overlays = overlay_count, tagged = tagged.len(), "unmarked page");
        Ok(())
    }
}

#[cfg(test)]
#[path = "marker_tests.rs"]
mod tests;
