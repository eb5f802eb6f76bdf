//! Marking sessions: the label mapping and its position tracker.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::document::{Document, LayoutEvent, NodeId};
use crate::error::{MarkError, Result};
use crate::label::{DuplicateLabelPolicy, LabelGenerator, assign_labels};
use crate::options::{MarkOptions, Naming, label_node_id, mask_node_id};
use crate::placement::Placement;
use crate::positioner;

/// An anchor element and the overlay nodes created for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkedElement {
    pub label: String,
    /// The anchor element.
    pub element: NodeId,
    /// Tag name of the anchor (lowercase).
    pub tag_name: String,
    /// The label overlay.
    pub label_node: NodeId,
    /// The bounding-box overlay, when masks are shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_node: Option<NodeId>,
}

/// Label -> [`MarkedElement`] mapping in discovery order.
#[derive(Debug, Clone, Default)]
pub struct MarkedElements {
    entries: Vec<MarkedElement>,
    index: HashMap<String, usize>,
}

impl MarkedElements {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&MarkedElement> {
        self.index.get(label).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MarkedElement> {
        self.entries.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Find the entry for an anchor element.
    pub fn by_element(&self, element: NodeId) -> Option<&MarkedElement> {
        self.entries.iter().find(|e| e.element == element)
    }

    pub(crate) fn insert(&mut self, marked: MarkedElement) {
        if let Some(&i) = self.index.get(&marked.label) {
            self.entries[i] = marked;
        } else {
            self.index.insert(marked.label.clone(), self.entries.len());
            self.entries.push(marked);
        }
    }

    pub(crate) fn remove(&mut self, label: &str) -> Option<MarkedElement> {
        let i = self.index.remove(label)?;
        let removed = self.entries.remove(i);
        self.reindex();
        Some(removed)
    }

    pub(crate) fn to_vec(&self) -> Vec<MarkedElement> {
        self.entries.clone()
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.label.clone(), i))
            .collect();
    }
}

impl<'a> IntoIterator for &'a MarkedElements {
    type Item = &'a MarkedElement;
    type IntoIter = std::slice::Iter<'a, MarkedElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<MarkedElement> for MarkedElements {
    fn from_iter<I: IntoIterator<Item = MarkedElement>>(iter: I) -> Self {
        let mut out = MarkedElements::default();
        for marked in iter {
            out.insert(marked);
        }
        out
    }
}

impl Serialize for MarkedElements {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.label, entry)?;
        }
        map.end()
    }
}

/// Background task repositioning overlays on layout events.
struct Tracker {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Tracker {
    fn spawn(
        document: Arc<dyn Document>,
        tracked: Arc<RwLock<Vec<MarkedElement>>>,
        placement: Placement,
        mut events: broadcast::Receiver<LayoutEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => {
                        match event {
                            Ok(event) => trace!(?event, "repositioning overlays"),
                            Err(RecvError::Lagged(skipped)) => {
                                debug!(skipped, "layout events lagged, repositioning once");
                            }
                            Err(RecvError::Closed) => break,
                        }
                        let snapshot = tracked.read().clone();
                        if let Err(e) = positioner::reposition_all(&*document, &snapshot, placement).await {
                            warn!(error = %e, "overlay tracking pass failed");
                        }
                    }
                }
            }
            debug!("overlay tracker stopped");
        });
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Handle for one `mark` invocation.
///
/// Owns the label mapping and the tracker keeping overlays attached to their
/// anchors. Pass it back to [`crate::Marker::unmark`] to tear everything down;
/// dropping it only stops tracking and leaves the overlays in the page.
pub struct MarkSession {
    document: Arc<dyn Document>,
    elements: MarkedElements,
    tracked: Arc<RwLock<Vec<MarkedElement>>>,
    placement: Placement,
    naming: Naming,
    id_prefix: String,
    duplicate_labels: DuplicateLabelPolicy,
    tracker: Option<Tracker>,
}

impl std::fmt::Debug for MarkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkSession")
            .field("elements", &self.elements)
            .field("placement", &self.placement)
            .field("tracking", &self.is_tracking())
            .finish()
    }
}

impl MarkSession {
    pub(crate) fn new(document: Arc<dyn Document>, options: &MarkOptions, elements: MarkedElements) -> Self {
        let tracked = Arc::new(RwLock::new(elements.to_vec()));
        Self {
            document,
            elements,
            tracked,
            placement: options.label_placement,
            naming: options.naming(),
            id_prefix: options.id_prefix.clone(),
            duplicate_labels: options.duplicate_labels,
            tracker: None,
        }
    }

    pub(crate) fn start_tracking(&mut self, events: broadcast::Receiver<LayoutEvent>) {
        self.tracker = Some(Tracker::spawn(
            self.document.clone(),
            self.tracked.clone(),
            self.placement,
            events,
        ));
    }

    /// Stop tracking and hand back the names needed to sweep the page.
    /// Stop tracking and hand back what teardown needs: the session's names
    /// and the overlays it currently owns.
    pub(crate) async fn stop(mut self) -> (Naming, Vec<MarkedElement>) {
        if let Some(tracker) = self.tracker.take() {
            tracker.stop().await;
        }
        (self.naming.clone(), self.elements.to_vec())
    }

    /// The label mapping.
    pub fn elements(&self) -> &MarkedElements {
        &self.elements
    }

    pub fn get(&self, label: &str) -> Option<&MarkedElement> {
        self.elements.get(label)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker
            .as_ref()
            .and_then(|t| t.handle.as_ref())
            .is_some_and(|h| !h.is_finished())
    }

    /// Run one placement pass now, as the tracker does on each layout event.
    pub async fn reposition(&self) -> Result<usize> {
        let snapshot = self.tracked.read().clone();
        positioner::reposition_all(&*self.document, &snapshot, self.placement).await
    }

    /// Remove a single element's overlays and label attribute and stop tracking it.
    pub async fn remove_label(&mut self, label: &str) -> Result<()> {
        let marked = self
            .elements
            .remove(label)
            .ok_or_else(|| MarkError::LabelNotFound(label.to_string()))?;
        self.tracked.write().retain(|m| m.label != label);

        self.document.remove_node(marked.label_node).await?;
        if let Some(mask) = marked.mask_node {
            self.document.remove_node(mask).await?;
        }
        self.document
            .remove_attribute(marked.element, &self.naming.label_attribute)
            .await?;
        debug!(label, "removed label");
        Ok(())
    }

    /// Regenerate labels for the marked elements in discovery order.
    ///
    /// Overlay text, overlay ids and element attributes are updated in place.
    /// Elements that lose their label under last-write-wins are unmarked.
    pub async fn relabel(&mut self, generator: LabelGenerator) -> Result<()> {
        let current = self.elements.to_vec();
        let mut infos = Vec::with_capacity(current.len());
        for marked in &current {
            infos.push(self.document.describe(marked.element).await?);
        }
        let assignments = assign_labels(infos, &generator, self.duplicate_labels)?;

        let mut kept = vec![false; current.len()];
        let mut next = MarkedElements::default();
        for assignment in assignments {
            kept[assignment.index] = true;
            let mut marked = current[assignment.index].clone();
            let label = assignment.label;

            self.document.set_text(marked.label_node, &label).await?;
            self.document
                .set_attribute(marked.label_node, "id", &label_node_id(&self.id_prefix, &label))
                .await?;
            if let Some(mask) = marked.mask_node {
                self.document
                    .set_attribute(mask, "id", &mask_node_id(&self.id_prefix, &label))
                    .await?;
            }
            self.document
                .set_attribute(marked.element, &self.naming.label_attribute, &label)
                .await?;

            marked.label = label;
            next.insert(marked);
        }

        for (marked, kept) in current.iter().zip(kept) {
            if kept {
                continue;
            }
            self.document.remove_node(marked.label_node).await?;
            if let Some(mask) = marked.mask_node {
                self.document.remove_node(mask).await?;
            }
            self.document
                .remove_attribute(marked.element, &self.naming.label_attribute)
                .await?;
        }

        *self.tracked.write() = next.to_vec();
        self.elements = next;

        // Label text changed, so label sizes may have too.
        self.reposition().await?;
        Ok(())
    }
}
