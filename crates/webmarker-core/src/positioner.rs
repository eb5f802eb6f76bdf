//! Overlay placement against anchor elements.

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::Result;
use crate::geometry::Viewport;
use crate::placement::{Placement, compute_position};
use crate::session::MarkedElement;
use crate::style::{StyleMap, px};

/// Place the label and mask of one element.
///
/// Returns `false` without touching the overlays when the anchor is detached
/// or has no layout box.
pub(crate) async fn place(
    document: &dyn Document,
    marked: &MarkedElement,
    placement: Placement,
    viewport: &Viewport,
) -> Result<bool> {
    let Some(anchor) = document.bounding_rect(marked.element).await? else {
        debug!(label = %marked.label, "anchor has no layout box, skipping");
        return Ok(false);
    };
    let anchor = viewport.to_document(anchor);

    let label_size = document
        .bounding_rect(marked.label_node)
        .await?
        .map(|r| r.size())
        .unwrap_or_default();
    let (x, y) = compute_position(anchor, label_size, placement);
    document
        .apply_style(
            marked.label_node,
            &StyleMap::new().with("left", px(x)).with("top", px(y)),
        )
        .await?;

    if let Some(mask) = marked.mask_node {
        document
            .apply_style(
                mask,
                &StyleMap::new()
                    .with("left", px(anchor.x))
                    .with("top", px(anchor.y))
                    .with("width", px(anchor.width))
                    .with("height", px(anchor.height)),
            )
            .await?;
    }

    debug!(label = %marked.label, x, y, "placed label");
    Ok(true)
}

/// Re-place every tracked element. Per-element failures are logged and skipped.
///
/// Returns how many elements were placed.
pub(crate) async fn reposition_all(
    document: &dyn Document,
    elements: &[MarkedElement],
    placement: Placement,
) -> Result<usize> {
    let viewport = document.viewport().await?;
    let mut placed = 0;
    for marked in elements {
        match place(document, marked, placement, &viewport).await {
            Ok(true) => placed += 1,
            Ok(false) => {}
            Err(e) => warn!(label = %marked.label, error = %e, "failed to reposition overlay"),
        }
    }
    Ok(placed)
}
