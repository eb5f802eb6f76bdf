use std::time::Duration;

use super::*;
use crate::geometry::{Rect, Viewport};
use crate::label::{DuplicateLabelPolicy, LabelGenerator};
use crate::placement::Placement;
use crate::static_doc::{ElementSpec, StaticDocument};
use crate::style::{StyleMap, StyleSpec};

struct Page {
    doc: Arc<StaticDocument>,
    marker: Marker,
    buttons: Vec<NodeId>,
    input: NodeId,
    link: NodeId,
}

fn page() -> Page {
    let doc = Arc::new(StaticDocument::new(Viewport::new(800.0, 600.0)));
    let body = doc.body_id();
    let b1 = doc
        .append(body, ElementSpec::new("button").text("OK").rect(10.0, 20.0, 60.0, 24.0))
        .unwrap();
    let b2 = doc
        .append(body, ElementSpec::new("button").text("Cancel").rect(100.0, 20.0, 60.0, 24.0))
        .unwrap();
    let input = doc
        .append(body, ElementSpec::new("input").attr("type", "text").rect(10.0, 80.0, 200.0, 30.0))
        .unwrap();
    let link = doc
        .append(body, ElementSpec::new("a").attr("href", "/about").rect(10.0, 140.0, 50.0, 16.0))
        .unwrap();
    let marker = Marker::new(doc.clone());
    Page {
        doc,
        marker,
        buttons: vec![b1, b2],
        input,
        link,
    }
}

#[tokio::test]
async fn test_mark_labels_in_document_order() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();

    assert_eq!(session.len(), 4);
    assert_eq!(
        session.elements().labels().collect::<Vec<_>>(),
        vec!["0", "1", "2", "3"]
    );
    assert_eq!(session.get("0").unwrap().element, p.buttons[0]);
    assert_eq!(session.get("2").unwrap().element, p.input);
    assert_eq!(session.get("3").unwrap().element, p.link);
    assert_eq!(p.doc.count(".webmarker"), 4);
    assert_eq!(p.doc.count(".webmarkermask"), 4);
    assert_eq!(p.doc.attribute(p.link, "data-webmarkeredby").as_deref(), Some("3"));
    assert!(p.marker.is_marked().await.unwrap());
}

#[tokio::test]
async fn test_label_overlay_content_and_style() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let marked = session.get("1").unwrap();

    assert_eq!(p.doc.text(marked.label_node).as_deref(), Some("1"));
    assert_eq!(p.doc.attribute(marked.label_node, "id").as_deref(), Some("webmarker-1"));
    let mask = marked.mask_node.unwrap();
    assert_eq!(p.doc.attribute(mask, "id").as_deref(), Some("webmarker-mask-1"));

    let style = p.doc.style(marked.label_node).unwrap();
    assert_eq!(style.get("position"), Some("absolute"));
    assert_eq!(style.get("background-color"), Some("red"));
    assert_eq!(style.get("z-index"), Some("999999999"));
}

#[tokio::test]
async fn test_label_is_placed_above_anchor() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let marked = session.get("0").unwrap();

    // "0" measures 15x18 in the static document.
    let style = p.doc.style(marked.label_node).unwrap();
    assert_eq!(style.get("left"), Some("10px"));
    assert_eq!(style.get("top"), Some("2px"));

    let mask = p.doc.style(marked.mask_node.unwrap()).unwrap();
    assert_eq!(mask.get("left"), Some("10px"));
    assert_eq!(mask.get("top"), Some("20px"));
    assert_eq!(mask.get("width"), Some("60px"));
    assert_eq!(mask.get("height"), Some("24px"));
}

#[tokio::test]
async fn test_placement_option_is_honored() {
    let p = page();
    let session = p
        .marker
        .mark(MarkOptions::default().with_selector("input").with_placement(Placement::Bottom))
        .await
        .unwrap();
    let style = p.doc.style(session.get("0").unwrap().label_node).unwrap();
    // Input box (10, 80, 200, 30); label 15 wide centered below.
    assert_eq!(style.get("left"), Some("102.50px"));
    assert_eq!(style.get("top"), Some("110px"));
}

#[tokio::test]
async fn test_selector_restricts_marking() {
    let p = page();
    let session = p
        .marker
        .mark(MarkOptions::default().with_selector("button"))
        .await
        .unwrap();
    assert_eq!(session.len(), 2);
    assert_eq!(p.doc.count(".webmarker"), 2);
    assert!(p.doc.attribute(p.input, "data-webmarkeredby").is_none());
}

#[tokio::test]
async fn test_unmark_removes_everything_and_is_idempotent() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    p.marker.unmark(session).await.unwrap();

    assert_eq!(p.doc.count(".webmarker, .webmarkermask"), 0);
    assert_eq!(p.doc.count("[data-webmarkeredby]"), 0);
    assert!(!p.marker.is_marked().await.unwrap());

    p.marker.unmark(None).await.unwrap();
    assert!(!p.marker.is_marked().await.unwrap());
}

#[tokio::test]
async fn test_unmark_without_session_sweeps_page() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    drop(session);
    assert_eq!(p.doc.count(".webmarker"), 4);

    p.marker.unmark(None).await.unwrap();
    assert_eq!(p.doc.count(".webmarker, .webmarkermask"), 0);
    assert!(!p.marker.is_marked().await.unwrap());
}

#[tokio::test]
async fn test_custom_naming_is_swept() {
    let p = page();
    let options = MarkOptions::default()
        .with_classes("lbl", "box")
        .with_label_attribute("data-lbl")
        .with_root_attribute("data-marked");
    let marker = Marker::new(p.doc.clone()).with_naming(&options);
    let session = marker.mark(options).await.unwrap();
    assert_eq!(p.doc.count(".lbl"), 4);
    assert!(marker.is_marked().await.unwrap());
    // `p.marker` has not marked with these names yet, so it looks for the defaults.
    assert!(!p.marker.is_marked().await.unwrap());

    drop(session);
    marker.unmark(None).await.unwrap();
    assert_eq!(p.doc.count(".lbl, .box, [data-lbl]"), 0);
    assert!(!marker.is_marked().await.unwrap());
}

#[tokio::test]
async fn test_mark_adopts_custom_root_attribute() {
    let p = page();
    let options = MarkOptions::default().with_root_attribute("data-marked");
    let session = p.marker.mark(options).await.unwrap();

    assert_eq!(p.doc.attribute(p.doc.html(), "data-marked").as_deref(), Some("true"));
    assert!(p.marker.is_marked().await.unwrap());

    drop(session);
    p.marker.unmark(None).await.unwrap();
    assert!(!p.marker.is_marked().await.unwrap());
    assert_eq!(p.doc.attribute(p.doc.html(), "data-marked"), None);
}

#[tokio::test]
async fn test_refresh_without_session_uses_last_mark_names() {
    let p = page();
    let options = MarkOptions::default()
        .with_classes("lbl", "box")
        .with_root_attribute("data-marked");
    let first = p.marker.mark(options.clone()).await.unwrap();
    drop(first);

    let session = p.marker.refresh(None, options).await.unwrap();
    assert_eq!(session.len(), 4);
    assert_eq!(p.doc.count(".lbl"), 4);
    assert_eq!(p.doc.count(".box"), 4);
}

#[tokio::test]
async fn test_unmark_handles_names_that_need_escaping() {
    let p = page();
    let options = MarkOptions::default()
        .with_classes("1lbl", "1box")
        .with_label_attribute("9by");
    let session = p.marker.mark(options.clone()).await.unwrap();
    let marked = session.elements().to_vec();
    assert_eq!(p.doc.count(".\\31 lbl, .\\31 box"), 8);

    p.marker.unmark(session).await.unwrap();

    for m in &marked {
        assert!(!p.doc.connected(m.label_node));
        assert!(!p.doc.connected(m.mask_node.unwrap()));
        assert_eq!(p.doc.attribute(m.element, "9by"), None);
    }
    assert_eq!(p.doc.count(".\\31 lbl, .\\31 box, [\\39 by]"), 0);
    assert!(!p.marker.is_marked().await.unwrap());

    // A session-less unmark with the same names is clean too.
    let session = p.marker.mark(options).await.unwrap();
    drop(session);
    p.marker.unmark(None).await.unwrap();
    assert_eq!(p.doc.count(".\\31 lbl, .\\31 box, [\\39 by]"), 0);
}

#[tokio::test]
async fn test_unmark_session_tolerates_removed_overlays() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let gone = session.get("1").unwrap().clone();
    p.doc.detach(gone.label_node).unwrap();
    p.doc.detach(p.buttons[1]).unwrap();

    p.marker.unmark(session).await.unwrap();
    assert_eq!(p.doc.count(".webmarker, .webmarkermask, [data-webmarkeredby]"), 0);
    assert!(!p.marker.is_marked().await.unwrap());
}

#[tokio::test]
async fn test_masks_can_be_disabled() {
    let p = page();
    let session = p
        .marker
        .mark(MarkOptions::default().with_masks(false))
        .await
        .unwrap();
    assert_eq!(p.doc.count(".webmarkermask"), 0);
    assert!(session.elements().iter().all(|m| m.mask_node.is_none()));
}

#[tokio::test]
async fn test_viewport_only_skips_offscreen() {
    let p = page();
    let far = p
        .doc
        .append(p.doc.body_id(), ElementSpec::new("button").rect(10.0, 2000.0, 60.0, 24.0))
        .unwrap();

    let session = p
        .marker
        .mark(MarkOptions::default().with_viewport_only(true))
        .await
        .unwrap();
    assert_eq!(session.len(), 4);
    assert!(session.elements().by_element(far).is_none());
}

#[tokio::test]
async fn test_viewport_only_uses_scroll_position() {
    let p = page();
    let far = p
        .doc
        .append(p.doc.body_id(), ElementSpec::new("button").rect(10.0, 2000.0, 60.0, 24.0))
        .unwrap();
    p.doc.scroll_to(0.0, 1800.0);

    let session = p
        .marker
        .mark(MarkOptions::default().with_viewport_only(true))
        .await
        .unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session.get("0").unwrap().element, far);
}

#[tokio::test]
async fn test_empty_selection_still_marks_root() {
    let p = page();
    let session = p
        .marker
        .mark(MarkOptions::default().with_selector("textarea"))
        .await
        .unwrap();
    assert!(session.is_empty());
    assert!(p.marker.is_marked().await.unwrap());
}

#[tokio::test]
async fn test_invalid_selector_fails_without_side_effects() {
    let p = page();
    let err = p
        .marker
        .mark(MarkOptions::default().with_selector("button:hover"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarkError::InvalidSelector { .. }));
    assert_eq!(p.doc.count(".webmarker"), 0);
    assert!(!p.marker.is_marked().await.unwrap());
}

#[tokio::test]
async fn test_duplicate_labels_rejected_before_overlays() {
    let p = page();
    let options = MarkOptions::default()
        .with_label_generator(LabelGenerator::custom(|el, _| el.tag_name.clone()));
    let err = p.marker.mark(options).await.unwrap_err();
    assert!(matches!(err, MarkError::DuplicateLabel(ref l) if l == "button"));
    assert_eq!(p.doc.count(".webmarker"), 0);
}

#[tokio::test]
async fn test_duplicate_labels_last_write_wins() {
    let p = page();
    let options = MarkOptions::default()
        .with_label_generator(LabelGenerator::custom(|el, _| el.tag_name.clone()))
        .with_duplicate_labels(DuplicateLabelPolicy::LastWriteWins);
    let session = p.marker.mark(options).await.unwrap();

    assert_eq!(session.len(), 3);
    assert_eq!(session.get("button").unwrap().element, p.buttons[1]);
    assert!(p.doc.attribute(p.buttons[0], "data-webmarkeredby").is_none());
    assert_eq!(p.doc.count(".webmarker"), 3);
}

#[tokio::test]
async fn test_container_scopes_selection() {
    let p = page();
    let form = p
        .doc
        .append(p.doc.body_id(), ElementSpec::new("form").rect(0.0, 300.0, 400.0, 100.0))
        .unwrap();
    let inner = p
        .doc
        .append(form, ElementSpec::new("button").rect(10.0, 310.0, 60.0, 24.0))
        .unwrap();

    let session = p
        .marker
        .mark(MarkOptions::default().with_container(form))
        .await
        .unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session.get("0").unwrap().element, inner);
}

#[tokio::test]
async fn test_detached_container_is_error() {
    let p = page();
    let form = p
        .doc
        .append(p.doc.body_id(), ElementSpec::new("form"))
        .unwrap();
    p.doc.detach(form).unwrap();
    let err = p
        .marker
        .mark(MarkOptions::default().with_container(form))
        .await
        .unwrap_err();
    assert!(matches!(err, MarkError::ContainerNotFound(_)));
}

#[tokio::test]
async fn test_computed_styles_use_index() {
    let p = page();
    let options = MarkOptions::default().with_label_style(StyleSpec::computed(|el, i| {
        let color = if el.tag_name == "a" { "black" } else if i % 2 == 0 { "blue" } else { "green" };
        StyleMap::new().with("background-color", color)
    }));
    let session = p.marker.mark(options).await.unwrap();

    let first = p.doc.style(session.get("0").unwrap().label_node).unwrap();
    let second = p.doc.style(session.get("1").unwrap().label_node).unwrap();
    assert_eq!(first.get("background-color"), Some("blue"));
    assert_eq!(second.get("background-color"), Some("green"));
    let link = p.doc.style(session.get("3").unwrap().label_node).unwrap();
    assert_eq!(link.get("background-color"), Some("black"));
    assert_eq!(first.get("position"), Some("absolute"));
    // Custom style replaces the default look entirely.
    assert_eq!(first.get("font-weight"), None);
}

#[tokio::test]
async fn test_mark_twice_with_unmark_does_not_accumulate() {
    let p = page();
    for _ in 0..3 {
        let session = p.marker.mark(MarkOptions::default()).await.unwrap();
        assert_eq!(p.doc.count(".webmarker"), session.len());
        p.marker.unmark(session).await.unwrap();
    }
    assert_eq!(p.doc.count(".webmarker"), 0);
}

#[tokio::test]
async fn test_refresh_replaces_overlays() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let session = p
        .marker
        .refresh(session, MarkOptions::default().with_selector("a"))
        .await
        .unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(p.doc.count(".webmarker"), 1);
    assert!(p.doc.attribute(p.buttons[0], "data-webmarkeredby").is_none());

    let session = p.marker.refresh(None, MarkOptions::default()).await.unwrap();
    assert_eq!(session.len(), 4);
    assert_eq!(p.doc.count(".webmarker"), 4);
}

#[tokio::test]
async fn test_remove_label() {
    let p = page();
    let mut session = p.marker.mark(MarkOptions::default()).await.unwrap();
    session.remove_label("1").await.unwrap();

    assert_eq!(session.len(), 3);
    assert!(session.get("1").is_none());
    assert!(p.doc.attribute(p.buttons[1], "data-webmarkeredby").is_none());
    assert_eq!(p.doc.count(".webmarker"), 3);
    assert_eq!(p.doc.count("#webmarker-1, #webmarker-mask-1"), 0);

    let err = session.remove_label("1").await.unwrap_err();
    assert!(matches!(err, MarkError::LabelNotFound(_)));
}

#[tokio::test]
async fn test_relabel_updates_overlays_in_place() {
    let p = page();
    let mut session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let label_node = session.get("2").unwrap().label_node;

    session.relabel(LabelGenerator::Alphabetic).await.unwrap();

    assert_eq!(
        session.elements().labels().collect::<Vec<_>>(),
        vec!["A", "B", "C", "D"]
    );
    assert_eq!(session.get("C").unwrap().label_node, label_node);
    assert_eq!(p.doc.text(label_node).as_deref(), Some("C"));
    assert_eq!(p.doc.attribute(label_node, "id").as_deref(), Some("webmarker-C"));
    let options = MarkOptions::default();
    let relabeled = session.get("C").unwrap();
    assert_eq!(p.doc.attribute(relabeled.label_node, "id"), Some(options.label_id("C")));
    assert_eq!(
        p.doc.attribute(relabeled.mask_node.unwrap(), "id"),
        Some(options.mask_id("C"))
    );
    assert_eq!(p.doc.attribute(p.input, "data-webmarkeredby").as_deref(), Some("C"));
    assert_eq!(p.doc.count(".webmarker"), 4);
}

#[tokio::test]
async fn test_detached_anchor_is_left_alone() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let marked = session.get("0").unwrap().clone();
    let before = p.doc.style(marked.label_node).unwrap();

    p.doc.detach(marked.element).unwrap();
    let placed = session.reposition().await.unwrap();

    assert_eq!(placed, 3);
    assert_eq!(p.doc.style(marked.label_node).unwrap(), before);
}

#[tokio::test]
async fn test_tracker_follows_reflow() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    assert!(session.is_tracking());
    let marked = session.get("0").unwrap().clone();

    p.doc
        .set_rect(marked.element, Rect::new(300.0, 400.0, 60.0, 24.0))
        .unwrap();

    let doc = p.doc.clone();
    let moved = tokio::time::timeout(Duration::from_secs(2), async move {
        loop {
            let style = doc.style(marked.label_node).unwrap();
            if style.get("top") == Some("382px") {
                return style;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("label did not follow its anchor");
    assert_eq!(moved.get("left"), Some("300px"));

    p.marker.unmark(session).await.unwrap();
}

#[tokio::test]
async fn test_overlays_stay_put_in_document_space_on_scroll() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let marked = session.get("0").unwrap().clone();

    p.doc.scroll_to(0.0, 50.0);
    session.reposition().await.unwrap();

    let style = p.doc.style(marked.label_node).unwrap();
    assert_eq!(style.get("top"), Some("2px"));
    p.marker.unmark(session).await.unwrap();
}

#[tokio::test]
async fn test_unmark_stops_tracking() {
    let p = page();
    let session = p.marker.mark(MarkOptions::default()).await.unwrap();
    let marked = session.get("0").unwrap().clone();
    p.marker.unmark(session).await.unwrap();

    p.doc
        .set_rect(marked.element, Rect::new(300.0, 400.0, 60.0, 24.0))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let style = p.doc.style(marked.label_node).unwrap();
    assert_eq!(style.get("top"), Some("2px"));
}
