//! Live-browser tests for the CDP host.
//!
//! These tests require Chrome running with remote debugging on port 9222.
//! Run with: cargo test -p webmarker-cdp --test live_browser -- --ignored --nocapture

use std::sync::Arc;
use std::time::Duration;

use webmarker_cdp::{CdpClient, CdpDocument};
use webmarker_core::{Document, MarkError, MarkOptions, Marker};

const ENDPOINT: &str = "http://localhost:9222";

const FIXTURE: &str = r#"
document.body.innerHTML = `
  <form style="margin: 40px">
    <input name="user" style="display:block;width:200px">
    <button type="submit">Sign in</button>
    <button type="reset">Reset</button>
  </form>
  <a href="/help">Help</a>
  <div style="height: 4000px"></div>
  <a href="/legal">Legal</a>`;
"#;

async fn fixture_page(client: &CdpClient) -> Arc<CdpDocument> {
    let page = client.new_page(None).await.expect("new page");
    page.evaluate(FIXTURE).await.expect("fixture");
    Arc::new(CdpDocument::new(page).await.expect("document"))
}

#[tokio::test]
#[ignore = "needs Chrome with --remote-debugging-port=9222"]
async fn test_mark_and_unmark_live_page() {
    let client = CdpClient::connect(ENDPOINT).await.expect("connect");
    let doc = fixture_page(&client).await;
    let marker = Marker::new(doc.clone());

    let session = marker.mark(MarkOptions::default()).await.unwrap();
    println!("marked: {}", serde_json::to_string_pretty(session.elements()).unwrap());
    assert_eq!(session.len(), 5);
    assert!(marker.is_marked().await.unwrap());

    let root = doc.document_element().await.unwrap();
    let overlays = doc.query_selector_all(root, ".webmarker").await.unwrap();
    assert_eq!(overlays.len(), 5);

    marker.unmark(session).await.unwrap();
    let overlays = doc
        .query_selector_all(root, ".webmarker, .webmarkermask")
        .await
        .unwrap();
    assert!(overlays.is_empty());
    assert!(!marker.is_marked().await.unwrap());
}

#[tokio::test]
#[ignore = "needs Chrome with --remote-debugging-port=9222"]
async fn test_viewport_only_on_live_page() {
    let client = CdpClient::connect(ENDPOINT).await.expect("connect");
    let doc = fixture_page(&client).await;
    let marker = Marker::new(doc);

    let session = marker
        .mark(MarkOptions::default().with_viewport_only(true))
        .await
        .unwrap();
    assert_eq!(session.len(), 4);
    marker.unmark(session).await.unwrap();
}

#[tokio::test]
#[ignore = "needs Chrome with --remote-debugging-port=9222"]
async fn test_scroll_reaches_tracker() {
    let client = CdpClient::connect(ENDPOINT).await.expect("connect");
    let doc = fixture_page(&client).await;
    let mut events = doc.layout_events();

    doc.page().evaluate("window.scrollTo(0, 500)").await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no layout event")
        .unwrap();
    println!("layout event: {:?}", event);
}

#[tokio::test]
#[ignore = "needs Chrome with --remote-debugging-port=9222"]
async fn test_invalid_selector_live() {
    let client = CdpClient::connect(ENDPOINT).await.expect("connect");
    let doc = fixture_page(&client).await;
    let marker = Marker::new(doc);

    let err = marker
        .mark(MarkOptions::default().with_selector("button[["))
        .await
        .unwrap_err();
    assert!(matches!(err, MarkError::InvalidSelector { .. }));
}
