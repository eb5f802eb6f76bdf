use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 7,
        method: "DOM.querySelectorAll".to_string(),
        params: Some(serde_json::json!({"nodeId": 1, "selector": "button"})),
        session_id: Some("S1".to_string()),
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("DOM.querySelectorAll"));
    assert!(json.contains("\"sessionId\":\"S1\""));
}

#[test]
fn test_cdp_request_omits_empty_fields() {
    let req = CdpRequest {
        id: 1,
        method: "DOM.enable".to_string(),
        params: None,
        session_id: None,
    };
    let json = serde_json::to_string(&req).unwrap();
    assert_eq!(json, r#"{"id":1,"method":"DOM.enable"}"#);
}

#[test]
fn test_cdp_response_deserialize() {
    let json = r#"{"id": 1, "result": {"nodeIds": [5, 9]}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, Some(1));
    assert!(resp.result.is_some());
}

#[test]
fn test_binding_event_deserialize() {
    let json = r#"{
        "method": "Runtime.bindingCalled",
        "params": {"name": "__webmarkerLayout", "payload": "scroll", "executionContextId": 3},
        "sessionId": "S1"
    }"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.method.as_deref(), Some("Runtime.bindingCalled"));
    let event: BindingCalled = serde_json::from_value(resp.params.unwrap()).unwrap();
    assert_eq!(event.name, "__webmarkerLayout");
    assert_eq!(event.payload, "scroll");
}

#[test]
fn test_page_info_deserialize() {
    let json = r#"{
        "id": "page123",
        "type": "page",
        "title": "Test",
        "url": "https://example.com",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
    }"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.id, "page123");
    assert!(info.is_page());
}

#[test]
fn test_dom_node_tag_name() {
    let json = r#"{
        "nodeId": 12,
        "backendNodeId": 40,
        "nodeType": 1,
        "nodeName": "BUTTON",
        "localName": "button",
        "attributes": ["type", "submit", "class", "primary"]
    }"#;
    let node: DomNode = serde_json::from_str(json).unwrap();
    assert!(node.is_element());
    assert_eq!(node.tag_name(), "button");

    let attrs: Vec<_> = attribute_pairs(node.attributes.as_deref().unwrap()).collect();
    assert_eq!(attrs, vec![("type", "submit"), ("class", "primary")]);
}

#[test]
fn test_layout_metrics_prefers_css_viewport() {
    let json = r#"{
        "layoutViewport": {"pageX": 0, "pageY": 200, "clientWidth": 2560, "clientHeight": 1440},
        "cssLayoutViewport": {"pageX": 0, "pageY": 100, "clientWidth": 1280, "clientHeight": 720}
    }"#;
    let metrics: LayoutMetrics = serde_json::from_str(json).unwrap();
    assert_eq!(metrics.viewport().client_width, 1280.0);
    assert_eq!(metrics.viewport().page_y, 100.0);
}

#[test]
fn test_screenshot_format_serialize() {
    let json = serde_json::to_string(&ScreenshotFormat::Png).unwrap();
    assert_eq!(json, "\"png\"");
}
