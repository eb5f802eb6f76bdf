use super::*;

#[tokio::test]
async fn test_connect_rejects_malformed_endpoint() {
    let err = CdpClient::connect("not a url").await.err().unwrap();
    assert!(matches!(err, CdpError::ConnectionFailed(ref m) if m.starts_with("Invalid URL")));
}

#[tokio::test]
async fn test_connect_reports_unreachable_browser() {
    // Port 9 (discard) is closed on any sane test host.
    let err = CdpClient::connect_with_timeout("http://127.0.0.1:9", Duration::from_secs(1))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, CdpError::ChromeNotAvailable(_)));
    assert!(err.to_string().contains("--remote-debugging-port"));
}

#[test]
fn test_default_timeout() {
    assert_eq!(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs(30));
}
