use super::*;

#[test]
fn derive_ws_url_maps_http_to_ws() {
    assert_eq!(derive_ws_url("http://localhost:8080").unwrap(), "ws://localhost:8080/matchroom");
    assert_eq!(derive_ws_url("http://localhost:8080/").unwrap(), "ws://localhost:8080/matchroom");
}

#[test]
fn derive_ws_url_maps_https_to_wss() {
    assert_eq!(derive_ws_url("https://chess.example").unwrap(), "wss://chess.example/matchroom");
}

#[test]
fn derive_ws_url_rejects_other_schemes() {
    assert_eq!(
        derive_ws_url("ftp://chess.example"),
        Err(ConfigError::UnsupportedScheme("ftp://chess.example".to_owned()))
    );
}

#[test]
fn parse_reconnect_defaults_to_backoff() {
    let policy = parse_reconnect(None, 500, 8_000).unwrap();
    assert_eq!(
        policy,
        ReconnectPolicy::Backoff { initial: Duration::from_millis(500), max: Duration::from_millis(8_000) }
    );
}

#[test]
fn parse_reconnect_max_never_below_initial() {
    let policy = parse_reconnect(Some("backoff"), 2_000, 100).unwrap();
    assert_eq!(
        policy,
        ReconnectPolicy::Backoff { initial: Duration::from_millis(2_000), max: Duration::from_millis(2_000) }
    );
}

#[test]
fn parse_reconnect_immediate() {
    assert_eq!(parse_reconnect(Some("immediate"), 1, 2).unwrap(), ReconnectPolicy::Immediate);
}

#[test]
fn parse_reconnect_rejects_unknown_mode() {
    assert_eq!(
        parse_reconnect(Some("never"), 1, 2),
        Err(ConfigError::ReconnectMode("never".to_owned()))
    );
}

#[test]
fn build_trims_trailing_slashes_and_derives_socket_url() {
    let config = ClientConfig::build("https://chess.example/", None, None, 5, ReconnectPolicy::Immediate).unwrap();
    assert_eq!(config.api_url, "https://chess.example");
    assert_eq!(config.ws_url, "wss://chess.example/matchroom");
    assert_eq!(config.request_timeout, Duration::from_secs(5));
}

#[test]
fn build_keeps_explicit_socket_url() {
    let config =
        ClientConfig::build("ftp://ignored", Some("ws://rooms.example/live/"), None, 5, ReconnectPolicy::Immediate)
            .unwrap();
    assert_eq!(config.ws_url, "ws://rooms.example/live");
}

#[test]
fn match_socket_url_appends_match_id() {
    let config = ClientConfig::default();
    assert_eq!(config.match_socket_url("abc123"), "ws://127.0.0.1:8080/matchroom/abc123/ws");
}
