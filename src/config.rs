//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::net::connection::ReconnectPolicy;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_MATCHROOM_PATH: &str = "/matchroom";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 10_000;

/// Error returned by [`ClientConfig::from_env`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported URL scheme in {0} (expected http:// or https://)")]
    UnsupportedScheme(String),
    #[error("unknown MATCHROOM_RECONNECT mode: {0} (expected 'backoff' or 'immediate')")]
    ReconnectMode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST/SSE API, without a trailing slash.
    pub api_url: String,
    /// Base URL of the live match socket; rooms live at `<ws_url>/<matchID>/ws`.
    pub ws_url: String,
    /// Session cookie value sent with every API request, if known.
    pub session_token: Option<String>,
    /// Timeout for login and queue requests.
    pub request_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            ws_url: format!("ws://127.0.0.1:8080{DEFAULT_MATCHROOM_PATH}"),
            session_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `MATCHROOM_API_URL`: default `http://127.0.0.1:8080`
    /// - `MATCHROOM_WS_URL`: default derived from the API URL plus `/matchroom`
    /// - `MATCHROOM_SESSION_TOKEN`
    /// - `MATCHROOM_REQUEST_TIMEOUT_SECS`: default 5
    /// - `MATCHROOM_RECONNECT`: `backoff` (default) or `immediate`
    /// - `MATCHROOM_RECONNECT_INITIAL_MS` / `MATCHROOM_RECONNECT_MAX_MS`: default 1000 / 10000
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a non-HTTP API URL or an unknown reconnect mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("MATCHROOM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let ws_url = std::env::var("MATCHROOM_WS_URL").ok().filter(|v| !v.is_empty());
        let session_token = std::env::var("MATCHROOM_SESSION_TOKEN").ok().filter(|v| !v.is_empty());
        let reconnect = parse_reconnect(
            std::env::var("MATCHROOM_RECONNECT").ok().as_deref(),
            env_parse("MATCHROOM_RECONNECT_INITIAL_MS", DEFAULT_RECONNECT_INITIAL_MS),
            env_parse("MATCHROOM_RECONNECT_MAX_MS", DEFAULT_RECONNECT_MAX_MS),
        )?;

        Self::build(
            &api_url,
            ws_url.as_deref(),
            session_token,
            env_parse("MATCHROOM_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            reconnect,
        )
    }

    /// Assemble a config from explicit values, deriving the socket URL when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedScheme`] when a socket URL has to be
    /// derived from a non-HTTP API URL.
    pub fn build(
        api_url: &str,
        ws_url: Option<&str>,
        session_token: Option<String>,
        request_timeout_secs: u64,
        reconnect: ReconnectPolicy,
    ) -> Result<Self, ConfigError> {
        let api_url = api_url.trim_end_matches('/').to_owned();
        let ws_url = match ws_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => derive_ws_url(&api_url)?,
        };
        Ok(Self {
            api_url,
            ws_url,
            session_token,
            request_timeout: Duration::from_secs(request_timeout_secs),
            reconnect,
        })
    }

    /// Socket address for one match room.
    #[must_use]
    pub fn match_socket_url(&self, match_id: &str) -> String {
        format!("{}/{match_id}/ws", self.ws_url)
    }
}

/// `http://host/x` → `ws://host/x/matchroom`, `https` → `wss`.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedScheme`] for anything but `http`/`https`.
pub fn derive_ws_url(api_url: &str) -> Result<String, ConfigError> {
    let api_url = api_url.trim_end_matches('/');
    if let Some(rest) = api_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}{DEFAULT_MATCHROOM_PATH}"));
    }
    if let Some(rest) = api_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}{DEFAULT_MATCHROOM_PATH}"));
    }
    Err(ConfigError::UnsupportedScheme(api_url.to_owned()))
}

/// Parse the reconnect mode name into a policy. The cap never drops below the initial delay.
///
/// # Errors
///
/// Returns [`ConfigError::ReconnectMode`] for an unknown mode name.
pub fn parse_reconnect(raw: Option<&str>, initial_ms: u64, max_ms: u64) -> Result<ReconnectPolicy, ConfigError> {
    match raw.unwrap_or("backoff") {
        "backoff" => Ok(ReconnectPolicy::Backoff {
            initial: Duration::from_millis(initial_ms),
            max: Duration::from_millis(max_ms.max(initial_ms)),
        }),
        "immediate" => Ok(ReconnectPolicy::Immediate),
        other => Err(ConfigError::ReconnectMode(other.to_owned())),
    }
}

fn env_parse(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
