//! REST and SSE calls against the match backend.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<_, ApiError>`. Callers on the interaction path
//! (legal moves, session validation) log and fall back to an empty/default
//! value; queue join/leave failures propagate so the caller can restore its
//! own state.
//!
//! Session cookies live in the client's cookie store. A token from config is
//! also sent as a `Cookie` header on every request.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::interaction::MoveOracle;
use crate::net::sse::{self, MatchAssignment, SseDecoder};

/// Name of the session cookie set by the auth endpoints.
pub const SESSION_COOKIE: &str = "session_token";

const LEGAL_MOVES_PATH: &str = "/api/moves/legal";
const QUEUE_PATH: &str = "/api/matchmaking/queue";
const MATCH_EVENTS_PATH: &str = "/api/matchmaking/events";
const REGISTER_PATH: &str = "/api/auth/register";
const LOGIN_PATH: &str = "/api/auth/login";
const LOGOUT_PATH: &str = "/api/auth/logout";
const VALIDATE_PATH: &str = "/api/auth/validate";
const MATCHES_PATH: &str = "/api/matches";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("matchmaking stream ended before a match was assigned")]
    StreamClosed,
    #[error("malformed match assignment: {0}")]
    BadAssignment(String),
}

/// Legal destinations for one square.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMoves {
    #[serde(default)]
    pub moves: Vec<u8>,
    #[serde(default)]
    pub captures: Vec<u8>,
    /// Moving to any of these squares promotes a pawn.
    #[serde(default)]
    pub trigger_promotion: bool,
}

impl LegalMoves {
    /// Whether `square` is a legal destination or capture.
    #[must_use]
    pub fn contains(&self, square: u8) -> bool {
        self.moves.contains(&square) || self.captures.contains(&square)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegalMovesRequest {
    pub fen: String,
    pub piece: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueAction {
    Join,
    Leave,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueRequest {
    pub time_format_in_milliseconds: u64,
    pub increment_in_milliseconds: u64,
    pub action: QueueAction,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
    username: String,
}

/// A match currently being played, as listed for spectators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMatch {
    #[serde(rename = "matchID")]
    pub match_id: String,
    #[serde(default)]
    pub white_username: String,
    #[serde(default)]
    pub black_username: String,
    #[serde(default)]
    pub time_format_in_milliseconds: u64,
    #[serde(default)]
    pub increment_in_milliseconds: u64,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl ApiClient {
    /// Build a client with a cookie store, plus the configured session token if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.session_token {
            headers.insert(COOKIE, HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}"))?);
        }
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, base_url: config.api_url.clone(), request_timeout: config.request_timeout })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /api/moves/legal` for the piece on `square` in `fen`.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies.
    pub async fn legal_moves(&self, fen: &str, square: u8) -> Result<LegalMoves, ApiError> {
        let body = LegalMovesRequest { fen: fen.to_owned(), piece: square };
        let response = self.http.post(self.url(LEGAL_MOVES_PATH)).json(&body).send().await?;
        Ok(check(LEGAL_MOVES_PATH, response)?.json().await?)
    }

    /// Join the matchmaking queue for a time control.
    ///
    /// # Errors
    ///
    /// Transport failures (including the request timeout) and non-2xx statuses.
    pub async fn join_queue(&self, time_format_ms: u64, increment_ms: u64) -> Result<(), ApiError> {
        self.queue(QueueAction::Join, time_format_ms, increment_ms).await
    }

    /// Leave the matchmaking queue for a time control.
    ///
    /// # Errors
    ///
    /// Transport failures (including the request timeout) and non-2xx statuses.
    pub async fn leave_queue(&self, time_format_ms: u64, increment_ms: u64) -> Result<(), ApiError> {
        self.queue(QueueAction::Leave, time_format_ms, increment_ms).await
    }

    async fn queue(&self, action: QueueAction, time_format_ms: u64, increment_ms: u64) -> Result<(), ApiError> {
        let body = QueueRequest {
            time_format_in_milliseconds: time_format_ms,
            increment_in_milliseconds: increment_ms,
            action,
        };
        let response = self
            .http
            .post(self.url(QUEUE_PATH))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;
        check(QUEUE_PATH, response)?;
        tracing::info!(?action, time_format_ms, increment_ms, "matchmaking queue updated");
        Ok(())
    }

    /// Follow the matchmaking event stream until the first match assignment.
    ///
    /// Dropping the future cancels the stream.
    ///
    /// # Errors
    ///
    /// Transport failures, a non-2xx status, a stream that ends first, or an
    /// assignment that is not `matchID,timeFormat,increment`.
    pub async fn wait_for_match(&self) -> Result<MatchAssignment, ApiError> {
        let response = self.http.get(self.url(MATCH_EVENTS_PATH)).send().await?;
        let mut body = check(MATCH_EVENTS_PATH, response)?.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if let Some(event) = decoder.push(&chunk).into_iter().next() {
                let assignment =
                    sse::parse_assignment(&event.data).ok_or_else(|| ApiError::BadAssignment(event.data.clone()))?;
                tracing::info!(match_id = %assignment.match_id, "match assigned");
                return Ok(assignment);
            }
        }
        Err(ApiError::StreamClosed)
    }

    /// # Errors
    ///
    /// Transport failures and non-2xx statuses (e.g. a taken username).
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = Credentials { username: username.to_owned(), password: password.to_owned() };
        let response = self.http.post(self.url(REGISTER_PATH)).json(&body).send().await?;
        check(REGISTER_PATH, response)?;
        Ok(())
    }

    /// Log in; the session cookie lands in the cookie store and is also returned.
    ///
    /// # Errors
    ///
    /// Transport failures (including the request timeout) and non-2xx statuses.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<String>, ApiError> {
        let body = Credentials { username: username.to_owned(), password: password.to_owned() };
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;
        let response = check(LOGIN_PATH, response)?;
        Ok(response
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned()))
    }

    /// # Errors
    ///
    /// Transport failures and non-2xx statuses.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self.http.post(self.url(LOGOUT_PATH)).send().await?;
        check(LOGOUT_PATH, response)?;
        Ok(())
    }

    /// Username of the current session, or `None` when not logged in or unreachable.
    pub async fn validate_session(&self) -> Option<String> {
        let result: Result<SessionInfo, ApiError> = async {
            let response = self.http.get(self.url(VALIDATE_PATH)).send().await?;
            Ok(check(VALIDATE_PATH, response)?.json().await?)
        }
        .await;

        match result {
            Ok(info) => Some(info.username),
            Err(ApiError::Status { status: 401, .. }) => None,
            Err(e) => {
                tracing::warn!(error = %e, "session validation failed");
                None
            }
        }
    }

    /// Matches currently in progress.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies.
    pub async fn list_live_matches(&self) -> Result<Vec<LiveMatch>, ApiError> {
        let response = self.http.get(self.url(MATCHES_PATH)).send().await?;
        Ok(check(MATCHES_PATH, response)?.json().await?)
    }
}

#[async_trait::async_trait]
impl MoveOracle for ApiClient {
    async fn legal_moves(&self, fen: &str, square: u8) -> Result<LegalMoves, ApiError> {
        ApiClient::legal_moves(self, fen, square).await
    }
}

fn check(endpoint: &'static str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status { endpoint, status: status.as_u16() })
    }
}
