//! Shared message model and JSON codec for the live match transport.
//!
//! Every socket frame is UTF-8 text holding one or more `\n`-joined JSON
//! envelopes shaped `{"messageType": string, "body": object}`; the server may
//! batch several envelopes into a single frame. Inbound envelopes decode into
//! [`ServerMessage`], outbound ones are built from [`ClientMessage`].
//!
//! ERROR HANDLING
//! ==============
//! Decoding is per envelope: one malformed line in a batch produces a
//! [`CodecError`] for that line only, and the remaining lines still decode.
//! Unrecognized `messageType` values are not errors; they surface as
//! [`ServerMessage::Unknown`] so the caller can log them.

use board::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by [`decode_message`] and [`decode_batch`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The line is not a JSON `{messageType, body}` envelope.
    #[error("failed to decode message envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    /// The envelope is fine but its body does not match the message type.
    #[error("invalid body for `{message_type}`: {source}")]
    Body {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },
    /// `sendPlayerCode` carried no integer code.
    #[error("missing player code")]
    MissingPlayerCode,
    /// `gameOverStatus` is outside the known range.
    #[error("invalid game over status: {0}")]
    InvalidGameOverStatus(i64),
}

// ── Shared payload types ────────────────────────────────────────

/// One ply of the match as pushed by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Position after this ply.
    pub fen: String,
    /// `(from, to)` logical squares; absent for ply 0.
    #[serde(default)]
    pub last_move: Option<(u8, u8)>,
    /// Algebraic notation of the move; empty for ply 0.
    #[serde(default)]
    pub algebraic_notation: String,
    /// White's remaining time as of this ply.
    pub white_player_time_remaining_milliseconds: i64,
    /// Black's remaining time as of this ply.
    pub black_player_time_remaining_milliseconds: i64,
}

/// Server-decided game result. The client never computes this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum GameOverStatus {
    #[default]
    Ongoing,
    Stalemate,
    Checkmate,
    ThreefoldRepetition,
    InsufficientMaterial,
    WhiteFlagged,
    BlackFlagged,
    Draw,
    WhiteResigned,
    BlackResigned,
    Abort,
    WhiteDisconnected,
    BlackDisconnected,
}

impl GameOverStatus {
    const ORDERED: [Self; 13] = [
        Self::Ongoing,
        Self::Stalemate,
        Self::Checkmate,
        Self::ThreefoldRepetition,
        Self::InsufficientMaterial,
        Self::WhiteFlagged,
        Self::BlackFlagged,
        Self::Draw,
        Self::WhiteResigned,
        Self::BlackResigned,
        Self::Abort,
        Self::WhiteDisconnected,
        Self::BlackDisconnected,
    ];

    /// Wire code of this status.
    #[must_use]
    pub fn code(self) -> i64 {
        Self::ORDERED
            .iter()
            .position(|status| *status == self)
            .and_then(|index| i64::try_from(index).ok())
            .unwrap_or_default()
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_over(self) -> bool {
        self != Self::Ongoing
    }

    /// Short human-readable description.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Ongoing => "in progress",
            Self::Stalemate => "draw by stalemate",
            Self::Checkmate => "checkmate",
            Self::ThreefoldRepetition => "draw by threefold repetition",
            Self::InsufficientMaterial => "draw by insufficient material",
            Self::WhiteFlagged => "white ran out of time",
            Self::BlackFlagged => "black ran out of time",
            Self::Draw => "draw by agreement",
            Self::WhiteResigned => "white resigned",
            Self::BlackResigned => "black resigned",
            Self::Abort => "aborted",
            Self::WhiteDisconnected => "white disconnected",
            Self::BlackDisconnected => "black disconnected",
        }
    }
}

impl TryFrom<i64> for GameOverStatus {
    type Error = CodecError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ORDERED.get(index).copied())
            .ok_or(CodecError::InvalidGameOverStatus(code))
    }
}

impl From<GameOverStatus> for i64 {
    fn from(status: GameOverStatus) -> Self {
        status.code()
    }
}

/// Proposal raised by the opponent that needs a local accept/decline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentEventKind {
    Takeback,
    Draw,
    Rematch,
}

// ── Inbound ─────────────────────────────────────────────────────

/// Body of `onMove`: the full replacement history plus game status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    pub match_state_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub game_over_status: GameOverStatus,
    #[serde(default)]
    pub threefold_repetition: bool,
}

/// Body of `onConnect`: an `onMove` body plus both presence flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectBody {
    #[serde(flatten)]
    pub update: MoveBody,
    pub white_player_connected: bool,
    pub black_player_connected: bool,
}

/// Body of `connectionStatus`: one side's presence change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusBody {
    pub player_colour: Color,
    pub is_connected: bool,
    /// Countdown to forfeit while the side is disconnected.
    #[serde(default)]
    pub milliseconds_until_timeout: Option<i64>,
}

/// Body of `opponentEvent`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentEventBody {
    pub event_type: OpponentEventKind,
}

/// A decoded inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMessage {
    /// 0 = white, 1 = black, anything else = spectator.
    SendPlayerCode(i64),
    OnConnect(ConnectBody),
    ConnectionStatus(ConnectionStatusBody),
    OnMove(MoveBody),
    OpponentEvent(OpponentEventBody),
    /// Discriminator this client does not understand.
    Unknown { message_type: String },
}

impl ServerMessage {
    /// Wire discriminator, for logging.
    #[must_use]
    pub fn message_type(&self) -> &str {
        match self {
            Self::SendPlayerCode(_) => "sendPlayerCode",
            Self::OnConnect(_) => "onConnect",
            Self::ConnectionStatus(_) => "connectionStatus",
            Self::OnMove(_) => "onMove",
            Self::OpponentEvent(_) => "opponentEvent",
            Self::Unknown { message_type } => message_type,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    message_type: String,
    #[serde(default)]
    body: Value,
}

/// Decode one JSON envelope.
///
/// # Errors
///
/// Returns [`CodecError::Envelope`] for non-envelope JSON and
/// [`CodecError::Body`] / [`CodecError::MissingPlayerCode`] when the body does
/// not fit the message type.
pub fn decode_message(line: &str) -> Result<ServerMessage, CodecError> {
    let envelope = serde_json::from_str::<Envelope>(line).map_err(CodecError::Envelope)?;
    let Envelope { message_type, body } = envelope;

    match message_type.as_str() {
        "sendPlayerCode" => player_code(&body).map(ServerMessage::SendPlayerCode),
        "onConnect" => decode_body(&message_type, body).map(ServerMessage::OnConnect),
        "connectionStatus" => decode_body(&message_type, body).map(ServerMessage::ConnectionStatus),
        "onMove" => decode_body(&message_type, body).map(ServerMessage::OnMove),
        "opponentEvent" => decode_body(&message_type, body).map(ServerMessage::OpponentEvent),
        _ => Ok(ServerMessage::Unknown { message_type }),
    }
}

/// Decode every non-blank `\n`-separated envelope in a frame, in order.
#[must_use]
pub fn decode_batch(text: &str) -> Vec<Result<ServerMessage, CodecError>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(decode_message)
        .collect()
}

fn decode_body<T>(message_type: &str, body: Value) -> Result<T, CodecError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(body).map_err(|source| CodecError::Body {
        message_type: message_type.to_owned(),
        source,
    })
}

/// The player code arrives either as a bare integer body or as `{"playerCode": n}`.
fn player_code(body: &Value) -> Result<i64, CodecError> {
    body.as_i64()
        .or_else(|| body.get("playerCode").and_then(Value::as_i64))
        .ok_or(CodecError::MissingPlayerCode)
}

// ── Outbound ────────────────────────────────────────────────────

/// Move submission. `piece` is the origin square, `to` the destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMove {
    pub piece: u8,
    #[serde(rename = "move")]
    pub to: u8,
    /// `q`, `n`, `r`, `b`, or empty when the move does not promote.
    pub promotion_string: String,
}

impl PostMove {
    #[must_use]
    pub fn new(piece: u8, to: u8, promotion: Option<board::PromotionPiece>) -> Self {
        Self {
            piece,
            to,
            promotion_string: promotion.map(|p| p.letter().to_string()).unwrap_or_default(),
        }
    }
}

/// Player-initiated event, including accept/decline of an opponent proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerEventKind {
    Takeback,
    Draw,
    Rematch,
    Resign,
    Abort,
    Threefold,
    DeclineTakeback,
    DeclineDraw,
    DeclineRematch,
}

impl PlayerEventKind {
    /// Event that accepts an opponent proposal (or raises the same proposal).
    #[must_use]
    pub fn accepting(kind: OpponentEventKind) -> Self {
        match kind {
            OpponentEventKind::Takeback => Self::Takeback,
            OpponentEventKind::Draw => Self::Draw,
            OpponentEventKind::Rematch => Self::Rematch,
        }
    }

    /// Event that declines an opponent proposal.
    #[must_use]
    pub fn declining(kind: OpponentEventKind) -> Self {
        match kind {
            OpponentEventKind::Takeback => Self::DeclineTakeback,
            OpponentEventKind::Draw => Self::DeclineDraw,
            OpponentEventKind::Rematch => Self::DeclineRematch,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEvent {
    pub event_type: PlayerEventKind,
}

/// An outbound message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "messageType", content = "body", rename_all = "camelCase")]
pub enum ClientMessage {
    PostMove(PostMove),
    PlayerEvent(PlayerEvent),
}

impl ClientMessage {
    #[must_use]
    pub fn event(kind: PlayerEventKind) -> Self {
        Self::PlayerEvent(PlayerEvent { event_type: kind })
    }
}

/// Encode an outbound message as a single JSON envelope.
#[must_use]
pub fn encode_message(message: &ClientMessage) -> String {
    // Plain structs with string keys; serde_json cannot fail on them.
    serde_json::to_string(message).unwrap_or_default()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
