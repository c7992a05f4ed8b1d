//! Match State Store: server-pushed history versus the locally viewed ply.
//!
//! SYSTEM CONTEXT
//! ==============
//! One store exists per mounted match room. The server is the only source of
//! truth for the history; every push replaces it wholesale. The store keeps a
//! separate pointer to the ply the user is looking at, which follows the live
//! head only while the user is already on it.
//!
//! INVARIANTS
//! ==========
//! - `history` is never empty (ply 0 is the starting position).
//! - `0 <= active_move <= history.len() - 1`.
//! - `active` always shows the board of `history[active_move]` or, after a
//!   push that arrived while scrubbed back, the board that was on screen
//!   before it; clock values in `active` always come from the live head.

#[cfg(test)]
#[path = "match_state_test.rs"]
mod match_state_test;

use board::consts::START_FEN;
use board::{Color, Position, fen};
use frames::{
    ConnectBody, ConnectionStatusBody, GameOverStatus, HistoryEntry, MoveBody, OpponentEventKind,
};

use crate::interaction::InteractionContext;

/// Error returned when a push cannot be applied.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateError {
    /// The server pushed a history with no plies.
    #[error("server pushed an empty match history")]
    EmptyHistory,
}

/// Role assigned to the local client by `sendPlayerCode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerRole {
    Player(Color),
    Spectator,
}

impl PlayerRole {
    /// 0 = white, 1 = black, anything else = spectator.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Player(Color::White),
            1 => Self::Player(Color::Black),
            _ => Self::Spectator,
        }
    }

    /// Colour this client plays, if any.
    #[must_use]
    pub fn color(self) -> Option<Color> {
        match self {
            Self::Player(color) => Some(color),
            Self::Spectator => None,
        }
    }
}

/// Cached view of the displayed ply plus the live clock values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveState {
    pub position: Position,
    pub last_move: Option<(u8, u8)>,
    pub fen: String,
    pub white_ms: i64,
    pub black_ms: i64,
}

impl ActiveState {
    fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            position: fen::parse(&entry.fen),
            last_move: entry.last_move,
            fen: entry.fen.clone(),
            white_ms: entry.white_player_time_remaining_milliseconds,
            black_ms: entry.black_player_time_remaining_milliseconds,
        }
    }

    fn show_entry(&mut self, entry: &HistoryEntry) {
        self.position = fen::parse(&entry.fen);
        self.last_move = entry.last_move;
        self.fen.clone_from(&entry.fen);
    }
}

/// Countdown for a side that dropped its connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisconnectCountdown {
    pub color: Color,
    pub milliseconds: i64,
}

/// Per-side connection flags, updated independently of the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Presence {
    pub white_connected: bool,
    pub black_connected: bool,
    pub countdown: Option<DisconnectCountdown>,
}

impl Default for Presence {
    fn default() -> Self {
        Self { white_connected: true, black_connected: true, countdown: None }
    }
}

impl Presence {
    #[must_use]
    pub fn is_connected(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_connected,
            Color::Black => self.black_connected,
        }
    }
}

/// State of one match room.
#[derive(Clone, Debug)]
pub struct MatchState {
    match_id: String,
    player: Option<PlayerRole>,
    history: Vec<HistoryEntry>,
    active_move: usize,
    active: ActiveState,
    active_colour: Color,
    game_over: GameOverStatus,
    threefold: bool,
    presence: Presence,
    opponent_event: Option<OpponentEventKind>,
    rev: u64,
}

impl MatchState {
    /// Fresh store for a room, showing the standard starting position.
    #[must_use]
    pub fn new(match_id: impl Into<String>) -> Self {
        let start = HistoryEntry {
            fen: START_FEN.to_owned(),
            last_move: None,
            algebraic_notation: String::new(),
            white_player_time_remaining_milliseconds: 0,
            black_player_time_remaining_milliseconds: 0,
        };
        let active = ActiveState::from_entry(&start);
        Self {
            match_id: match_id.into(),
            player: None,
            active_colour: active.position.active_color,
            history: vec![start],
            active_move: 0,
            active,
            game_over: GameOverStatus::Ongoing,
            threefold: false,
            presence: Presence::default(),
            opponent_event: None,
            rev: 0,
        }
    }

    // ── Server pushes ───────────────────────────────────────────

    /// Record the local player's role. Only the first assignment sticks.
    pub fn assign_player(&mut self, code: i64) -> bool {
        if self.player.is_some() {
            tracing::debug!(match_id = %self.match_id, code, "player code already assigned; ignoring");
            return false;
        }
        self.player = Some(PlayerRole::from_code(code));
        self.bump_rev();
        true
    }

    /// Apply an `onMove` push.
    ///
    /// The displayed ply follows the new head only when the user was already
    /// looking at the old head; otherwise the board stays where it was while
    /// the history grows underneath. Clock values always track the new head.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::EmptyHistory`] and leaves the store untouched when
    /// the pushed history has no plies.
    pub fn apply_move_update(&mut self, update: MoveBody) -> Result<(), StateError> {
        let MoveBody { match_state_history: history, game_over_status, threefold_repetition } = update;
        let Some(head) = history.last() else {
            return Err(StateError::EmptyHistory);
        };

        self.active_colour = fen::parse(&head.fen).active_color;

        let mut candidate = self.active.clone();
        candidate.white_ms = head.white_player_time_remaining_milliseconds;
        candidate.black_ms = head.black_player_time_remaining_milliseconds;

        let viewing_live = self.history.last().is_some_and(|old_head| old_head.fen == self.active.fen);
        if viewing_live {
            candidate.show_entry(head);
            self.active_move = history.len() - 1;
        } else if self.active_move >= history.len() {
            // A takeback shrank the history below the scrubbed ply.
            candidate.show_entry(head);
            self.active_move = history.len() - 1;
        }

        self.active = candidate;
        self.history = history;
        self.game_over = game_over_status;
        self.threefold = threefold_repetition;
        self.opponent_event = None;
        self.bump_rev();
        Ok(())
    }

    /// Apply an `onConnect` push: the move update first, then both presence flags.
    ///
    /// # Errors
    ///
    /// Propagates [`StateError::EmptyHistory`]; the presence flags are applied
    /// either way.
    pub fn apply_connect(&mut self, body: ConnectBody) -> Result<(), StateError> {
        let ConnectBody { update, white_player_connected, black_player_connected } = body;
        let result = self.apply_move_update(update);
        self.presence.white_connected = white_player_connected;
        self.presence.black_connected = black_player_connected;
        if white_player_connected && black_player_connected {
            self.presence.countdown = None;
        }
        self.bump_rev();
        result
    }

    /// Apply a `connectionStatus` push for one side.
    pub fn apply_connection_status(&mut self, status: ConnectionStatusBody) {
        let ConnectionStatusBody { player_colour, is_connected, milliseconds_until_timeout } = status;
        match player_colour {
            Color::White => self.presence.white_connected = is_connected,
            Color::Black => self.presence.black_connected = is_connected,
        }

        if is_connected {
            if self.presence.countdown.is_some_and(|c| c.color == player_colour) {
                self.presence.countdown = None;
            }
        } else if let Some(milliseconds) = milliseconds_until_timeout {
            self.presence.countdown = Some(DisconnectCountdown { color: player_colour, milliseconds });
        }
        self.bump_rev();
    }

    pub fn set_opponent_event(&mut self, kind: OpponentEventKind) {
        self.opponent_event = Some(kind);
        self.bump_rev();
    }

    /// Clear the pending proposal after the local player resolved it.
    pub fn clear_opponent_event(&mut self) -> Option<OpponentEventKind> {
        let cleared = self.opponent_event.take();
        if cleared.is_some() {
            self.bump_rev();
        }
        cleared
    }

    // ── Navigation ──────────────────────────────────────────────

    /// Show ply `index`, clamped to the known history.
    pub fn select_ply(&mut self, index: usize) {
        let index = index.min(self.history.len() - 1);
        self.active_move = index;
        let entry = &self.history[index];
        self.active.show_entry(entry);
        self.bump_rev();
    }

    pub fn step_back(&mut self) {
        self.select_ply(self.active_move.saturating_sub(1));
    }

    pub fn step_forward(&mut self) {
        self.select_ply(self.active_move + 1);
    }

    pub fn jump_to_start(&mut self) {
        self.select_ply(0);
    }

    pub fn jump_to_latest(&mut self) {
        self.select_ply(self.history.len() - 1);
    }

    // ── Queries ─────────────────────────────────────────────────

    #[must_use]
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    #[must_use]
    pub fn player(&self) -> Option<PlayerRole> {
        self.player
    }

    /// Colour the local client plays; `None` for spectators or before assignment.
    #[must_use]
    pub fn player_color(&self) -> Option<Color> {
        self.player.and_then(PlayerRole::color)
    }

    /// Whether the board is drawn from black's side.
    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.player_color() == Some(Color::Black)
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn active_move(&self) -> usize {
        self.active_move
    }

    #[must_use]
    pub fn active(&self) -> &ActiveState {
        &self.active
    }

    /// Side to move at the live head.
    #[must_use]
    pub fn active_colour(&self) -> Color {
        self.active_colour
    }

    #[must_use]
    pub fn game_over(&self) -> GameOverStatus {
        self.game_over
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over.is_over()
    }

    #[must_use]
    pub fn threefold(&self) -> bool {
        self.threefold
    }

    #[must_use]
    pub fn presence(&self) -> Presence {
        self.presence
    }

    #[must_use]
    pub fn opponent_event(&self) -> Option<OpponentEventKind> {
        self.opponent_event
    }

    /// Whether the displayed ply is the live head.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.active_move == self.history.len() - 1
    }

    /// FEN of the live head.
    #[must_use]
    pub fn latest_fen(&self) -> &str {
        self.history.last().map_or(START_FEN, |entry| entry.fen.as_str())
    }

    /// Side whose display clock should tick, if any.
    #[must_use]
    pub fn clock_running(&self) -> Option<Color> {
        (!self.is_game_over() && self.history.len() > 1).then_some(self.active_colour)
    }

    /// Change counter, bumped on every applied mutation.
    #[must_use]
    pub fn rev(&self) -> u64 {
        self.rev
    }

    /// Snapshot of what the move controller needs to handle one input.
    #[must_use]
    pub fn interaction_context(&self) -> InteractionContext {
        InteractionContext {
            is_latest: self.is_latest(),
            game_over: self.is_game_over(),
            player: self.player_color(),
            position: self.active.position.clone(),
            latest_fen: self.latest_fen().to_owned(),
        }
    }

    fn bump_rev(&mut self) {
        self.rev = self.rev.wrapping_add(1);
    }
}
