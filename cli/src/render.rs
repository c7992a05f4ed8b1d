//! Text rendering of a match room and parsing of in-game commands.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write as _;
use std::time::Instant;

use board::consts::BOARD_WIDTH;
use board::geometry;
use board::{Color, Position};
use frames::{OpponentEventKind, PlayerEventKind};
use matchroom::state::clock::{DisplayClock, format_clock};
use matchroom::{MatchState, PlayerRole};

/// Board as eight text rows plus a file legend, from the viewer's side.
/// Squares of the last move are bracketed.
pub fn render_board(position: &Position, flipped: bool, last_move: Option<(u8, u8)>) -> String {
    let mut out = String::new();
    for display_row in 0..BOARD_WIDTH {
        let first = geometry::display_index(display_row * BOARD_WIDTH, flipped);
        let _ = write!(out, "{} ", BOARD_WIDTH - geometry::row_of(first));
        for display_col in 0..BOARD_WIDTH {
            let square = geometry::display_index(display_row * BOARD_WIDTH + display_col, flipped);
            let glyph = position.piece_at(square).map_or('.', board::Piece::to_char);
            let touched = last_move.is_some_and(|(from, to)| square == from || square == to);
            if touched {
                let _ = write!(out, "[{glyph}]");
            } else {
                let _ = write!(out, " {glyph} ");
            }
        }
        out.push('\n');
    }
    out.push_str("  ");
    for display_col in 0..BOARD_WIDTH {
        let square = geometry::display_index(display_col, flipped);
        let file = char::from(b'a' + geometry::column_of(square));
        let _ = write!(out, " {file} ");
    }
    out.push('\n');
    out
}

fn role_label(role: Option<PlayerRole>) -> &'static str {
    match role {
        Some(PlayerRole::Player(Color::White)) => "white",
        Some(PlayerRole::Player(Color::Black)) => "black",
        Some(PlayerRole::Spectator) => "spectator",
        None => "connecting",
    }
}

/// Full room view: board, clocks, status, and any pending proposal.
pub fn render_room(state: &MatchState, clock: &DisplayClock, now: Instant) -> String {
    let active = state.active();
    let mut out = render_board(&active.position, state.is_flipped(), active.last_move);

    let last_ply = state.history().len() - 1;
    let _ = writeln!(
        out,
        "match {} | you: {} | ply {}/{}{}",
        state.match_id(),
        role_label(state.player()),
        state.active_move(),
        last_ply,
        if state.is_latest() { "" } else { " (history)" },
    );
    let _ = writeln!(out, "{}", clock_line(clock, now));

    if state.is_game_over() {
        let _ = writeln!(out, "game over: {}", state.game_over().describe());
    } else {
        let _ = writeln!(out, "{} to move", state.active_colour().as_str());
    }

    let presence = state.presence();
    for color in [Color::White, Color::Black] {
        if !presence.is_connected(color) {
            let countdown = clock
                .countdown(now)
                .filter(|c| c.color == color)
                .map(|c| format!(" (forfeit in {})", format_clock(c.milliseconds)))
                .unwrap_or_default();
            let _ = writeln!(out, "{} disconnected{countdown}", color.as_str());
        }
    }
    if state.threefold() && !state.is_game_over() {
        let _ = writeln!(out, "threefold repetition: type `threefold` to claim a draw");
    }
    if let Some(event) = state.opponent_event() {
        let _ = writeln!(out, "opponent proposes {}: `accept` or `decline`", event_label(event));
    }
    out
}

fn clock_line(clock: &DisplayClock, now: Instant) -> String {
    format!(
        "white {} | black {}",
        format_clock(clock.remaining_ms(Color::White, now)),
        format_clock(clock.remaining_ms(Color::Black, now)),
    )
}

/// Room view for one `watch`/`play` session. The clock is re-anchored on
/// server pushes only; local redraws and ticks extrapolate from that anchor.
pub struct RoomView {
    clock: DisplayClock,
}

impl RoomView {
    pub fn new(now: Instant) -> Self {
        Self { clock: DisplayClock::new(now) }
    }

    /// Render after the server changed the store.
    pub fn on_push(&mut self, state: &MatchState, now: Instant) -> String {
        self.clock.sync_state(state, now);
        render_room(state, &self.clock, now)
    }

    /// Render after a local change (navigation, selection, help).
    pub fn redraw(&self, state: &MatchState, now: Instant) -> String {
        render_room(state, &self.clock, now)
    }

    /// One-line clock status, or `None` while nothing is counting down.
    pub fn tick(&self, now: Instant) -> Option<String> {
        if !self.clock.is_ticking() {
            return None;
        }
        let mut line = clock_line(&self.clock, now);
        if let Some(countdown) = self.clock.countdown(now) {
            let _ = write!(
                line,
                " | {} forfeits in {}",
                countdown.color.as_str(),
                format_clock(countdown.milliseconds)
            );
        }
        Some(line)
    }
}

fn event_label(kind: OpponentEventKind) -> &'static str {
    match kind {
        OpponentEventKind::Takeback => "a takeback",
        OpponentEventKind::Draw => "a draw",
        OpponentEventKind::Rematch => "a rematch",
    }
}

/// One line typed during `play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayInput {
    Square(u8),
    Back,
    Forward,
    Start,
    Latest,
    Event(PlayerEventKind),
    Accept,
    Decline,
    Board,
    Help,
    Quit,
}

pub const PLAY_HELP: &str = "\
squares:  e2, e4, ...     select a piece, then its destination (or promotion choice)
history:  back, fwd, start, latest
events:   resign, draw, takeback, rematch, abort, threefold
replies:  accept, decline
other:    board, help, quit";

/// Parse a `play` command; `None` for anything unrecognized.
pub fn parse_play_input(line: &str) -> Option<PlayInput> {
    let word = line.trim().to_ascii_lowercase();
    let input = match word.as_str() {
        "back" | "b" => PlayInput::Back,
        "fwd" | "forward" | "f" => PlayInput::Forward,
        "start" => PlayInput::Start,
        "latest" | "live" => PlayInput::Latest,
        "resign" => PlayInput::Event(PlayerEventKind::Resign),
        "draw" => PlayInput::Event(PlayerEventKind::Draw),
        "takeback" => PlayInput::Event(PlayerEventKind::Takeback),
        "rematch" => PlayInput::Event(PlayerEventKind::Rematch),
        "abort" => PlayInput::Event(PlayerEventKind::Abort),
        "threefold" => PlayInput::Event(PlayerEventKind::Threefold),
        "accept" | "y" => PlayInput::Accept,
        "decline" | "n" => PlayInput::Decline,
        "board" | "" => PlayInput::Board,
        "help" | "?" => PlayInput::Help,
        "quit" | "exit" | "q" => PlayInput::Quit,
        other => PlayInput::Square(geometry::parse_square(other)?),
    };
    Some(input)
}
