//! Shared constants for the board crate.

// ── Dimensions ──────────────────────────────────────────────────

/// Squares per rank and per file.
pub const BOARD_WIDTH: u8 = 8;

/// Total squares on the board.
pub const BOARD_SQUARES: usize = 64;

// ── FEN ─────────────────────────────────────────────────────────

/// Standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Suffix appended by [`crate::fen::serialize`] in place of the real side to
/// move, castling rights, en-passant square, and move counters.
pub const PLACEHOLDER_SUFFIX: &str = " w KQkq - 0 1";
