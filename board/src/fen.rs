//! FEN parsing and placement serialization.
//!
//! Parsing is lenient: unknown placement characters are skipped and missing
//! fields fall back to defaults, so any string yields a 64-square position.
//! Serialization only reproduces the piece placement; the remaining fields
//! are always written as [`PLACEHOLDER_SUFFIX`].
//!
//! Square indexing is `row * 8 + column`, row 0 being the first rank written
//! in the string (the top of an unflipped board).

#[cfg(test)]
#[path = "fen_test.rs"]
mod fen_test;

use serde::Serialize;

use crate::consts::{BOARD_SQUARES, BOARD_WIDTH, PLACEHOLDER_SUFFIX};
use crate::piece::{Color, Piece};

/// Error returned by [`serialize_board`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodingError {
    /// The square slice does not describe a full board.
    #[error("board must have {BOARD_SQUARES} squares, got {0}")]
    SquareCount(usize),
}

/// Four independent castling rights.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

/// A parsed position. Only the placement survives a serialize/parse round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    #[serde(serialize_with = "serialize_squares")]
    pub board: [Option<Piece>; BOARD_SQUARES],
    pub active_color: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: [None; BOARD_SQUARES],
            active_color: Color::White,
            castling: CastlingRights::default(),
            en_passant: None,
        }
    }
}

impl Position {
    /// Piece on `square`, if any. Out-of-range squares are empty.
    #[must_use]
    pub fn piece_at(&self, square: u8) -> Option<Piece> {
        self.board.get(usize::from(square)).copied().flatten()
    }
}

/// Parse a FEN string. Never fails; see the module docs for the leniency rules.
#[must_use]
pub fn parse(fen: &str) -> Position {
    let mut fields = fen.split_whitespace();
    let placement = fields.next().unwrap_or_default();
    let active = fields.next().unwrap_or_default();
    let castling = fields.next().unwrap_or_default();
    let en_passant = fields.next().unwrap_or_default();
    // Half-move clock and full-move number are accepted but not modeled.

    Position {
        board: parse_placement(placement),
        active_color: if active == "b" { Color::Black } else { Color::White },
        castling: parse_castling(castling),
        en_passant: parse_en_passant(en_passant),
    }
}

fn parse_placement(placement: &str) -> [Option<Piece>; BOARD_SQUARES] {
    let mut board = [None; BOARD_SQUARES];
    let mut index = 0_usize;

    for ch in placement.chars() {
        if ch == '/' {
            continue;
        }
        if let Some(run) = ch.to_digit(10).filter(|n| (1..=8).contains(n)) {
            index += run as usize;
            continue;
        }
        if let Some(piece) = Piece::from_char(ch) {
            if index < BOARD_SQUARES {
                board[index] = Some(piece);
            }
            index += 1;
        }
    }

    board
}

fn parse_castling(field: &str) -> CastlingRights {
    CastlingRights {
        white_king_side: field.contains('K'),
        white_queen_side: field.contains('Q'),
        black_king_side: field.contains('k'),
        black_queen_side: field.contains('q'),
    }
}

/// Decode the en-passant field. File `a` decodes to 0, which is a real square
/// offset; only an unknown file letter or rank yields `None`.
fn parse_en_passant(field: &str) -> Option<u8> {
    if field == "-" || field.chars().count() <= 1 {
        return None;
    }

    let mut chars = field.chars();
    let file = chars.next().and_then(file_index)?;
    let rank = chars.next().and_then(|ch| ch.to_digit(10))?;
    let rank = u8::try_from(rank).ok()?;
    Some(file + rank * BOARD_WIDTH)
}

fn file_index(letter: char) -> Option<u8> {
    match letter {
        'a'..='h' => u8::try_from(letter).ok().map(|byte| byte - b'a'),
        _ => None,
    }
}

/// Serialize a position's placement followed by [`PLACEHOLDER_SUFFIX`].
#[must_use]
pub fn serialize(position: &Position) -> String {
    let mut out = encode_placement(&position.board);
    out.push_str(PLACEHOLDER_SUFFIX);
    out
}

/// Serialize an arbitrary square slice the same way as [`serialize`].
///
/// # Errors
///
/// Returns [`EncodingError::SquareCount`] unless the slice holds exactly 64 squares.
pub fn serialize_board(squares: &[Option<Piece>]) -> Result<String, EncodingError> {
    if squares.len() != BOARD_SQUARES {
        return Err(EncodingError::SquareCount(squares.len()));
    }
    let mut out = encode_placement(squares);
    out.push_str(PLACEHOLDER_SUFFIX);
    Ok(out)
}

fn encode_placement(squares: &[Option<Piece>]) -> String {
    let width = usize::from(BOARD_WIDTH);
    let mut out = String::with_capacity(BOARD_SQUARES + width);
    let mut empty_run = 0_u32;

    for (index, square) in squares.iter().enumerate() {
        match square {
            Some(piece) => {
                flush_run(&mut out, &mut empty_run);
                out.push(piece.to_char());
            }
            None => empty_run += 1,
        }

        if (index + 1) % width == 0 {
            flush_run(&mut out, &mut empty_run);
            if index + 1 < squares.len() {
                out.push('/');
            }
        }
    }

    out
}

fn flush_run(out: &mut String, run: &mut u32) {
    if *run > 0 {
        if let Some(digit) = char::from_digit(*run, 10) {
            out.push(digit);
        }
        *run = 0;
    }
}

fn serialize_squares<S>(board: &[Option<Piece>; BOARD_SQUARES], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(board.iter())
}
