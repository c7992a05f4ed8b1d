//! Piece colours, kinds, and their FEN letters.
//!
//! Letter tables are plain `const`-evaluable matches; there is no mutable
//! lookup state anywhere in the crate.

#[cfg(test)]
#[path = "piece_test.rs"]
mod piece_test;

use serde::{Deserialize, Serialize};

/// Side colour. White is the first colour (uppercase in FEN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

/// Kind of chess piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase FEN letter.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    /// Parse a lowercase FEN letter.
    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }
}

/// A coloured piece standing on a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[must_use]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN character: uppercase for white, lowercase for black.
    #[must_use]
    pub const fn to_char(self) -> char {
        let letter = self.kind.letter();
        match self.color {
            Color::White => letter.to_ascii_uppercase(),
            Color::Black => letter,
        }
    }

    /// Parse one of `PNBRQKpnbrqk`.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        let color = if ch.is_ascii_uppercase() { Color::White } else { Color::Black };
        match PieceKind::from_letter(ch.to_ascii_lowercase()) {
            Some(kind) => Some(Self { color, kind }),
            None => None,
        }
    }
}

/// Piece a pawn may promote to, in the order the promotion picker offers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionPiece {
    Queen,
    Knight,
    Rook,
    Bishop,
}

impl PromotionPiece {
    /// Offer order used by the promotion picker.
    pub const OFFER_ORDER: [Self; 4] = [Self::Queen, Self::Knight, Self::Rook, Self::Bishop];

    /// Letter sent on the wire (`q`, `n`, `r`, `b`).
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Queen => 'q',
            Self::Knight => 'n',
            Self::Rook => 'r',
            Self::Bishop => 'b',
        }
    }

    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'q' => Some(Self::Queen),
            'n' => Some(Self::Knight),
            'r' => Some(Self::Rook),
            'b' => Some(Self::Bishop),
            _ => None,
        }
    }
}
