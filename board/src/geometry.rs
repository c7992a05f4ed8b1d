//! Board geometry: pointer coordinates to logical squares.
//!
//! Logical indices are what the network speaks (`row * 8 + column`, row 0 at
//! the top of the FEN string). When the local player is black the board is
//! drawn flipped, so the displayed index is `63 - logical`.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::{BOARD_SQUARES, BOARD_WIDTH};
use crate::piece::PromotionPiece;

/// Highest square index.
const LAST_SQUARE: u8 = 63;

/// A point in board-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where the board is drawn and how large each square is.
#[derive(Debug, Clone, Copy)]
pub struct BoardGeometry {
    /// Top-left corner of the board.
    pub origin: Point,
    /// Edge length of one square.
    pub square_size: f64,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self { origin: Point::new(0.0, 0.0), square_size: 1.0 }
    }
}

impl BoardGeometry {
    #[must_use]
    pub fn new(origin: Point, square_size: f64) -> Self {
        Self { origin, square_size }
    }

    /// Logical square under `point`, or `None` when the point is off the board.
    #[must_use]
    pub fn square_at(&self, point: Point, flipped: bool) -> Option<u8> {
        if self.square_size <= 0.0 {
            return None;
        }
        let col = ((point.x - self.origin.x) / self.square_size).floor();
        let row = ((point.y - self.origin.y) / self.square_size).floor();
        let width = f64::from(BOARD_WIDTH);
        if !(0.0..width).contains(&col) || !(0.0..width).contains(&row) {
            return None;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let displayed = (row as u8) * BOARD_WIDTH + col as u8;
        Some(display_index(displayed, flipped))
    }

    /// Top-left corner of the drawn cell for a logical square.
    #[must_use]
    pub fn square_origin(&self, square: u8, flipped: bool) -> Point {
        let displayed = display_index(square, flipped);
        Point::new(
            self.origin.x + f64::from(displayed % BOARD_WIDTH) * self.square_size,
            self.origin.y + f64::from(displayed / BOARD_WIDTH) * self.square_size,
        )
    }
}

/// Map between logical and displayed indices. The mapping is its own inverse.
#[must_use]
pub fn display_index(square: u8, flipped: bool) -> u8 {
    if flipped { LAST_SQUARE.saturating_sub(square) } else { square }
}

/// Row (0 = top of the FEN string) of a logical square.
#[must_use]
pub fn row_of(square: u8) -> u8 {
    square / BOARD_WIDTH
}

/// Column (0 = file `a`) of a logical square.
#[must_use]
pub fn column_of(square: u8) -> u8 {
    square % BOARD_WIDTH
}

/// Algebraic name (`e4`) of a logical square; `None` when out of range.
#[must_use]
pub fn square_name(square: u8) -> Option<String> {
    if usize::from(square) >= BOARD_SQUARES {
        return None;
    }
    let file = char::from(b'a' + column_of(square));
    let rank = BOARD_WIDTH - row_of(square);
    Some(format!("{file}{rank}"))
}

/// Parse an algebraic name (`e4`) into a logical square.
#[must_use]
pub fn parse_square(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let file = chars.next()?;
    let rank = chars.next()?.to_digit(10)?;
    if chars.next().is_some() || !('a'..='h').contains(&file) || !(1..=8).contains(&rank) {
        return None;
    }
    let col = u8::try_from(file).ok()? - b'a';
    let row = BOARD_WIDTH - u8::try_from(rank).ok()?;
    Some(row * BOARD_WIDTH + col)
}

/// The four squares the promotion picker occupies, in offer order
/// (queen, knight, rook, bishop).
///
/// The picker extends downward on screen from the promotion square, at
/// displayed offsets 0, 8, 16 and 24; the result is in logical indices.
/// Promotions land on the viewer's far row, where the picker always fits.
/// For a trigger too low on screen the picker extends upward instead, so
/// the four squares are always distinct and on the board.
#[must_use]
pub fn promotion_offer_squares(trigger: u8, flipped: bool) -> [u8; 4] {
    let displayed = display_index(trigger.min(LAST_SQUARE), flipped);
    let fits_below = row_of(displayed) + 3 < BOARD_WIDTH;
    let mut squares = [trigger; 4];
    for (slot, offset) in squares.iter_mut().zip([0_u8, 8, 16, 24]) {
        let shown = if fits_below { displayed + offset } else { displayed - offset };
        *slot = display_index(shown, flipped);
    }
    squares
}

/// Promotion piece offered on `square`, when it is one of the picker squares.
#[must_use]
pub fn promotion_choice(trigger: u8, square: u8, flipped: bool) -> Option<PromotionPiece> {
    promotion_offer_squares(trigger, flipped)
        .iter()
        .position(|offered| *offered == square)
        .map(|slot| PromotionPiece::OFFER_ORDER[slot])
}
