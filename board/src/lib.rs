//! Board model for the match client: pieces, FEN codec, and board geometry.
//!
//! Nothing in this crate performs I/O. A [`fen::Position`] is produced fresh
//! from every FEN string the server pushes and is never mutated afterwards;
//! the geometry helpers map pointer coordinates onto logical square indices
//! so input handling can stay independent of how the board is drawn.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`piece`] | Colours, piece kinds, promotion choices, and their letters |
//! | [`fen`] | FEN parsing and placement serialization |
//! | [`geometry`] | Pointer → square mapping, board flip, promotion offer squares |
//! | [`consts`] | Board dimensions and fixed FEN strings |

pub mod consts;
pub mod fen;
pub mod geometry;
pub mod piece;

pub use fen::{CastlingRights, EncodingError, Position};
pub use piece::{Color, Piece, PieceKind, PromotionPiece};
