//! Move Interaction Controller: clicks on the board become move submissions.
//!
//! The controller walks `Bare → Selecting → (PromotionPending) → Bare`.
//! Selecting a piece asks a [`MoveOracle`] for its legal destinations; while
//! that request is in flight a `waiting` guard drops every further input, so
//! interactions never interleave. Server pushes are not guarded and may land
//! while a request is pending; each input works from the
//! [`InteractionContext`] snapshot it was given.
//!
//! The controller never sends anything itself. A completed move comes back
//! as [`InputOutcome::Submit`] for the caller to put on the match connection.

#[cfg(test)]
#[path = "interaction_test.rs"]
mod interaction_test;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use board::geometry::{self, BoardGeometry, Point};
use board::{Color, Position};
use frames::PostMove;

use crate::net::api::{ApiError, LegalMoves};

/// Source of legal destinations for a square.
#[async_trait::async_trait]
pub trait MoveOracle: Send + Sync {
    async fn legal_moves(&self, fen: &str, square: u8) -> Result<LegalMoves, ApiError>;
}

#[async_trait::async_trait]
impl<T: MoveOracle + ?Sized> MoveOracle for std::sync::Arc<T> {
    async fn legal_moves(&self, fen: &str, square: u8) -> Result<LegalMoves, ApiError> {
        (**self).legal_moves(fen, square).await
    }
}

/// What the controller needs to know about the match for one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionContext {
    /// The displayed ply is the live head.
    pub is_latest: bool,
    pub game_over: bool,
    /// Colour the local client plays; `None` for spectators.
    pub player: Option<Color>,
    /// Board currently on screen.
    pub position: Position,
    /// FEN of the live head, sent with legal-move requests.
    pub latest_fen: String,
}

impl InteractionContext {
    fn flipped(&self) -> bool {
        self.player == Some(Color::Black)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing selected.
    #[default]
    Bare,
    /// A piece is selected and its destinations are known.
    Selecting { square: u8, legal: LegalMoves },
    /// A promoting move was chosen; waiting for the piece choice.
    PromotionPending { from: u8, to: u8, legal: LegalMoves },
}

/// Result of one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Dropped: another input is in flight, or the board is not interactive.
    Ignored,
    /// Selection cleared.
    Cleared,
    /// A piece was selected.
    Selected { square: u8, legal: LegalMoves },
    /// Waiting for a promotion choice on one of `offer` (queen, knight, rook, bishop).
    PromotionPending { from: u8, to: u8, offer: [u8; 4] },
    /// A move is ready to send.
    Submit(PostMove),
}

pub struct MoveController<O> {
    oracle: O,
    phase: Mutex<Phase>,
    waiting: AtomicBool,
}

/// Clears the waiting flag when the input handler returns, however it returns.
struct WaitingGuard<'a>(&'a AtomicBool);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<O: MoveOracle> MoveController<O> {
    #[must_use]
    pub fn new(oracle: O) -> Self {
        Self { oracle, phase: Mutex::new(Phase::Bare), waiting: AtomicBool::new(false) }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock_phase().clone()
    }

    /// Whether an input is currently being processed.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::Acquire)
    }

    /// Drop any selection.
    pub fn reset(&self) {
        self.set_phase(Phase::Bare);
    }

    /// Handle a pointer position on a drawn board.
    pub async fn handle_point(&self, point: Point, geometry: &BoardGeometry, ctx: &InteractionContext) -> InputOutcome {
        match geometry.square_at(point, ctx.flipped()) {
            Some(square) => self.handle_square(square, ctx).await,
            None => {
                let Some(_guard) = self.begin() else {
                    return InputOutcome::Ignored;
                };
                self.set_phase(Phase::Bare);
                InputOutcome::Cleared
            }
        }
    }

    /// Handle an input on logical square `square`.
    pub async fn handle_square(&self, square: u8, ctx: &InteractionContext) -> InputOutcome {
        let Some(_guard) = self.begin() else {
            return InputOutcome::Ignored;
        };

        if !ctx.is_latest || ctx.game_over {
            return InputOutcome::Ignored;
        }

        let phase = self.phase();

        if let Phase::PromotionPending { from, to, .. } = &phase {
            if let Some(piece) = geometry::promotion_choice(*to, square, ctx.flipped()) {
                self.set_phase(Phase::Bare);
                return InputOutcome::Submit(PostMove::new(*from, *to, Some(piece)));
            }
        }

        let (selected, legal) = match &phase {
            Phase::Bare => (None, None),
            Phase::Selecting { square, legal } => (Some(*square), Some(legal)),
            Phase::PromotionPending { from, legal, .. } => (Some(*from), Some(legal)),
        };

        if let (Some(from), Some(legal)) = (selected, legal) {
            if legal.contains(square) {
                if legal.trigger_promotion {
                    self.set_phase(Phase::PromotionPending { from, to: square, legal: legal.clone() });
                    return InputOutcome::PromotionPending {
                        from,
                        to: square,
                        offer: geometry::promotion_offer_squares(square, ctx.flipped()),
                    };
                }
                self.set_phase(Phase::Bare);
                return InputOutcome::Submit(PostMove::new(from, square, None));
            }
        }

        let owns_piece = ctx
            .position
            .piece_at(square)
            .is_some_and(|piece| Some(piece.color) == ctx.player);
        if owns_piece && selected != Some(square) {
            let legal = match self.oracle.legal_moves(&ctx.latest_fen, square).await {
                Ok(legal) => legal,
                Err(e) => {
                    tracing::warn!(square, error = %e, "legal moves lookup failed; treating as none");
                    LegalMoves::default()
                }
            };
            self.set_phase(Phase::Selecting { square, legal: legal.clone() });
            return InputOutcome::Selected { square, legal };
        }

        self.set_phase(Phase::Bare);
        InputOutcome::Cleared
    }

    fn begin(&self) -> Option<WaitingGuard<'_>> {
        self.waiting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| WaitingGuard(&self.waiting))
    }

    fn set_phase(&self, phase: Phase) {
        *self.lock_phase() = phase;
    }

    fn lock_phase(&self) -> std::sync::MutexGuard<'_, Phase> {
        // The phase is plain data; a panic elsewhere cannot leave it half-written.
        self.phase.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
