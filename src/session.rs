//! One mounted match room: store, connection, and move controller together.
//!
//! Front ends hold a `MatchSession` instead of wiring the three pieces by hand.
//! Clicks go through the controller against a fresh snapshot of the store;
//! completed moves are sent on the connection.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use board::geometry::{BoardGeometry, Point};
use frames::{OpponentEventKind, PlayerEventKind};
use tokio::sync::{Mutex, watch};

use crate::config::ClientConfig;
use crate::interaction::{InputOutcome, MoveController, MoveOracle};
use crate::net::connection::{ConnectionError, Connector, MatchConnection, SharedState};
use crate::state::match_state::MatchState;

pub struct MatchSession<O> {
    connection: MatchConnection,
    controller: MoveController<O>,
}

impl<O: MoveOracle> MatchSession<O> {
    /// Mount a room: fresh store, connection task, idle controller.
    pub fn open(match_id: &str, config: &ClientConfig, oracle: O, connector: impl Connector) -> Self {
        let store = Arc::new(Mutex::new(MatchState::new(match_id)));
        let connection = MatchConnection::open(match_id, config, store, connector);
        tracing::info!(match_id, "match session opened");
        Self { connection, controller: MoveController::new(oracle) }
    }

    #[must_use]
    pub fn store(&self) -> SharedState {
        self.connection.store()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.connection.subscribe()
    }

    #[must_use]
    pub fn connection(&self) -> &MatchConnection {
        &self.connection
    }

    #[must_use]
    pub fn controller(&self) -> &MoveController<O> {
        &self.controller
    }

    /// Input on a logical square. A completed move is sent before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::TaskGone`] when a move completes after the
    /// connection has stopped.
    pub async fn click(&self, square: u8) -> Result<InputOutcome, ConnectionError> {
        let ctx = self.connection.store().lock().await.interaction_context();
        let outcome = self.controller.handle_square(square, &ctx).await;
        self.forward(outcome)
    }

    /// Input at a pointer position on a drawn board.
    ///
    /// # Errors
    ///
    /// Same as [`MatchSession::click`].
    pub async fn click_point(&self, point: Point, geometry: &BoardGeometry) -> Result<InputOutcome, ConnectionError> {
        let ctx = self.connection.store().lock().await.interaction_context();
        let outcome = self.controller.handle_point(point, geometry, &ctx).await;
        self.forward(outcome)
    }

    fn forward(&self, outcome: InputOutcome) -> Result<InputOutcome, ConnectionError> {
        if let InputOutcome::Submit(post) = &outcome {
            self.connection.submit_move(post.clone())?;
        }
        Ok(outcome)
    }

    /// Raise an event of our own (resign, draw offer, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::TaskGone`] after the connection has stopped.
    pub fn send_event(&self, kind: PlayerEventKind) -> Result<(), ConnectionError> {
        self.connection.send_event(kind)
    }

    /// Accept or decline the pending opponent proposal, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::TaskGone`] after the connection has stopped.
    pub async fn resolve_event(&self, accept: bool) -> Result<Option<OpponentEventKind>, ConnectionError> {
        let pending = self.connection.store().lock().await.clear_opponent_event();
        if let Some(kind) = pending {
            let reply = if accept { PlayerEventKind::accepting(kind) } else { PlayerEventKind::declining(kind) };
            self.connection.send_event(reply)?;
        }
        Ok(pending)
    }

    /// Unmount: close the socket for good and drop the selection.
    pub async fn leave(self) {
        self.controller.reset();
        let match_id = self.connection.match_id().to_owned();
        self.connection.close().await;
        tracing::info!(match_id = %match_id, "match session closed");
    }
}
