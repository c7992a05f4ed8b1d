//! Headless client for live chess matches.
//!
//! A match room is three cooperating pieces: the store of server-pushed state,
//! the socket that feeds it, and the controller that turns board input into
//! moves. [`session::MatchSession`] holds all three for one room. Matchmaking,
//! auth, and legal-move lookups go over REST/SSE through [`net::api::ApiClient`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`state`] | Match State Store and display clock |
//! | [`net`] | Match Connection, message dispatch, REST/SSE client |
//! | [`interaction`] | Move Interaction Controller |
//! | [`session`] | Store + connection + controller for one mounted room |
//! | [`config`] | Environment-driven client configuration |

pub mod config;
pub mod interaction;
pub mod net;
pub mod session;
pub mod state;

pub use config::{ClientConfig, ConfigError};
pub use interaction::{InputOutcome, InteractionContext, MoveController, MoveOracle, Phase};
pub use net::api::{ApiClient, ApiError, LegalMoves, LiveMatch};
pub use net::connection::{
    ConnectionError, Connector, MatchConnection, ReconnectPolicy, SharedState, TungsteniteConnector,
};
pub use net::sse::MatchAssignment;
pub use session::MatchSession;
pub use state::clock::DisplayClock;
pub use state::match_state::{MatchState, PlayerRole, StateError};
