//! Route decoded server messages into the match store.

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;

use frames::ServerMessage;

use crate::state::match_state::MatchState;

/// Apply one inbound message. Returns whether the store changed.
///
/// Protocol errors are logged and dropped; the session carries on.
pub fn dispatch_message(message: ServerMessage, state: &mut MatchState) -> bool {
    match message {
        ServerMessage::SendPlayerCode(code) => {
            let assigned = state.assign_player(code);
            if assigned {
                tracing::info!(match_id = %state.match_id(), role = ?state.player(), "player role assigned");
            }
            assigned
        }
        ServerMessage::OnConnect(body) => {
            if let Err(e) = state.apply_connect(body) {
                tracing::warn!(match_id = %state.match_id(), error = %e, "onConnect history dropped");
            }
            // Presence is applied even when the history is not.
            true
        }
        ServerMessage::ConnectionStatus(body) => {
            state.apply_connection_status(body);
            true
        }
        ServerMessage::OnMove(body) => match state.apply_move_update(body) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(match_id = %state.match_id(), error = %e, "onMove dropped");
                false
            }
        },
        ServerMessage::OpponentEvent(body) => {
            state.set_opponent_event(body.event_type);
            true
        }
        ServerMessage::Unknown { message_type } => {
            tracing::warn!(match_id = %state.match_id(), message_type = %message_type, "unrecognized message type");
            false
        }
    }
}
