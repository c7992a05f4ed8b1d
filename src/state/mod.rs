//! Client-side state for a match room.
//!
//! SYSTEM CONTEXT
//! ==============
//! These stores are plain structs with no I/O. The match connection mutates
//! them in response to server pushes; front ends read snapshots and render.

pub mod clock;
pub mod match_state;
