//! Network layer: the live match socket and the REST/SSE API.

pub mod api;
pub mod connection;
pub mod dispatch;
pub mod sse;
