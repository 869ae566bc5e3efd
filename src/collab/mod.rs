//! Multi-client editing of shared documents.
//!
//! A [`Hub`] owns every session [`Room`]. Connections join one room, send
//! [`Command`]s, and receive the full document state after every change.

pub mod hub;
pub mod protocol;
pub mod room;
pub mod state;

pub use hub::Hub;
pub use protocol::{Command, ServerMessage, StateSnapshot};
pub use room::{ConnectionId, Room, SessionState};
