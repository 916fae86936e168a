//! WebSocket support for live form state.
//!
//! Clients connect to a form and receive a snapshot after every transition,
//! whether it was caused by their own messages, another connection or the
//! HTTP routes. They can also drive the form over the socket.

mod manager;
mod protocol;

pub use manager::ConnectionManager;
pub use protocol::*;
