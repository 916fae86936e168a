//! Request handlers shared by the HTTP routes and the WebSocket protocol.

mod books;
mod forms;
mod websocket;

pub use books::*;
pub use forms::*;
pub use websocket::handle_websocket_connection;
