// Public API
pub use connection_manager::ConnectionManager;
pub use handler::{websocket_handler, RelayReceiveHandler};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod connection_manager;
mod handler;
mod socket;
