// Library crate for the coedit collaborative document server
// This file exposes the public API for integration tests

pub mod auth;
pub mod document;
pub mod relay;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use relay::{PeerSender, RelayEventKind, RelayFrame, RelayHandle, RelayService};
pub use shared::{AppError, AppState};
pub use websockets::{ConnectionManager, MessageHandler, RelayReceiveHandler};
