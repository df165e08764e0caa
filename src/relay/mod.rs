// Public API - what other modules can use
pub use events::{RelayEventKind, RelayFrame};
pub use registry::{ConnectionRecord, ConnectionRegistry};
pub use rooms::{LeaveResult, RoomDirectory};
pub use router::{EventRouter, PeerSender};
pub use service::{RelayCommand, RelayHandle, RelayService};

// Internal modules
mod events;
mod registry;
mod rooms;
mod router;
mod service;
