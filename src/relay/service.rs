use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use super::events::RelayFrame;
use super::router::{EventRouter, PeerSender};

/// Commands fed to the relay task by connection handlers.
#[derive(Debug)]
pub enum RelayCommand {
    Connect { connection_id: String },
    Frame { connection_id: String, frame: RelayFrame },
    Disconnect { connection_id: String },
}

/// Cloneable entry point to the relay. Every send is fire-and-forget;
/// once the relay task is gone the commands land nowhere, which only
/// happens during shutdown.
#[derive(Clone)]
pub struct RelayHandle {
    commands: mpsc::UnboundedSender<RelayCommand>,
}

impl RelayHandle {
    pub fn connect(&self, connection_id: &str) {
        let _ = self.commands.send(RelayCommand::Connect {
            connection_id: connection_id.to_string(),
        });
    }

    pub fn frame(&self, connection_id: &str, frame: RelayFrame) {
        let _ = self.commands.send(RelayCommand::Frame {
            connection_id: connection_id.to_string(),
            frame,
        });
    }

    pub fn disconnect(&self, connection_id: &str) {
        let _ = self.commands.send(RelayCommand::Disconnect {
            connection_id: connection_id.to_string(),
        });
    }
}

/// The relay task. It is the only owner of the router, so commands are
/// applied strictly in arrival order and each one runs to completion
/// before the next. That ordering is what keeps per-sender delivery
/// FIFO without any locking.
pub struct RelayService {
    router: EventRouter,
    commands: mpsc::UnboundedReceiver<RelayCommand>,
}

impl RelayService {
    pub fn new(transport: Arc<dyn PeerSender>) -> (RelayHandle, RelayService) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = RelayHandle { commands: sender };
        let service = RelayService {
            router: EventRouter::new(transport),
            commands: receiver,
        };
        (handle, service)
    }

    /// Spawns the relay task onto the runtime and returns its handle.
    pub fn spawn(transport: Arc<dyn PeerSender>) -> RelayHandle {
        let (handle, service) = RelayService::new(transport);
        tokio::spawn(service.run());
        handle
    }

    /// Processes commands until every handle has been dropped.
    pub async fn run(mut self) {
        info!("Relay service started");
        while let Some(command) = self.commands.recv().await {
            self.apply(command);
        }
        info!("Relay service stopped");
    }

    fn apply(&mut self, command: RelayCommand) {
        match command {
            RelayCommand::Connect { connection_id } => {
                self.router.connection_opened(&connection_id)
            }
            RelayCommand::Frame {
                connection_id,
                frame,
            } => self.router.handle_frame(&connection_id, frame),
            RelayCommand::Disconnect { connection_id } => {
                self.router.connection_closed(&connection_id)
            }
        }
    }
}
