use std::fmt;

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use zbus::Connection;

use super::SourceError;

/// Which message bus players are watched on
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, ValueEnum, PartialEq, Eq, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// The system bus, used by headless renderers running as services.
    #[default]
    System,

    /// The per-user session bus, used by desktop players.
    Session,
}

impl BusKind {
    /// Open a connection to this bus
    ///
    /// # Errors
    /// Returns `SourceError::InitializationFailed` if the bus is unreachable
    pub async fn connect(self) -> Result<Connection, SourceError> {
        let connection = match self {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        };

        connection.map_err(|e| {
            SourceError::InitializationFailed(format!("D-Bus {self} connection failed: {e}"))
        })
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::System => write!(f, "system"),
            BusKind::Session => write!(f, "session"),
        }
    }
}
