/// Errors that can occur while watching players on the bus
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Failed to connect to the bus or subscribe to signals
    #[error("Failed to initialize playback source: {0}")]
    InitializationFailed(String),

    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),
}
