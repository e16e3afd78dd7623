use std::io;

/// Errors that can occur while driving the power controller
#[derive(thiserror::Error, Debug)]
pub enum PowerError {
    /// A status string did not name a known playback status
    #[error("Invalid playback status: {0:?}")]
    InvalidStatus(String),

    /// A debounce duration was negative or not finite
    #[error("Invalid {name} timeout: {secs} seconds")]
    InvalidTimeout {
        /// Which timeout was rejected
        name: &'static str,
        /// Rejected value in seconds
        secs: f64,
    },

    /// The activate action failed; the controller still considers itself active
    #[error("Activation failed: {0}")]
    ActivationFailure(#[source] ActionError),

    /// The deactivate action failed; the controller still considers itself idle
    #[error("Deactivation failed: {0}")]
    DeactivationFailure(#[source] ActionError),

    /// An update arrived that the transition table cannot accept
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// The controller worker has shut down
    #[error("Power controller is no longer running")]
    ControllerClosed,
}

/// Errors raised by device actions
#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    /// The external command could not be started
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The external command exited unsuccessfully
    #[error("'{program}' exited with {status}")]
    CommandFailed {
        /// Program that failed
        program: String,
        /// Exit status description
        status: String,
    },

    /// Any other action failure
    #[error("{0}")]
    Other(String),
}
