//! Debounced power control driven by playback status.
//!
//! A [`PowerController`] aggregates the status of any number of players into
//! one decision: switch the resource on as soon as anything plays, and switch
//! it off once nothing has played for a while. The delay is long when the
//! last player paused and short when it stopped.

/// Device actions invoked on activation and deactivation
pub mod actions;
/// Controller handle and worker task
pub mod controller;
/// Power controller error types
pub mod error;
/// Status transition table
pub mod machine;
/// Active player bookkeeping
pub mod registry;
/// Debounce timer backends
pub mod timer;
/// Player, status and state types
pub mod types;

#[cfg(test)]
mod tests;

pub use actions::*;
pub use controller::*;
pub use error::*;
pub use timer::*;
pub use types::*;
