//! MPRIS playback status source.
//!
//! Watches `org.mpris.MediaPlayer2.*` players on D-Bus and reports their
//! playback status to a [`PowerController`](crate::power::PowerController).

/// Player discovery and lifecycle management
pub mod discovery;
/// Per-player status monitoring
pub mod monitoring;
/// D-Bus proxy trait definitions
pub mod proxy;

pub use discovery::*;
pub use proxy::*;

/// Bus name prefix shared by all MPRIS players
pub const MPRIS_BUS_PREFIX: &str = "org.mpris.MediaPlayer2.";
