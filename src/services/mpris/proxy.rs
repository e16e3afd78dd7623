#![allow(missing_docs)]

use zbus::{Result, proxy};

/// MPRIS MediaPlayer2 interface proxy
///
/// Used to look up a player's human-readable name
#[proxy(
    interface = "org.mpris.MediaPlayer2",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2 {
    /// Human-readable name of the player
    #[zbus(property)]
    fn identity(&self) -> Result<String>;
}

/// MPRIS MediaPlayer2.Player interface proxy
///
/// Only the playback status is of interest for power control
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2Player {
    /// Current playback status (Playing, Paused, Stopped)
    #[zbus(property)]
    fn playback_status(&self) -> Result<String>;
}
