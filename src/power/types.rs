use std::{fmt, str::FromStr, time::Duration};

use super::PowerError;

/// Unique identifier for a playback source
///
/// The well-known MPRIS bus name of a player, or the object path of a
/// gmrender-resurrect instance. An id may be reused after the player
/// disappears; the re-added player is treated as new.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a PlayerId from a D-Bus bus name
    pub fn from_bus_name(bus_name: &str) -> Self {
        Self(bus_name.to_string())
    }

    /// Get the D-Bus bus name
    pub fn bus_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(name: &str) -> Self {
        Self::from_bus_name(name)
    }
}

/// Playback status reported by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Player is currently playing
    Playing,

    /// Player is paused
    Paused,

    /// Player is stopped
    Stopped,
}

impl FromStr for PlaybackStatus {
    type Err = PowerError;

    /// Parses MPRIS status strings, plus the UPnP transport states emitted by
    /// gmrender-resurrect.
    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "Playing" | "PLAYING" => Ok(Self::Playing),
            "Paused" | "PAUSED_PLAYBACK" => Ok(Self::Paused),
            "Stopped" | "STOPPED" => Ok(Self::Stopped),
            other => Err(PowerError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Playing => write!(f, "Playing"),
            PlaybackStatus::Paused => write!(f, "Paused"),
            PlaybackStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Aggregate power state of the managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    /// Resource is off and nothing is pending
    #[default]
    Idle,

    /// Resource is on
    Active,

    /// Resource is on, waiting out the long pause delay
    Paused,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Idle => write!(f, "idle"),
            PowerState::Active => write!(f, "active"),
            PowerState::Paused => write!(f, "paused"),
        }
    }
}

/// Which of the two shutdown delays a pending timer was armed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceKind {
    /// Long delay, armed when the last player pauses
    Pause,

    /// Short delay, armed when the last player stops
    Stop,
}

impl fmt::Display for DebounceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebounceKind::Pause => write!(f, "long"),
            DebounceKind::Stop => write!(f, "short"),
        }
    }
}

/// The two shutdown delays used by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Delay before powering off after the last player pauses
    pub pause: Duration,

    /// Delay before powering off after the last player stops
    pub stop: Duration,
}

impl DebounceConfig {
    /// Create a debounce configuration from durations
    pub fn new(pause: Duration, stop: Duration) -> Self {
        Self { pause, stop }
    }

    /// Create a debounce configuration from fractional seconds.
    ///
    /// # Errors
    /// Returns `PowerError::InvalidTimeout` if either value is negative or not finite
    pub fn from_secs(pause_secs: f64, stop_secs: f64) -> Result<Self, PowerError> {
        Ok(Self {
            pause: duration_from_secs("pause", pause_secs)?,
            stop: duration_from_secs("stop", stop_secs)?,
        })
    }

    /// Delay associated with a debounce kind
    pub fn delay(&self, kind: DebounceKind) -> Duration {
        match kind {
            DebounceKind::Pause => self.pause,
            DebounceKind::Stop => self.stop,
        }
    }
}

fn duration_from_secs(name: &'static str, secs: f64) -> Result<Duration, PowerError> {
    Duration::try_from_secs_f64(secs).map_err(|_| PowerError::InvalidTimeout { name, secs })
}

/// Point-in-time view of a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    /// Current power state
    pub state: PowerState,

    /// Players currently reporting Playing, sorted
    pub active_players: Vec<PlayerId>,

    /// Kind of the pending shutdown timer, if any
    pub pending_timer: Option<DebounceKind>,
}
