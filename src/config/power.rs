use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::power::{DebounceConfig, PowerError, TimerBackend};

/// Power-off delays
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PowerConfig {
    /// Disable system power when paused for this duration (seconds).
    pub pause_timeout: f64,

    /// Disable system power when stopped for this duration (seconds).
    pub stop_timeout: f64,

    /// Implementation backing the shutdown timer.
    pub timer: TimerBackend,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            pause_timeout: 60.0,
            stop_timeout: 5.0,
            timer: TimerBackend::default(),
        }
    }
}

impl PowerConfig {
    /// Convert the configured timeouts into controller delays
    ///
    /// # Errors
    /// Returns `PowerError::InvalidTimeout` for negative or non-finite timeouts
    pub fn debounce(&self) -> Result<DebounceConfig, PowerError> {
        DebounceConfig::from_secs(self.pause_timeout, self.stop_timeout)
    }
}
