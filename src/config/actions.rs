use std::{sync::Arc, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    AutopowerError, Result,
    power::{CommandActions, CommandStep, LogActions, PowerActions},
};

/// Device actions run when power is switched on or off.
///
/// Example:
///
/// ```toml
/// [actions]
/// step_delay = 1.0
///
/// [[actions.activate]]
/// program = "ir-ctl"
/// args = ["-d", "/dev/lirc1", "--scancode", "necx:0x404003"]
///
/// [[actions.deactivate]]
/// program = "ir-ctl"
/// args = ["-d", "/dev/lirc1", "--scancode", "necx:0x404000"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ActionsConfig {
    /// Pause between consecutive steps of one actuation (seconds).
    pub step_delay: f64,

    /// Commands run in order to switch power on.
    pub activate: Vec<CommandStep>,

    /// Commands run in order to switch power off.
    pub deactivate: Vec<CommandStep>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            step_delay: 1.0,
            activate: Vec::new(),
            deactivate: Vec::new(),
        }
    }
}

impl ActionsConfig {
    /// Whether any command is configured
    pub fn has_commands(&self) -> bool {
        !self.activate.is_empty() || !self.deactivate.is_empty()
    }

    /// Build the device actions described by this configuration.
    ///
    /// Falls back to log-only actions when `dry_run` is set or no command is
    /// configured.
    ///
    /// # Errors
    /// Returns `AutopowerError::ConfigValidation` if `step_delay` is invalid
    pub fn build(&self, dry_run: bool) -> Result<Arc<dyn PowerActions>> {
        if dry_run || !self.has_commands() {
            info!("No device commands in use, power changes are only logged");
            return Ok(Arc::new(LogActions));
        }

        let step_delay = Duration::try_from_secs_f64(self.step_delay).map_err(|_| {
            AutopowerError::validation(
                "actions",
                format!("step_delay must be a non-negative number, got {}", self.step_delay),
            )
        })?;

        Ok(Arc::new(CommandActions::new(
            self.activate.clone(),
            self.deactivate.clone(),
            step_delay,
        )))
    }
}
