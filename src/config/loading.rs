use std::{fs, path::Path};

use tracing::{debug, instrument};

use super::Config;
use crate::{
    AutopowerError, Result,
    services::{SourceKind, gmrender::state_match_rule},
};

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// A missing file is not an error; the defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file exists but cannot be read
    /// - The TOML content is invalid
    /// - Validation of the parsed values fails
    #[instrument]
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("No configuration file found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content, Some(path))
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    /// Returns error if the TOML is invalid or validation fails
    pub fn from_toml(content: &str, path: Option<&Path>) -> Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| AutopowerError::toml_parse(e, path))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that the type system cannot.
    ///
    /// # Errors
    /// Returns `AutopowerError::ConfigValidation` naming the offending section
    pub fn validate(&self) -> Result<()> {
        self.power
            .debounce()
            .map_err(|e| AutopowerError::validation("power", e.to_string()))?;

        if !self.actions.step_delay.is_finite() || self.actions.step_delay < 0.0 {
            return Err(AutopowerError::validation(
                "actions",
                format!(
                    "step_delay must be a non-negative number, got {}",
                    self.actions.step_delay
                ),
            ));
        }

        if let Some(uuid) = &self.source.uuid {
            if self.source.kind != SourceKind::Gmrender {
                return Err(AutopowerError::validation(
                    "source",
                    "uuid only applies to the gmrender source",
                ));
            }
            state_match_rule(Some(uuid.as_str())).map_err(|e| {
                AutopowerError::validation("source", format!("invalid uuid '{uuid}': {e}"))
            })?;
        }

        let mut steps = self.actions.activate.iter().chain(&self.actions.deactivate);
        if steps.any(|step| step.program.trim().is_empty()) {
            return Err(AutopowerError::validation(
                "actions",
                "every command step needs a program",
            ));
        }

        Ok(())
    }
}
