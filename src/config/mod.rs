//! Configuration schema definitions and validation.
//!
//! The configuration is read from a single TOML file. Every section and
//! field has a default, so an empty or missing file is valid.

mod actions;
mod general;
mod loading;
mod paths;
mod power;
mod source;


pub use actions::ActionsConfig;
pub use general::{GeneralConfig, LogFormat, LogLevel};
pub use paths::ConfigPaths;
pub use power::PowerConfig;
pub use source::SourceConfig;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Power-off delays.
    #[serde(default)]
    pub power: PowerConfig,

    /// Where playback status comes from.
    #[serde(default)]
    pub source: SourceConfig,

    /// What switching power on and off does.
    #[serde(default)]
    pub actions: ActionsConfig,
}
