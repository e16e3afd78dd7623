mod log_level;

pub use log_level::{LogFormat, LogLevel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// General configuration settings.
///
/// Contains settings that affect the process as a whole, such as logging.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level for the application.
    pub log_level: LogLevel,

    /// Format of console log output.
    pub log_format: LogFormat,

    /// Also write logs to a daily rotated file in the data directory.
    pub log_to_file: bool,
}
