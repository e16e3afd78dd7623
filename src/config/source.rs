use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::services::{BusKind, SourceKind};

/// Playback event source configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct SourceConfig {
    /// Which kind of player to follow.
    pub kind: SourceKind,

    /// Bus on which players are watched.
    pub bus: BusKind,

    /// List of player bus name patterns to ignore during discovery (mpris only)
    pub ignored_players: Vec<String>,

    /// Follow only the gmrender-resurrect instance with this UUID (gmrender only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}
