//! Playback status sources.
//!
//! Each source watches a message bus and reports playback status to a
//! [`PowerController`](crate::power::PowerController).

/// Bus selection and connection
pub mod bus;
/// Source error types
pub mod error;
/// gmrender-resurrect transport state source
pub mod gmrender;
/// MPRIS playback status source
pub mod mpris;

pub use bus::*;
pub use error::*;

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which source feeds playback status to the controller
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, ValueEnum, PartialEq, Eq, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Every MPRIS player on the bus.
    #[default]
    Mpris,

    /// The `State` signal of gmrender-resurrect UPnP renderers.
    Gmrender,
}
