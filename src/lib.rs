//! autopower - Switch an amplifier on and off following media playback.
//!
//! Playback status from MPRIS players or gmrender-resurrect renderers is
//! aggregated into a single power decision. Power is switched on as soon as
//! any player plays, and switched off after a debounce delay once none does:
//! a long delay when the last player paused, a short one when it stopped.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use autopower::power::{
//!     DebounceConfig, LogActions, PlaybackStatus, PlayerId, PowerController, TokioTimer,
//! };
//!
//! # async fn demo() -> Result<(), autopower::power::PowerError> {
//! let controller = PowerController::spawn(
//!     DebounceConfig::new(Duration::from_secs(60), Duration::from_secs(5)),
//!     Arc::new(LogActions),
//!     Box::new(TokioTimer::default()),
//! );
//!
//! let player = PlayerId::from_bus_name("org.mpris.MediaPlayer2.spotify");
//! controller.update(player, PlaybackStatus::Playing).await?;
//! # Ok(())
//! # }
//! ```

/// Configuration schema definitions and validation.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Debounced power controller.
pub mod power;

/// Playback status sources.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{AutopowerError, Result};
