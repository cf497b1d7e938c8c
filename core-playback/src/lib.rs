//! # Playback Controller Module
//!
//! Per-player audio playback state machine on top of a host-provided engine.
//!
//! ## Overview
//!
//! This module handles:
//! - The player lifecycle (load, prepare, play, pause/stop, release) as an
//!   explicit state machine ([`state`])
//! - Deferred play and seek intent while the engine prepares
//! - Source binding for URLs, local files and in-memory buffers ([`source`])
//! - Audio focus negotiation for ducking playback ([`focus`])
//! - Audio attributes and output routing ([`attributes`])
//! - A registry of controllers keyed by player id ([`registry`])
//!
//! Audio is never decoded here; the engine behind
//! [`bridge_traits::PlaybackEngine`] does that.

pub mod attributes;
pub mod config;
pub mod controller;
pub mod error;
pub mod focus;
pub mod registry;
pub mod source;
pub mod state;

pub use config::{OutputRoute, PlayerDefaults, ReleaseMode};
pub use controller::{ControllerEvent, PlayerController, RateChange};
pub use error::{PlaybackError, Result};
pub use registry::PlayerRegistry;
pub use source::PlayerSource;
pub use state::PlayerState;
