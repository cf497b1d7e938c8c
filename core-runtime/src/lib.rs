//! # Core Runtime Module
//!
//! Runtime plumbing shared by every audio player instance:
//! - Logging and tracing infrastructure
//! - Host bridge configuration (`CoreConfig`)
//! - Player event bus
//!
//! ## Overview
//!
//! The playback crate never talks to the host directly. It receives the
//! engine factory, notifier and optional focus/route bridges through a
//! validated [`config::CoreConfig`], and reports through a
//! [`bridge_traits::PlayerNotifier`] which by default publishes onto the
//! [`events::EventBus`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use error::{Error, Result};
pub use events::{EventBus, EventBusNotifier, EventSeverity, EventStream, PlayerEvent};
