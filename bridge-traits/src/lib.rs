//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the player core and the
//! platform-specific pieces it orchestrates but never implements itself: the
//! native decode/render engine, the audio-focus and routing APIs, and the
//! notification channel back to the host UI.
//!
//! ## Traits
//!
//! ### Playback
//! - [`EngineFactory`](engine::EngineFactory) - Creates exclusively owned engine handles
//! - [`PlaybackEngine`](engine::PlaybackEngine) - One native playback resource
//! - [`EngineListeners`](engine::EngineListeners) - Named callback slots an engine invokes
//!
//! ### Audio Session
//! - [`AudioFocusManager`](session::AudioFocusManager) - Request/abandon audio focus
//! - [`AudioRouteControl`](session::AudioRouteControl) - Speakerphone routing
//!
//! ### Host Integration
//! - [`PlayerNotifier`](notify::PlayerNotifier) - Fire-and-forget state notifications
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert native failures into `BridgeError` and keep
//! the original message, since the core surfaces it to clients unchanged.
//!
//! ## Thread Safety
//!
//! Shared capabilities require `Send + Sync` on native targets (see
//! [`platform`]); engine handles only need `Send` because each one is owned by
//! exactly one player.
//!
//! ## Examples
//!
//! ### Implementing EngineFactory
//!
//! ```ignore
//! use bridge_traits::engine::{EngineFactory, PlaybackEngine};
//! use bridge_traits::error::Result;
//!
//! pub struct NativeEngineFactory;
//!
//! impl EngineFactory for NativeEngineFactory {
//!     fn create_engine(&self) -> Result<Box<dyn PlaybackEngine>> {
//!         Ok(Box::new(NativeEngine::new()?))
//!     }
//! }
//! ```

pub mod engine;
pub mod error;
pub mod logging;
pub mod notify;
pub mod platform;
pub mod session;

pub use error::BridgeError;

// Re-export commonly used types
pub use engine::{
    AudioAttributes, ContentType, EngineEvent, EngineFactory, EngineListeners, EngineSource,
    MediaBuffer, MediaErrorExtra, MediaErrorWhat, PlaybackEngine, UsageCategory,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use notify::{PlayerId, PlayerNotifier};
pub use session::{
    AudioFocusManager, AudioRouteControl, FocusChange, FocusGain, FocusListener, FocusRequest,
    FocusRequestId, FocusRequestResult,
};
