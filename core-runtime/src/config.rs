//! # Core Configuration Module
//!
//! Provides configuration management for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges every player needs. It enforces
//! fail-fast validation so a missing capability is reported once, at startup,
//! instead of as a confusing failure on the first `play()`.
//!
//! ## Required Dependencies
//!
//! - `EngineFactory` - Creates native playback engines
//!
//! ## Optional Dependencies
//!
//! - `PlayerNotifier` - Host notifications (default: publishes to the [`EventBus`])
//! - `AudioFocusManager` - Needed only when players duck other audio
//! - `AudioRouteControl` - Needed only for communication routing
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .engine_factory(Arc::new(NativeEngineFactory))
//!     .focus_manager(Arc::new(NativeFocusManager))
//!     .build()
//!     .expect("Failed to build config");
//!
//! let mut events = config.event_bus.subscribe();
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics with an actionable message: no EngineFactory was provided
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing engine factory");
//! ```

use crate::error::{Error, Result};
use crate::events::{EventBus, EventBusNotifier, DEFAULT_EVENT_BUFFER_SIZE};
use bridge_traits::{AudioFocusManager, AudioRouteControl, EngineFactory, PlayerNotifier};
use std::sync::Arc;

/// Core configuration shared by every player.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Creates engine handles (required)
    pub engine_factory: Arc<dyn EngineFactory>,

    /// Receives player notifications
    pub notifier: Arc<dyn PlayerNotifier>,

    /// Platform audio focus (optional)
    pub focus_manager: Option<Arc<dyn AudioFocusManager>>,

    /// Platform output routing (optional)
    pub route_control: Option<Arc<dyn AudioRouteControl>>,

    /// Event bus the default notifier publishes to
    pub event_bus: EventBus,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine_factory", &"EngineFactory { ... }")
            .field("notifier", &"PlayerNotifier { ... }")
            .field(
                "focus_manager",
                &self
                    .focus_manager
                    .as_ref()
                    .map(|_| "AudioFocusManager { ... }"),
            )
            .field(
                "route_control",
                &self
                    .route_control
                    .as_ref()
                    .map(|_| "AudioRouteControl { ... }"),
            )
            .field("event_bus", &self.event_bus)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Negotiate audio focus before ducking playback (requires AudioFocusManager)
    pub enable_audio_focus: bool,

    /// Drive speakerphone routing for communication usage (requires AudioRouteControl)
    pub enable_route_control: bool,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// Feature flags must be backed by the bridge they depend on.
    pub fn validate(&self) -> Result<()> {
        if self.features.enable_audio_focus && self.focus_manager.is_none() {
            return Err(Error::Config(
                "Audio focus enabled but no AudioFocusManager provided. \
                 Disable the feature or inject an AudioFocusManager implementation."
                    .to_string(),
            ));
        }

        if self.features.enable_route_control && self.route_control.is_none() {
            return Err(Error::Config(
                "Route control enabled but no AudioRouteControl provided. \
                 Disable the feature or inject an AudioRouteControl implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn engine_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "EngineFactory".to_string(),
        message: "EngineFactory implementation is required to create playback engines. \
                 Mobile: inject the platform media player adapter. \
                 Desktop: inject a native sink adapter."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine_factory: Option<Arc<dyn EngineFactory>>,
    notifier: Option<Arc<dyn PlayerNotifier>>,
    focus_manager: Option<Arc<dyn AudioFocusManager>>,
    route_control: Option<Arc<dyn AudioRouteControl>>,
    event_bus: Option<EventBus>,
    features: Option<FeatureFlags>,
}

impl CoreConfigBuilder {
    /// Sets the engine factory (required).
    pub fn engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    /// Sets the notifier.
    ///
    /// If not provided, notifications are published to the config's
    /// [`EventBus`] through an [`EventBusNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn PlayerNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the audio focus manager and enables audio focus.
    pub fn focus_manager(mut self, manager: Arc<dyn AudioFocusManager>) -> Self {
        self.focus_manager = Some(manager);
        self.features
            .get_or_insert_with(FeatureFlags::default)
            .enable_audio_focus = true;
        self
    }

    /// Sets the route control and enables route control.
    pub fn route_control(mut self, control: Arc<dyn AudioRouteControl>) -> Self {
        self.route_control = Some(control);
        self.features
            .get_or_insert_with(FeatureFlags::default)
            .enable_route_control = true;
        self
    }

    /// Uses an existing event bus instead of creating one.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Overrides all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = Some(features);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` if no `EngineFactory` was provided
    /// - `Config` if feature flags are inconsistent with the provided bridges
    pub fn build(self) -> Result<CoreConfig> {
        let engine_factory = self
            .engine_factory
            .ok_or_else(engine_factory_missing_error)?;

        let event_bus = self
            .event_bus
            .unwrap_or_else(|| EventBus::new(DEFAULT_EVENT_BUFFER_SIZE));

        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(EventBusNotifier::new(event_bus.clone())),
        };

        let config = CoreConfig {
            engine_factory,
            notifier,
            focus_manager: self.focus_manager,
            route_control: self.route_control,
            event_bus,
            features: self.features.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
