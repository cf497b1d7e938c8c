//! # Playback Error Types
//!
//! Error types for player controller operations.
//!
//! Engine runtime errors reported through the `on_error` callback are not
//! represented here: they are forwarded to the notifier and never abort a
//! controller operation.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The source could not be opened, bound or synchronously prepared.
    #[error("{message}: {source}")]
    ResourceAccess {
        message: String,
        #[source]
        source: BridgeError,
    },

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// An engine control call failed during normal operation.
    #[error("Engine operation failed: {0}")]
    Engine(#[from] BridgeError),

    /// The platform audio-focus API failed.
    #[error("Audio focus request failed: {0}")]
    Focus(#[source] BridgeError),

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// Invalid playback rate (must be finite and positive).
    #[error("Invalid playback rate: {0} (must be greater than 0.0)")]
    InvalidPlaybackRate(f32),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The engine reported failures while being torn down. The handle has
    /// been dropped regardless.
    #[error("Engine release failed: {0}")]
    ReleaseFailed(String),

    /// Player defaults failed validation.
    #[error("Invalid player configuration: {0}")]
    Config(String),

    /// The shared runtime configuration is unusable.
    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Wrap a bridge failure raised while accessing a media resource.
    pub fn resource_access(message: impl Into<String>, source: BridgeError) -> Self {
        PlaybackError::ResourceAccess {
            message: message.into(),
            source,
        }
    }

    /// Returns `true` if the error was caused by rejected caller input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidVolume(_)
                | PlaybackError::InvalidPlaybackRate(_)
                | PlaybackError::Config(_)
        )
    }

    /// Returns `true` if the underlying resource could not be reached.
    pub fn is_resource_error(&self) -> bool {
        matches!(self, PlaybackError::ResourceAccess { .. })
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
