//! Player identity and the host notification surface.

use crate::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque, stable identifier of a playback slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One-way notifications from a player to the host UI layer.
///
/// Calls are fire-and-forget: implementations must not block and must not
/// call back into the player synchronously.
pub trait PlayerNotifier: PlatformSendSync {
    /// Media duration became available after preparation.
    fn notify_duration(&self, player_id: &PlayerId, duration: Option<Duration>);

    /// Playback actually started.
    fn notify_playing(&self, player_id: &PlayerId);

    /// Natural end of media was reached.
    fn notify_completion(&self, player_id: &PlayerId);

    /// A seek finished.
    fn notify_seek_complete(&self, player_id: &PlayerId);

    /// The engine reported an error.
    fn notify_error(&self, player_id: &PlayerId, message: &str);
}
