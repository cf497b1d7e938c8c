//! # Player Configuration
//!
//! Initial settings applied to every controller created by a
//! [`PlayerRegistry`](crate::registry::PlayerRegistry), plus the enums the
//! controller uses for its release and routing policies.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happens to the engine after `stop` or natural completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseMode {
    /// Tear the engine down; the next `play` rebuilds it.
    #[default]
    Release,
    /// Loop from position 0 indefinitely. `stop` pauses and rewinds.
    Loop,
    /// Keep the engine warm. `stop` pauses and rewinds.
    Stop,
}

impl ReleaseMode {
    /// Looping flag handed to the engine.
    pub fn is_looping(&self) -> bool {
        matches!(self, ReleaseMode::Loop)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseMode::Release => "release",
            ReleaseMode::Loop => "loop",
            ReleaseMode::Stop => "stop",
        }
    }
}

impl fmt::Display for ReleaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseMode {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(ReleaseMode::Release),
            "loop" => Ok(ReleaseMode::Loop),
            "stop" => Ok(ReleaseMode::Stop),
            other => Err(PlaybackError::Config(format!(
                "unknown release mode '{}'",
                other
            ))),
        }
    }
}

/// Physical output the player is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRoute {
    /// Default loudspeaker output.
    #[default]
    Speakers,
    /// Earpiece or headset, routed through the communication stream.
    Earpiece,
}

impl OutputRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputRoute::Speakers => "speakers",
            OutputRoute::Earpiece => "earpiece",
        }
    }
}

impl fmt::Display for OutputRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputRoute {
    type Err = PlaybackError;

    /// Anything other than `"speakers"` selects the earpiece route.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(PlaybackError::Config("empty output route".to_string()));
        }
        if s.eq_ignore_ascii_case("speakers") {
            Ok(OutputRoute::Speakers)
        } else {
            Ok(OutputRoute::Earpiece)
        }
    }
}

/// Initial controller settings.
///
/// Deserializable so hosts can ship defaults alongside their own settings.
/// Every field is optional in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDefaults {
    /// Volume in `[0.0, 1.0]`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Playback speed multiplier. Applied only once an engine exists.
    ///
    /// Default: 1.0.
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f32,

    #[serde(default)]
    pub release_mode: ReleaseMode,

    #[serde(default)]
    pub output_route: OutputRoute,

    /// Classify playback as ringtone-like so it honours the silent switch.
    #[serde(default)]
    pub respect_silence: bool,

    /// Hold a partial wake lock while an engine exists.
    #[serde(default)]
    pub stay_awake: bool,

    /// Negotiate transient, duckable audio focus before starting.
    #[serde(default)]
    pub duck_audio: bool,
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            playback_rate: default_playback_rate(),
            release_mode: ReleaseMode::default(),
            output_route: OutputRoute::default(),
            respect_silence: false,
            stay_awake: false,
            duck_audio: false,
        }
    }
}

impl PlayerDefaults {
    /// Short UI sounds: keep the engine warm between plays, respect the
    /// silent switch and duck other audio instead of interrupting it.
    pub fn sound_effect() -> Self {
        Self {
            release_mode: ReleaseMode::Stop,
            respect_silence: true,
            duck_audio: true,
            ..Default::default()
        }
    }

    /// Background loops that keep playing with the screen off.
    pub fn background_loop() -> Self {
        Self {
            release_mode: ReleaseMode::Loop,
            stay_awake: true,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::Config(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }

        if !self.playback_rate.is_finite() || self.playback_rate <= 0.0 {
            return Err(PlaybackError::Config(format!(
                "playback_rate must be > 0, got {}",
                self.playback_rate
            )));
        }

        Ok(())
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_playback_rate() -> f32 {
    1.0
}
