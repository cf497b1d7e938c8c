//! # Player State Machine
//!
//! The controller's lifecycle as an explicit enum and a pure transition
//! function. [`PlayerState::apply`] decides the next state and the engine
//! [`Action`] the controller must perform; it never touches the engine.
//!
//! ```text
//!              set_source / play
//!   Released ───────────────────▶ Loading { play_when_ready }
//!      ▲                                │ on_prepared
//!      │ release / stop(Release)        ▼
//!      └──────────────────────── Prepared { playing }
//! ```
//!
//! The play intent may be set while loading; it is consumed when the engine
//! reports ready.

use crate::config::ReleaseMode;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of a player controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlayerState {
    /// No engine handle exists.
    #[default]
    Released,
    /// Engine created and source bound; asynchronous preparation pending.
    Loading { play_when_ready: bool },
    /// Engine ready for the current source.
    Prepared { playing: bool },
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Client intent to play, after any focus negotiation.
    Play,
    Pause,
    Stop { release_mode: ReleaseMode },
    Release,
    /// The engine finished asynchronous preparation.
    Prepared,
    /// A different source was requested.
    Rebind,
}

/// Engine work the controller performs for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Create a new handle, bind the current source and prepare asynchronously.
    CreateBindPrepare,
    /// Reset the existing handle, bind the current source and prepare asynchronously.
    ResetBindPrepare,
    /// Start the engine and notify playing.
    Start,
    Pause,
    /// Pause the engine and seek to position 0.
    PauseAndRewind,
    /// Rewind to position 0 once the engine becomes ready.
    DeferRewind,
    /// Stop (if `stop_first`), reset and release the handle.
    Teardown { stop_first: bool },
    /// Notify duration, start if `start`, then apply the pending seek.
    Ready { start: bool },
}

impl PlayerState {
    /// Returns `true` when no engine handle should exist.
    pub fn is_released(&self) -> bool {
        matches!(self, PlayerState::Released)
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self, PlayerState::Prepared { .. })
    }

    /// Client-visible play intent, including intent buffered while loading.
    pub fn wants_playback(&self) -> bool {
        matches!(
            self,
            PlayerState::Loading {
                play_when_ready: true
            } | PlayerState::Prepared { playing: true }
        )
    }

    /// Returns `true` only when the engine is prepared and playing.
    pub fn is_actually_playing(&self) -> bool {
        matches!(self, PlayerState::Prepared { playing: true })
    }

    /// Compute the next state and the engine action for `transition`.
    pub fn apply(self, transition: Transition) -> (PlayerState, Action) {
        use PlayerState::*;

        match (self, transition) {
            // Play
            (Released, Transition::Play) => (
                Loading {
                    play_when_ready: true,
                },
                Action::CreateBindPrepare,
            ),
            (Loading { .. }, Transition::Play) => (
                Loading {
                    play_when_ready: true,
                },
                Action::None,
            ),
            (Prepared { playing: false }, Transition::Play) => {
                (Prepared { playing: true }, Action::Start)
            }
            (Prepared { playing: true }, Transition::Play) => (self, Action::None),

            // Pause
            (Loading { .. }, Transition::Pause) => (
                Loading {
                    play_when_ready: false,
                },
                Action::None,
            ),
            (Prepared { playing: true }, Transition::Pause) => {
                (Prepared { playing: false }, Action::Pause)
            }
            (_, Transition::Pause) => (self, Action::None),

            // Stop and release
            (Released, Transition::Stop { .. }) | (Released, Transition::Release) => {
                (Released, Action::None)
            }
            (
                _,
                Transition::Stop {
                    release_mode: ReleaseMode::Release,
                },
            )
            | (_, Transition::Release) => (
                Released,
                Action::Teardown {
                    stop_first: self.wants_playback(),
                },
            ),
            (Prepared { playing: true }, Transition::Stop { .. }) => {
                (Prepared { playing: false }, Action::PauseAndRewind)
            }
            (
                Loading {
                    play_when_ready: true,
                },
                Transition::Stop { .. },
            ) => (
                Loading {
                    play_when_ready: false,
                },
                Action::DeferRewind,
            ),
            (_, Transition::Stop { .. }) => (self, Action::None),

            // Engine ready
            (Loading { play_when_ready }, Transition::Prepared) => (
                Prepared {
                    playing: play_when_ready,
                },
                Action::Ready {
                    start: play_when_ready,
                },
            ),
            (_, Transition::Prepared) => (self, Action::None),

            // Source change keeps the play intent
            (Released, Transition::Rebind) => (
                Loading {
                    play_when_ready: false,
                },
                Action::CreateBindPrepare,
            ),
            (Loading { play_when_ready }, Transition::Rebind) => {
                (Loading { play_when_ready }, Action::ResetBindPrepare)
            }
            (Prepared { playing }, Transition::Rebind) => (
                Loading {
                    play_when_ready: playing,
                },
                Action::ResetBindPrepare,
            ),
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Released => f.write_str("released"),
            PlayerState::Loading {
                play_when_ready: true,
            } => f.write_str("loading (play when ready)"),
            PlayerState::Loading { .. } => f.write_str("loading"),
            PlayerState::Prepared { playing: true } => f.write_str("playing"),
            PlayerState::Prepared { playing: false } => f.write_str("prepared"),
        }
    }
}
