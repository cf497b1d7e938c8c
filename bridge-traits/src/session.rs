//! Platform audio-session abstractions: audio focus and output routing.
//!
//! Audio focus is a platform-wide resource shared by every application. Each
//! requester identifies itself with a [`FocusRequestId`] so that abandoning a
//! request only ever releases that requester's own grant.

use crate::{engine::AudioAttributes, error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of focus being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusGain {
    Gain,
    GainTransient,
    /// Short-lived focus during which other audio may keep playing ducked.
    GainTransientMayDuck,
    GainTransientExclusive,
}

/// Focus change delivered to a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    Gain,
    Loss,
    LossTransient,
    LossTransientCanDuck,
}

/// Immediate outcome of a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusRequestResult {
    /// Focus was granted synchronously.
    Granted,
    /// Focus will be granted later through the listener.
    Delayed,
    /// The platform refused the request.
    Failed,
}

/// Identity of a focus requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusRequestId(Uuid);

impl FocusRequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FocusRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FocusRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Focus request submitted to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRequest {
    pub id: FocusRequestId,
    pub gain: FocusGain,
    pub attributes: AudioAttributes,
}

/// Listener invoked by the platform on focus changes for a request.
pub type FocusListener = Box<dyn Fn(FocusChange) + Send + Sync>;

/// Platform audio-focus API.
///
/// Platforms with request objects implement [`request_focus`]; older styles
/// only offer the synchronous [`request_focus_legacy`] call and report
/// `false` from [`supports_focus_requests`].
///
/// [`request_focus`]: AudioFocusManager::request_focus
/// [`request_focus_legacy`]: AudioFocusManager::request_focus_legacy
/// [`supports_focus_requests`]: AudioFocusManager::supports_focus_requests
pub trait AudioFocusManager: PlatformSendSync {
    /// Whether asynchronous request objects are available.
    fn supports_focus_requests(&self) -> bool;

    /// Submit a request object. The listener stays registered until the
    /// request is abandoned.
    fn request_focus(
        &self,
        request: FocusRequest,
        listener: FocusListener,
    ) -> Result<FocusRequestResult>;

    /// Synchronous request for platforms without request objects.
    fn request_focus_legacy(
        &self,
        owner: FocusRequestId,
        gain: FocusGain,
    ) -> Result<FocusRequestResult>;

    /// Release whatever `owner` currently holds.
    fn abandon_focus(&self, owner: FocusRequestId) -> Result<()>;
}

/// Platform output-routing control.
pub trait AudioRouteControl: PlatformSendSync {
    /// Force (or stop forcing) output through the loudspeaker.
    fn set_speakerphone_on(&self, on: bool) -> Result<()>;
}
