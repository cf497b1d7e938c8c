//! # Focus Negotiator
//!
//! Requests and abandons transient, duckable audio focus on behalf of one
//! controller. Each negotiator owns its own [`FocusRequestId`], so abandoning
//! focus never releases a grant held by another player.

use crate::error::{PlaybackError, Result};
use bridge_traits::{
    AudioAttributes, AudioFocusManager, FocusGain, FocusListener, FocusRequest, FocusRequestId,
    FocusRequestResult, UsageCategory,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What the controller should do after a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Focus granted immediately; start playback now.
    Granted,
    /// Focus will arrive later through the listener.
    Pending,
    /// The platform refused; do not start.
    Denied,
    /// No focus manager is configured; start without negotiating.
    Unavailable,
}

pub struct FocusNegotiator {
    manager: Option<Arc<dyn AudioFocusManager>>,
    request_id: FocusRequestId,
    held: bool,
}

impl FocusNegotiator {
    pub fn new(manager: Option<Arc<dyn AudioFocusManager>>) -> Self {
        Self {
            manager,
            request_id: FocusRequestId::new(),
            held: false,
        }
    }

    pub fn request_id(&self) -> FocusRequestId {
        self.request_id
    }

    /// Returns `true` while a request is granted or pending and not yet
    /// abandoned.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Request transient focus that lets other audio keep playing ducked.
    ///
    /// The usage is ringtone-like when `respect_silence` is set, media
    /// otherwise. `listener` only receives changes on platforms with request
    /// objects; the legacy path answers synchronously.
    pub fn request_focus(
        &mut self,
        respect_silence: bool,
        listener: FocusListener,
    ) -> Result<FocusOutcome> {
        let Some(manager) = self.manager.as_ref() else {
            return Ok(FocusOutcome::Unavailable);
        };

        let requested = if manager.supports_focus_requests() {
            let usage = if respect_silence {
                UsageCategory::NotificationRingtone
            } else {
                UsageCategory::Media
            };
            let request = FocusRequest {
                id: self.request_id,
                gain: FocusGain::GainTransientMayDuck,
                attributes: AudioAttributes::music(usage),
            };
            manager.request_focus(request, listener)
        } else {
            manager.request_focus_legacy(self.request_id, FocusGain::GainTransientMayDuck)
        };
        let result = requested.map_err(PlaybackError::Focus)?;

        debug!(request_id = %self.request_id, ?result, "Audio focus requested");

        let outcome = match result {
            FocusRequestResult::Granted => FocusOutcome::Granted,
            FocusRequestResult::Delayed => FocusOutcome::Pending,
            FocusRequestResult::Failed => FocusOutcome::Denied,
        };
        // A refusal leaves an earlier outstanding request in place
        if matches!(outcome, FocusOutcome::Granted | FocusOutcome::Pending) {
            self.held = true;
        }

        Ok(outcome)
    }

    /// Release the held request. Does nothing when nothing is held.
    pub fn abandon_focus(&mut self) -> Result<()> {
        if !self.held {
            return Ok(());
        }
        self.held = false;

        match self.manager.as_ref() {
            Some(manager) => {
                debug!(request_id = %self.request_id, "Abandoning audio focus");
                manager
                    .abandon_focus(self.request_id)
                    .map_err(PlaybackError::Focus)
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FocusNegotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusNegotiator")
            .field("request_id", &self.request_id)
            .field("held", &self.held)
            .field("has_manager", &self.manager.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{BridgeError, FocusChange};
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        FocusManager {}

        impl AudioFocusManager for FocusManager {
            fn supports_focus_requests(&self) -> bool;
            fn request_focus(
                &self,
                request: FocusRequest,
                listener: FocusListener,
            ) -> BridgeResult<FocusRequestResult>;
            fn request_focus_legacy(
                &self,
                owner: FocusRequestId,
                gain: FocusGain,
            ) -> BridgeResult<FocusRequestResult>;
            fn abandon_focus(&self, owner: FocusRequestId) -> BridgeResult<()>;
        }
    }

    fn noop_listener() -> FocusListener {
        Box::new(|_: FocusChange| {})
    }

    #[test]
    fn test_request_object_uses_transient_may_duck() {
        let mut manager = MockFocusManager::new();
        manager.expect_supports_focus_requests().return_const(true);
        manager
            .expect_request_focus()
            .withf(|request, _| {
                request.gain == FocusGain::GainTransientMayDuck
                    && request.attributes.usage == UsageCategory::NotificationRingtone
            })
            .times(1)
            .returning(|_, _| Ok(FocusRequestResult::Delayed));

        let mut negotiator = FocusNegotiator::new(Some(Arc::new(manager)));
        let outcome = negotiator.request_focus(true, noop_listener()).unwrap();

        assert_eq!(outcome, FocusOutcome::Pending);
        assert!(negotiator.is_held());
    }

    #[test]
    fn test_request_uses_media_usage_without_silence_policy() {
        let mut manager = MockFocusManager::new();
        manager.expect_supports_focus_requests().return_const(true);
        manager
            .expect_request_focus()
            .withf(|request, _| request.attributes.usage == UsageCategory::Media)
            .returning(|_, _| Ok(FocusRequestResult::Granted));

        let mut negotiator = FocusNegotiator::new(Some(Arc::new(manager)));
        assert_eq!(
            negotiator.request_focus(false, noop_listener()).unwrap(),
            FocusOutcome::Granted
        );
    }

    #[test]
    fn test_legacy_request_is_synchronous() {
        let mut negotiator_manager = MockFocusManager::new();
        negotiator_manager
            .expect_supports_focus_requests()
            .return_const(false);
        negotiator_manager.expect_request_focus().never();
        negotiator_manager
            .expect_request_focus_legacy()
            .with(always(), eq(FocusGain::GainTransientMayDuck))
            .times(1)
            .returning(|_, _| Ok(FocusRequestResult::Failed));

        let mut negotiator = FocusNegotiator::new(Some(Arc::new(negotiator_manager)));
        let outcome = negotiator.request_focus(false, noop_listener()).unwrap();

        assert_eq!(outcome, FocusOutcome::Denied);
        assert!(!negotiator.is_held());
    }

    #[test]
    fn test_abandon_is_idempotent_and_scoped_to_owner() {
        let mut manager = MockFocusManager::new();
        manager.expect_supports_focus_requests().return_const(true);
        manager
            .expect_request_focus()
            .returning(|_, _| Ok(FocusRequestResult::Granted));

        let mut negotiator = FocusNegotiator::new(None);
        let owner = negotiator.request_id();
        manager
            .expect_abandon_focus()
            .with(eq(owner))
            .times(1)
            .returning(|_| Ok(()));
        negotiator.manager = Some(Arc::new(manager));

        negotiator.request_focus(false, noop_listener()).unwrap();
        negotiator.abandon_focus().unwrap();
        negotiator.abandon_focus().unwrap();
        assert!(!negotiator.is_held());
    }

    #[test]
    fn test_refused_request_keeps_earlier_request_held() {
        let mut manager = MockFocusManager::new();
        manager.expect_supports_focus_requests().return_const(true);
        let mut answers = vec![FocusRequestResult::Failed, FocusRequestResult::Delayed];
        manager
            .expect_request_focus()
            .times(2)
            .returning(move |_, _| Ok(answers.pop().unwrap()));
        manager.expect_abandon_focus().times(1).returning(|_| Ok(()));

        let mut negotiator = FocusNegotiator::new(Some(Arc::new(manager)));
        assert_eq!(
            negotiator.request_focus(false, noop_listener()).unwrap(),
            FocusOutcome::Pending
        );
        assert_eq!(
            negotiator.request_focus(false, noop_listener()).unwrap(),
            FocusOutcome::Denied
        );
        assert!(negotiator.is_held());

        negotiator.abandon_focus().unwrap();
        assert!(!negotiator.is_held());
    }

    #[test]
    fn test_negotiators_have_distinct_identities() {
        let a = FocusNegotiator::new(None);
        let b = FocusNegotiator::new(None);
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_missing_manager_is_unavailable() {
        let mut negotiator = FocusNegotiator::new(None);
        assert_eq!(
            negotiator.request_focus(false, noop_listener()).unwrap(),
            FocusOutcome::Unavailable
        );
        assert!(negotiator.abandon_focus().is_ok());
    }

    #[test]
    fn test_bridge_failure_maps_to_focus_error() {
        let mut manager = MockFocusManager::new();
        manager.expect_supports_focus_requests().return_const(true);
        manager
            .expect_request_focus()
            .returning(|_, _| Err(BridgeError::OperationFailed("audio service".into())));

        let mut negotiator = FocusNegotiator::new(Some(Arc::new(manager)));
        let err = negotiator.request_focus(false, noop_listener()).unwrap_err();
        assert!(matches!(err, PlaybackError::Focus(_)));
        assert!(!negotiator.is_held());
    }
}
