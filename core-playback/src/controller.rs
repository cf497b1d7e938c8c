//! # Player Controller
//!
//! One [`PlayerController`] per playback slot. It owns the engine handle,
//! mediates every client call and processes every engine and focus callback.
//!
//! ## Callback delivery
//!
//! Engines and focus managers invoke their listeners from arbitrary contexts,
//! often from inside the call that triggered them. Listeners therefore never
//! touch the controller: they enqueue a [`ControllerEvent`] on the
//! controller's channel, and the owner drains it on the controller's thread
//! with [`PlayerController::dispatch_pending`] (or awaits
//! [`PlayerController::next_event`]).
//!
//! Every listener set installed on an engine is tagged with a generation.
//! Events from a torn-down or rebound engine carry an older generation and are
//! dropped.
//!
//! ## Example
//!
//! ```ignore
//! let mut player = PlayerController::new("main".into(), &config, PlayerDefaults::default())?;
//! player.set_url("https://example.com/track.mp3", false)?;
//! player.play()?;
//!
//! // Later, on the same thread:
//! player.dispatch_pending()?;
//! assert!(player.is_actually_playing());
//! ```

use crate::attributes::apply_attributes;
use crate::config::{OutputRoute, PlayerDefaults, ReleaseMode};
use crate::error::{PlaybackError, Result};
use crate::focus::{FocusNegotiator, FocusOutcome};
use crate::source::{bind_source, missing_source, EngineHandle, PlayerSource};
use crate::state::{Action, PlayerState, Transition};
use bridge_traits::{
    AudioRouteControl, BridgeError, EngineEvent, EngineFactory, EngineListeners, FocusChange,
    FocusListener, MediaBuffer, MediaErrorExtra, MediaErrorWhat, PlaybackEngine, PlayerId,
    PlayerNotifier,
};
use core_runtime::CoreConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, trace, warn};

/// Value returned to the engine from its error slot. `false` lets the engine
/// run its own recovery.
const ENGINE_ERROR_HANDLED: bool = false;

/// Callback queued for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    Engine { generation: u64, event: EngineEvent },
    Focus(FocusChange),
}

/// Outcome of [`PlayerController::set_playback_rate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateChange {
    /// The rate was applied to the engine.
    Applied,
    /// No engine handle exists; nothing changed.
    Ignored,
}

/// Per-player playback state machine.
pub struct PlayerController {
    player_id: PlayerId,
    factory: Arc<dyn EngineFactory>,
    notifier: Arc<dyn PlayerNotifier>,
    route_control: Option<Arc<dyn AudioRouteControl>>,
    focus: FocusNegotiator,

    handle: Option<EngineHandle>,
    state: PlayerState,
    source: PlayerSource,
    pending_seek: Option<Duration>,

    volume: f32,
    playback_rate: f32,
    release_mode: ReleaseMode,
    output_route: OutputRoute,
    respect_silence: bool,
    stay_awake: bool,
    duck_audio: bool,

    generation: u64,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl PlayerController {
    /// Create a released controller.
    ///
    /// Focus negotiation and route control are only used when the
    /// corresponding feature is enabled in `config`.
    pub fn new(player_id: PlayerId, config: &CoreConfig, defaults: PlayerDefaults) -> Result<Self> {
        config.validate()?;
        defaults.validate()?;

        let focus_manager = if config.features.enable_audio_focus {
            config.focus_manager.clone()
        } else {
            None
        };
        let route_control = if config.features.enable_route_control {
            config.route_control.clone()
        } else {
            None
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        debug!(%player_id, "Creating player controller");

        Ok(Self {
            player_id,
            factory: Arc::clone(&config.engine_factory),
            notifier: Arc::clone(&config.notifier),
            route_control,
            focus: FocusNegotiator::new(focus_manager),
            handle: None,
            state: PlayerState::Released,
            source: PlayerSource::None,
            pending_seek: None,
            volume: defaults.volume,
            playback_rate: defaults.playback_rate,
            release_mode: defaults.release_mode,
            output_route: defaults.output_route,
            respect_silence: defaults.respect_silence,
            stay_awake: defaults.stay_awake,
            duck_audio: defaults.duck_audio,
            generation: 0,
            events_tx,
            events_rx,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn source(&self) -> &PlayerSource {
        &self.source
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn release_mode(&self) -> ReleaseMode {
        self.release_mode
    }

    pub fn output_route(&self) -> OutputRoute {
        self.output_route
    }

    /// Seek position buffered until the engine is ready.
    pub fn pending_seek(&self) -> Option<Duration> {
        self.pending_seek
    }

    pub fn has_engine(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns `true` only while the engine is prepared and playing.
    pub fn is_actually_playing(&self) -> bool {
        self.state.is_actually_playing()
    }

    /// Media duration reported by the engine, if a handle exists and knows it.
    pub fn duration(&self) -> Option<Duration> {
        self.handle.as_ref().and_then(|h| h.engine().duration())
    }

    pub fn current_position(&self) -> Option<Duration> {
        self.handle.as_ref().map(|h| h.engine().current_position())
    }

    // ========================================================================
    // Source
    // ========================================================================

    /// Switch to `source`, preparing it asynchronously.
    ///
    /// Re-submitting the current source does nothing. [`PlayerSource::None`]
    /// releases the controller. On failure the source is cleared and the
    /// controller is left released.
    #[instrument(skip(self, source), fields(player_id = %self.player_id, source = %source))]
    pub fn set_source(&mut self, source: PlayerSource) -> Result<()> {
        if source == self.source {
            trace!("Source unchanged");
            return Ok(());
        }

        if source.is_none() {
            self.source = PlayerSource::None;
            return self.release();
        }

        self.source = source;
        let result = self.run(Transition::Rebind);
        if result.is_err() {
            self.source = PlayerSource::None;
        }
        result
    }

    pub fn set_url(&mut self, url: impl Into<String>, is_local: bool) -> Result<()> {
        self.set_source(PlayerSource::url(url, is_local))
    }

    pub fn set_buffer(&mut self, buffer: MediaBuffer) -> Result<()> {
        self.set_source(PlayerSource::buffer(buffer))
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Set the volume in `[0.0, 1.0]`, applying it to the engine if one exists.
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        if volume == self.volume {
            return Ok(());
        }

        self.volume = volume;
        if let Some(handle) = self.handle.as_mut() {
            handle.engine_mut().set_volume(volume)?;
        }
        Ok(())
    }

    /// Change the playback speed of the current engine.
    ///
    /// The rate belongs to the engine: without a handle nothing is stored and
    /// [`RateChange::Ignored`] is returned. A new engine starts at 1.0.
    pub fn set_playback_rate(&mut self, rate: f32) -> Result<RateChange> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PlaybackError::InvalidPlaybackRate(rate));
        }

        let Some(handle) = self.handle.as_mut() else {
            debug!(player_id = %self.player_id, rate, "No engine, playback rate ignored");
            return Ok(RateChange::Ignored);
        };

        handle.engine_mut().set_playback_speed(rate)?;
        self.playback_rate = rate;
        Ok(RateChange::Applied)
    }

    pub fn set_release_mode(&mut self, mode: ReleaseMode) -> Result<()> {
        if mode == self.release_mode {
            return Ok(());
        }

        self.release_mode = mode;
        if let Some(handle) = self.handle.as_mut() {
            handle.engine_mut().set_looping(mode.is_looping())?;
        }
        Ok(())
    }

    /// Update the policy flags, touching the engine only for flags that changed.
    ///
    /// Dropping `stay_awake` releases the wake lock right away.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn configure_attributes(
        &mut self,
        respect_silence: bool,
        stay_awake: bool,
        duck_audio: bool,
    ) -> Result<()> {
        let mut reapply = false;
        if self.respect_silence != respect_silence {
            self.respect_silence = respect_silence;
            reapply = true;
        }
        if self.duck_audio != duck_audio {
            self.duck_audio = duck_audio;
            reapply = true;
        }

        if reapply {
            if let Some(handle) = self.handle.as_mut() {
                apply_attributes(
                    handle.engine_mut(),
                    self.output_route,
                    self.respect_silence,
                    self.route_control.as_deref(),
                )?;
            }
        }

        if self.stay_awake != stay_awake {
            self.stay_awake = stay_awake;
            if let Some(handle) = self.handle.as_mut() {
                handle.engine_mut().set_wake_mode(stay_awake)?;
            }
        }

        Ok(())
    }

    /// Move output to `route` by rebuilding the engine.
    ///
    /// The new engine is prepared synchronously, seeked to the captured
    /// position and resumed if playback was requested. Without a source the
    /// route is only stored for the next engine.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn set_output_route(&mut self, route: OutputRoute) -> Result<()> {
        if route == self.output_route {
            return Ok(());
        }
        self.output_route = route;

        if self.source.is_none() {
            debug!(%route, "No source, route stored for the next engine");
            return Ok(());
        }

        let was_playing = self.state.wants_playback();
        let position = match (self.state, self.handle.as_ref()) {
            (PlayerState::Prepared { .. }, Some(handle)) => handle.engine().current_position(),
            _ => self.pending_seek.take().unwrap_or(Duration::ZERO),
        };

        if self.state.is_actually_playing() {
            self.engine_mut()?.pause()?;
        }
        if let Some(old) = self.handle.take() {
            self.discard(old);
        }
        self.state = PlayerState::Released;
        self.playback_rate = 1.0;

        let mut handle = self.create_handle()?;
        let prepared = self
            .bind_current_source(&mut handle)
            .and_then(|()| prepare_now(&mut handle));
        if let Err(e) = prepared {
            self.discard(handle);
            return Err(e);
        }

        self.handle = Some(handle);
        self.state = PlayerState::Prepared { playing: false };
        info!(%route, ?position, was_playing, "Output route switched");

        self.engine_mut()?.seek_to(position)?;
        if was_playing {
            self.engine_mut()?.start()?;
            self.state = PlayerState::Prepared { playing: true };
            self.notifier.notify_playing(&self.player_id);
        }

        self.check_invariant();
        Ok(())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Start playback, negotiating audio focus first when ducking is enabled.
    ///
    /// If focus is granted later, playback starts when the grant is
    /// dispatched.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn play(&mut self) -> Result<()> {
        if !self.duck_audio {
            return self.actually_play();
        }

        let tx = self.events_tx.clone();
        let listener: FocusListener = Box::new(move |change| {
            // Receiver gone means the controller was dropped.
            let _ = tx.send(ControllerEvent::Focus(change));
        });

        match self.focus.request_focus(self.respect_silence, listener)? {
            FocusOutcome::Granted => self.actually_play(),
            FocusOutcome::Unavailable => {
                debug!("No focus manager, playing without focus");
                self.actually_play()
            }
            FocusOutcome::Pending => {
                debug!("Playback deferred until audio focus is granted");
                Ok(())
            }
            FocusOutcome::Denied => {
                warn!("Audio focus denied, not starting playback");
                Ok(())
            }
        }
    }

    fn actually_play(&mut self) -> Result<()> {
        self.run(Transition::Play)
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn pause(&mut self) -> Result<()> {
        self.run(Transition::Pause)
    }

    /// Stop according to the release mode.
    ///
    /// `Release` tears the engine down. `Loop` and `Stop` keep it prepared,
    /// paused at position 0.
    #[instrument(skip(self), fields(player_id = %self.player_id, release_mode = %self.release_mode))]
    pub fn stop(&mut self) -> Result<()> {
        if self.duck_audio {
            if let Err(e) = self.focus.abandon_focus() {
                warn!(error = %e, "Failed to abandon audio focus");
            }
        }
        self.run(Transition::Stop {
            release_mode: self.release_mode,
        })
    }

    /// Tear the engine down. The controller can be reused afterwards.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn release(&mut self) -> Result<()> {
        self.run(Transition::Release)
    }

    /// Seek now if prepared, otherwise once the engine becomes ready.
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        if self.state.is_prepared() {
            self.engine_mut()?.seek_to(position)?;
        } else {
            debug!(player_id = %self.player_id, ?position, "Seek deferred until prepared");
            self.pending_seek = Some(position);
        }
        Ok(())
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Process every queued callback. Returns the number handled.
    ///
    /// Stops at the first failing event; later events stay queued.
    pub fn dispatch_pending(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Wait for the next queued callback.
    ///
    /// The controller holds a sender itself, so this only completes with an
    /// event.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events_rx.recv().await
    }

    /// Process a single callback.
    pub fn handle_event(&mut self, event: ControllerEvent) -> Result<()> {
        match event {
            ControllerEvent::Engine { generation, event } => {
                let current = self.handle.as_ref().map(EngineHandle::generation);
                if current != Some(generation) {
                    warn!(
                        player_id = %self.player_id,
                        generation,
                        ?current,
                        ?event,
                        "Dropping callback from superseded engine"
                    );
                    return Ok(());
                }

                match event {
                    EngineEvent::Prepared => self.on_prepared(),
                    EngineEvent::Completion => self.on_completion(),
                    EngineEvent::SeekComplete => {
                        self.notifier.notify_seek_complete(&self.player_id);
                        Ok(())
                    }
                    EngineEvent::Error { what, extra } => {
                        self.on_error(what, extra);
                        Ok(())
                    }
                }
            }
            ControllerEvent::Focus(change) => self.on_audio_focus_change(change),
        }
    }

    fn on_prepared(&mut self) -> Result<()> {
        if !matches!(self.state, PlayerState::Loading { .. }) {
            warn!(player_id = %self.player_id, state = %self.state, "Ignoring prepared callback");
            return Ok(());
        }
        info!(player_id = %self.player_id, "Engine prepared");
        self.run(Transition::Prepared)
    }

    fn on_completion(&mut self) -> Result<()> {
        debug!(player_id = %self.player_id, release_mode = %self.release_mode, "Playback completed");
        let stopped = if self.release_mode == ReleaseMode::Loop {
            Ok(())
        } else {
            self.stop()
        };
        self.notifier.notify_completion(&self.player_id);
        stopped
    }

    fn on_error(&mut self, what: i32, extra: i32) -> bool {
        let message = format!(
            "{} {}",
            MediaErrorWhat::from_code(what),
            MediaErrorExtra::from_code(extra)
        );
        warn!(player_id = %self.player_id, what, extra, %message, "Engine reported an error");
        self.notifier.notify_error(&self.player_id, &message);
        ENGINE_ERROR_HANDLED
    }

    fn on_audio_focus_change(&mut self, change: FocusChange) -> Result<()> {
        if !self.focus.is_held() {
            debug!(player_id = %self.player_id, ?change, "Focus change after abandon, ignored");
            return Ok(());
        }
        match change {
            FocusChange::Gain => self.actually_play(),
            other => {
                trace!(player_id = %self.player_id, change = ?other, "Focus change ignored");
                Ok(())
            }
        }
    }

    // ========================================================================
    // State machine
    // ========================================================================

    /// Apply `transition`, performing its engine action before committing the
    /// new state. A failed action leaves the previous state in place, except
    /// where the handle had to be torn down.
    fn run(&mut self, transition: Transition) -> Result<()> {
        let previous = self.state;
        let (next, action) = previous.apply(transition);

        if action != Action::None || next != previous {
            debug!(
                player_id = %self.player_id,
                ?transition,
                from = %previous,
                to = %next,
                ?action,
                "State transition"
            );
        }

        let result = self.perform(action, next);
        self.check_invariant();
        result
    }

    fn perform(&mut self, action: Action, next: PlayerState) -> Result<()> {
        match action {
            Action::None => {}
            Action::CreateBindPrepare => {
                if self.source.is_none() {
                    return Err(missing_source());
                }
                let mut handle = self.create_handle()?;
                if let Err(e) = self.bind_and_prepare(&mut handle) {
                    self.discard(handle);
                    return Err(e);
                }
                info!(player_id = %self.player_id, source = %self.source, "Engine created, preparing");
                self.handle = Some(handle);
            }
            Action::ResetBindPrepare => {
                let Some(mut handle) = self.handle.take() else {
                    return Err(no_engine());
                };
                self.state = PlayerState::Released;

                let generation = self.next_generation();
                let rebound = handle
                    .engine_mut()
                    .reset()
                    .map_err(PlaybackError::from)
                    .and_then(|()| {
                        handle
                            .engine_mut()
                            .set_listeners(self.listeners(generation));
                        handle.set_generation(generation);
                        self.bind_and_prepare(&mut handle)
                    });
                if let Err(e) = rebound {
                    self.discard(handle);
                    return Err(e);
                }
                debug!(player_id = %self.player_id, source = %self.source, "Engine rebound, preparing");
                self.handle = Some(handle);
            }
            Action::Start => {
                self.engine_mut()?.start()?;
                self.state = next;
                self.notifier.notify_playing(&self.player_id);
                return Ok(());
            }
            Action::Pause => {
                self.engine_mut()?.pause()?;
            }
            Action::PauseAndRewind => {
                let engine = self.engine_mut()?;
                engine.pause()?;
                engine.seek_to(Duration::ZERO)?;
            }
            Action::DeferRewind => {
                self.pending_seek = Some(Duration::ZERO);
            }
            Action::Teardown { stop_first } => {
                self.state = next;
                self.playback_rate = 1.0;
                let Some(handle) = self.handle.take() else {
                    return Ok(());
                };
                return match handle.teardown(stop_first) {
                    Ok(()) => {
                        info!(player_id = %self.player_id, "Engine released");
                        Ok(())
                    }
                    Err(failures) => {
                        let message = join_failures(&failures);
                        error!(player_id = %self.player_id, %message, "Engine release failed");
                        Err(PlaybackError::ReleaseFailed(message))
                    }
                };
            }
            Action::Ready { start } => {
                self.state = PlayerState::Prepared { playing: false };
                self.notifier.notify_duration(&self.player_id, self.duration());

                if start {
                    self.engine_mut()?.start()?;
                    self.state = next;
                    self.notifier.notify_playing(&self.player_id);
                }
                if let Some(position) = self.pending_seek.take() {
                    debug!(player_id = %self.player_id, ?position, "Applying deferred seek");
                    self.engine_mut()?.seek_to(position)?;
                }
                return Ok(());
            }
        }

        self.state = next;
        Ok(())
    }

    // ========================================================================
    // Engine plumbing
    // ========================================================================

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn listeners(&self, generation: u64) -> EngineListeners {
        let tx = self.events_tx.clone();
        EngineListeners::forward_to(
            move |event| {
                // Receiver gone means the controller was dropped.
                let _ = tx.send(ControllerEvent::Engine { generation, event });
            },
            ENGINE_ERROR_HANDLED,
        )
    }

    /// Create an engine with listeners, attributes and wake mode applied.
    fn create_handle(&mut self) -> Result<EngineHandle> {
        let engine = self
            .factory
            .create_engine()
            .map_err(|e| PlaybackError::resource_access("Unable to create playback engine", e))?;

        let generation = self.next_generation();
        let mut handle = EngineHandle::new(engine, generation);
        handle.engine_mut().set_listeners(self.listeners(generation));

        let configured = apply_attributes(
            handle.engine_mut(),
            self.output_route,
            self.respect_silence,
            self.route_control.as_deref(),
        )
        .and_then(|_| {
            if self.stay_awake {
                handle.engine_mut().set_wake_mode(true)?;
            }
            Ok(())
        });
        if let Err(e) = configured {
            self.discard(handle);
            return Err(e);
        }

        Ok(handle)
    }

    /// Bind the current source and reapply volume and looping.
    fn bind_current_source(&self, handle: &mut EngineHandle) -> Result<()> {
        let engine = handle.engine_mut();
        bind_source(engine, &self.source)?;
        engine.set_volume(self.volume)?;
        engine.set_looping(self.release_mode.is_looping())?;
        Ok(())
    }

    fn bind_and_prepare(&self, handle: &mut EngineHandle) -> Result<()> {
        self.bind_current_source(handle)?;
        handle.engine_mut().prepare_async().map_err(|e| {
            PlaybackError::resource_access("Unable to start preparing resource", e)
        })
    }

    fn engine_mut(&mut self) -> Result<&mut dyn PlaybackEngine> {
        match self.handle.as_mut() {
            Some(handle) => Ok(handle.engine_mut()),
            None => Err(no_engine()),
        }
    }

    /// Tear down a handle that never became (or no longer is) the current one.
    fn discard(&self, handle: EngineHandle) {
        if let Err(failures) = handle.teardown(false) {
            warn!(
                player_id = %self.player_id,
                failures = %join_failures(&failures),
                "Discarded engine did not release cleanly"
            );
        }
    }

    fn check_invariant(&self) {
        debug_assert_eq!(
            self.handle.is_some(),
            !self.state.is_released(),
            "engine handle must exist exactly when the player is not released"
        );
    }
}

fn prepare_now(handle: &mut EngineHandle) -> Result<()> {
    handle
        .engine_mut()
        .prepare()
        .map_err(|e| PlaybackError::resource_access("Unable to access resource", e))
}

fn no_engine() -> PlaybackError {
    PlaybackError::Engine(BridgeError::IllegalState(
        "no engine handle".to_string(),
    ))
}

fn join_failures(failures: &[BridgeError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(player_id = %self.player_id, "Releasing engine of dropped controller");
            self.discard(handle);
        }
    }
}

impl fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerController")
            .field("player_id", &self.player_id)
            .field("state", &self.state)
            .field("source", &self.source.redacted())
            .field("handle", &self.handle)
            .field("pending_seek", &self.pending_seek)
            .field("volume", &self.volume)
            .field("playback_rate", &self.playback_rate)
            .field("release_mode", &self.release_mode)
            .field("output_route", &self.output_route)
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}
