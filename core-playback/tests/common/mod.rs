//! Scripted engine, factory and notifier shared by the integration tests.

#![allow(dead_code)]

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    AudioAttributes, AudioFocusManager, EngineFactory, EngineListeners, EngineSource, PlaybackEngine, PlayerId,
    PlayerNotifier,
};
use core_playback::{PlayerController, PlayerDefaults};
use core_runtime::CoreConfig;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Scripted Engine
// ============================================================================

/// Every engine call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetListeners,
    Attributes(AudioAttributes),
    DataSource(EngineSource),
    PrepareAsync,
    Prepare,
    Start,
    Pause,
    Stop,
    SeekTo(Duration),
    Volume(f32),
    Looping(bool),
    Speed(f32),
    WakeMode(bool),
    Reset,
    Release,
}

#[derive(Default)]
pub struct EngineRecord {
    pub calls: Vec<Call>,
    /// Every listener set ever installed, oldest first.
    pub listeners: Vec<EngineListeners>,
    pub position: Duration,
}

/// Failure switches and recorded state for every engine the factory created.
#[derive(Default)]
pub struct Lab {
    pub engines: Vec<EngineRecord>,
    pub duration: Option<Duration>,
    pub fail_create: bool,
    pub fail_data_source: bool,
    pub fail_prepare: bool,
    pub fail_release: bool,
}

#[derive(Clone, Default)]
pub struct SharedLab(Arc<Mutex<Lab>>);

impl SharedLab {
    pub fn with<R>(&self, f: impl FnOnce(&mut Lab) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }

    pub fn engine_count(&self) -> usize {
        self.with(|lab| lab.engines.len())
    }

    pub fn calls(&self, engine: usize) -> Vec<Call> {
        self.with(|lab| lab.engines[engine].calls.clone())
    }

    pub fn count(&self, engine: usize, call: &Call) -> usize {
        self.calls(engine).iter().filter(|c| *c == call).count()
    }

    pub fn set_position(&self, engine: usize, position: Duration) {
        self.with(|lab| lab.engines[engine].position = position);
    }

    /// Fire a callback through the newest listener set of `engine`.
    pub fn fire_prepared(&self, engine: usize) {
        self.fire_prepared_on(engine, usize::MAX);
    }

    /// Fire through a specific listener set (`usize::MAX` for the newest).
    pub fn fire_prepared_on(&self, engine: usize, set: usize) {
        self.with(|lab| (listeners(lab, engine, set).on_prepared)());
    }

    pub fn fire_completion(&self, engine: usize) {
        self.with(|lab| (listeners(lab, engine, usize::MAX).on_completion)());
    }

    pub fn fire_seek_complete(&self, engine: usize) {
        self.with(|lab| (listeners(lab, engine, usize::MAX).on_seek_complete)());
    }

    pub fn fire_error(&self, engine: usize, what: i32, extra: i32) -> bool {
        self.with(|lab| (listeners(lab, engine, usize::MAX).on_error)(what, extra))
    }
}

fn listeners(lab: &Lab, engine: usize, set: usize) -> &EngineListeners {
    let sets = &lab.engines[engine].listeners;
    if set == usize::MAX {
        sets.last().expect("listeners installed")
    } else {
        &sets[set]
    }
}

pub struct ScriptedEngine {
    index: usize,
    lab: SharedLab,
}

impl ScriptedEngine {
    fn record(&self, call: Call) {
        self.lab.with(|lab| lab.engines[self.index].calls.push(call));
    }

    fn record_fallible(&self, call: Call, fail: impl FnOnce(&Lab) -> bool) -> BridgeResult<()> {
        let failed = self.lab.with(|lab| {
            lab.engines[self.index].calls.push(call.clone());
            fail(lab)
        });
        if failed {
            Err(BridgeError::OperationFailed(format!("{:?} failed", call)))
        } else {
            Ok(())
        }
    }
}

impl PlaybackEngine for ScriptedEngine {
    fn set_listeners(&mut self, listeners: EngineListeners) {
        self.lab.with(|lab| {
            let record = &mut lab.engines[self.index];
            record.calls.push(Call::SetListeners);
            record.listeners.push(listeners);
        });
    }

    fn set_audio_attributes(&mut self, attributes: AudioAttributes) -> BridgeResult<()> {
        self.record(Call::Attributes(attributes));
        Ok(())
    }

    fn set_data_source(&mut self, source: &EngineSource) -> BridgeResult<()> {
        self.record_fallible(Call::DataSource(source.clone()), |lab| lab.fail_data_source)
    }

    fn prepare_async(&mut self) -> BridgeResult<()> {
        self.record(Call::PrepareAsync);
        Ok(())
    }

    fn prepare(&mut self) -> BridgeResult<()> {
        self.record_fallible(Call::Prepare, |lab| lab.fail_prepare)
    }

    fn start(&mut self) -> BridgeResult<()> {
        self.record(Call::Start);
        Ok(())
    }

    fn pause(&mut self) -> BridgeResult<()> {
        self.record(Call::Pause);
        Ok(())
    }

    fn stop(&mut self) -> BridgeResult<()> {
        self.record(Call::Stop);
        Ok(())
    }

    fn seek_to(&mut self, position: Duration) -> BridgeResult<()> {
        self.lab.with(|lab| {
            let record = &mut lab.engines[self.index];
            record.calls.push(Call::SeekTo(position));
            record.position = position;
        });
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> BridgeResult<()> {
        self.record(Call::Volume(volume));
        Ok(())
    }

    fn set_looping(&mut self, looping: bool) -> BridgeResult<()> {
        self.record(Call::Looping(looping));
        Ok(())
    }

    fn set_playback_speed(&mut self, speed: f32) -> BridgeResult<()> {
        self.record(Call::Speed(speed));
        Ok(())
    }

    fn set_wake_mode(&mut self, stay_awake: bool) -> BridgeResult<()> {
        self.record(Call::WakeMode(stay_awake));
        Ok(())
    }

    fn duration(&self) -> Option<Duration> {
        self.lab.with(|lab| lab.duration)
    }

    fn current_position(&self) -> Duration {
        self.lab.with(|lab| lab.engines[self.index].position)
    }

    fn reset(&mut self) -> BridgeResult<()> {
        self.record(Call::Reset);
        Ok(())
    }

    fn release(&mut self) -> BridgeResult<()> {
        self.record_fallible(Call::Release, |lab| lab.fail_release)
    }
}

pub struct ScriptedFactory {
    lab: SharedLab,
}

impl EngineFactory for ScriptedFactory {
    fn create_engine(&self) -> BridgeResult<Box<dyn PlaybackEngine>> {
        let index = self.lab.with(|lab| {
            if lab.fail_create {
                return None;
            }
            lab.engines.push(EngineRecord::default());
            Some(lab.engines.len() - 1)
        });

        match index {
            Some(index) => Ok(Box::new(ScriptedEngine {
                index,
                lab: self.lab.clone(),
            })),
            None => Err(BridgeError::NotAvailable("media service down".to_string())),
        }
    }
}

// ============================================================================
// Recording Notifier
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Duration(Option<Duration>),
    Playing,
    Completion,
    SeekComplete,
    Error(String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    notes: Mutex<Vec<(PlayerId, Note)>>,
}

impl RecordingNotifier {
    pub fn notes(&self) -> Vec<Note> {
        self.notes
            .lock()
            .unwrap()
            .iter()
            .map(|(_, note)| note.clone())
            .collect()
    }

    pub fn notes_for(&self, player_id: &PlayerId) -> Vec<Note> {
        self.notes
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == player_id)
            .map(|(_, note)| note.clone())
            .collect()
    }

    fn push(&self, player_id: &PlayerId, note: Note) {
        self.notes.lock().unwrap().push((player_id.clone(), note));
    }
}

impl PlayerNotifier for RecordingNotifier {
    fn notify_duration(&self, player_id: &PlayerId, duration: Option<Duration>) {
        self.push(player_id, Note::Duration(duration));
    }

    fn notify_playing(&self, player_id: &PlayerId) {
        self.push(player_id, Note::Playing);
    }

    fn notify_completion(&self, player_id: &PlayerId) {
        self.push(player_id, Note::Completion);
    }

    fn notify_seek_complete(&self, player_id: &PlayerId) {
        self.push(player_id, Note::SeekComplete);
    }

    fn notify_error(&self, player_id: &PlayerId, message: &str) {
        self.push(player_id, Note::Error(message.to_string()));
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub struct Fixture {
    pub lab: SharedLab,
    pub notifier: Arc<RecordingNotifier>,
    pub config: CoreConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_focus(manager: Arc<dyn AudioFocusManager>) -> Self {
        Self::build(Some(manager))
    }

    fn build(focus_manager: Option<Arc<dyn AudioFocusManager>>) -> Self {
        init_test_logging();
        let lab = SharedLab::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let mut builder = CoreConfig::builder()
            .engine_factory(Arc::new(ScriptedFactory { lab: lab.clone() }))
            .notifier(notifier.clone());
        if let Some(manager) = focus_manager {
            builder = builder.focus_manager(manager);
        }
        let config = builder.build().expect("valid config");

        Self {
            lab,
            notifier,
            config,
        }
    }

    pub fn player(&self) -> PlayerController {
        self.player_with(PlayerDefaults::default())
    }

    pub fn player_with(&self, defaults: PlayerDefaults) -> PlayerController {
        PlayerController::new(PlayerId::new("test"), &self.config, defaults)
            .expect("valid defaults")
    }
}

pub const TRACK: &str = "https://cdn.example.com/track.mp3";
pub const OTHER_TRACK: &str = "https://cdn.example.com/other.mp3";

pub fn assert_invariant(player: &PlayerController) {
    assert_eq!(
        player.has_engine(),
        !player.state().is_released(),
        "engine presence out of sync with state {:?}",
        player.state()
    );
}

// ============================================================================
// Logging
// ============================================================================

/// Route controller logs to the test harness. `RUST_LOG` overrides the level.
pub fn init_test_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("core_playback=debug"));
    // Another test in this binary may have installed it already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// In-memory log output for asserting on emitted events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Subscriber writing plain text into this buffer.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let logs = self.clone();
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("core_playback=trace"))
            .with_ansi(false)
            .with_writer(move || logs.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
