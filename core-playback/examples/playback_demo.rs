//! # Player Controller Usage Example
//!
//! Drives a controller against an in-process engine that "prepares" on the
//! next event-loop turn, to show the deferred play and seek flow.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::logging::LogLevel;
use bridge_traits::{
    AudioAttributes, EngineFactory, EngineListeners, EngineSource, PlaybackEngine,
};
use core_playback::{PlayerDefaults, PlayerRegistry, ReleaseMode};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::CoreConfig;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Simulated Engine
// ============================================================================

/// Engine that completes preparation immediately and tracks its position.
struct SimulatedEngine {
    listeners: EngineListeners,
    position: Duration,
}

impl PlaybackEngine for SimulatedEngine {
    fn set_listeners(&mut self, listeners: EngineListeners) {
        self.listeners = listeners;
    }

    fn set_audio_attributes(&mut self, attributes: AudioAttributes) -> BridgeResult<()> {
        println!("  engine: attributes {:?}", attributes.usage);
        Ok(())
    }

    fn set_data_source(&mut self, source: &EngineSource) -> BridgeResult<()> {
        println!("  engine: bound source (remote: {})", source.is_remote());
        Ok(())
    }

    fn prepare_async(&mut self) -> BridgeResult<()> {
        // Listeners only enqueue, so calling one from inside the engine is fine
        (self.listeners.on_prepared)();
        Ok(())
    }

    fn prepare(&mut self) -> BridgeResult<()> {
        Ok(())
    }

    fn start(&mut self) -> BridgeResult<()> {
        println!("  engine: start");
        Ok(())
    }

    fn pause(&mut self) -> BridgeResult<()> {
        println!("  engine: pause");
        Ok(())
    }

    fn stop(&mut self) -> BridgeResult<()> {
        Ok(())
    }

    fn seek_to(&mut self, position: Duration) -> BridgeResult<()> {
        println!("  engine: seek to {:?}", position);
        self.position = position;
        (self.listeners.on_seek_complete)();
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> BridgeResult<()> {
        Ok(())
    }

    fn set_looping(&mut self, _looping: bool) -> BridgeResult<()> {
        Ok(())
    }

    fn set_playback_speed(&mut self, _speed: f32) -> BridgeResult<()> {
        Ok(())
    }

    fn set_wake_mode(&mut self, _stay_awake: bool) -> BridgeResult<()> {
        Ok(())
    }

    fn duration(&self) -> Option<Duration> {
        Some(Duration::from_secs(180))
    }

    fn current_position(&self) -> Duration {
        self.position
    }

    fn reset(&mut self) -> BridgeResult<()> {
        Ok(())
    }

    fn release(&mut self) -> BridgeResult<()> {
        println!("  engine: released");
        Ok(())
    }
}

struct SimulatedFactory;

impl EngineFactory for SimulatedFactory {
    fn create_engine(&self) -> BridgeResult<Box<dyn PlaybackEngine>> {
        Ok(Box::new(SimulatedEngine {
            listeners: EngineListeners::noop(),
            position: Duration::ZERO,
        }))
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let config = CoreConfig::builder()
        .engine_factory(Arc::new(SimulatedFactory))
        .build()?;
    let mut events = config.event_bus.subscribe();
    let mut registry = PlayerRegistry::new(config, PlayerDefaults::default())?;

    let id = "demo".into();
    let player = registry.get_or_create(&id)?;

    println!("== play and seek before the engine is ready");
    player.set_url("https://example.com/audio/intro.mp3?token=secret", false)?;
    player.play()?;
    player.seek(Duration::from_secs(30))?;
    println!("  state: {}", player.state());

    println!("== dispatch callbacks");
    player.dispatch_pending()?;
    player.dispatch_pending()?;
    println!("  state: {}", player.state());

    println!("== stop in loop mode keeps the engine warm");
    player.set_release_mode(ReleaseMode::Loop)?;
    player.stop()?;
    println!("  state: {}", player.state());

    println!("== release everything");
    registry.release_all()?;

    println!("== events published on the bus");
    while let Ok(event) = events.try_recv() {
        println!("  {} ({:?})", event.description(), event.severity());
    }

    Ok(())
}
