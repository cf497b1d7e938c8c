//! Native playback engine bridge and supporting audio types.
//!
//! The engine is the platform's decode/render resource (a media player object
//! on mobile, a native sink on desktop). The core never decodes audio itself:
//! it drives an engine through [`PlaybackEngine`] and receives asynchronous
//! notifications through the named callback slots in [`EngineListeners`].
//!
//! Engine calls are expected to return quickly. The only long-latency step is
//! preparation, which is split into [`PlaybackEngine::prepare_async`]
//! (completion reported through `on_prepared`) and the blocking
//! [`PlaybackEngine::prepare`].

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Audio Attributes
// ============================================================================

/// Usage category reported to the platform mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCategory {
    /// Regular media playback.
    Media,
    /// Ringtone-like usage; honours the device silent switch.
    NotificationRingtone,
    /// Voice communication; lets the platform route to earpiece or bluetooth.
    VoiceCommunication,
}

impl UsageCategory {
    /// Returns `true` for communication usages.
    pub fn is_communication(&self) -> bool {
        matches!(self, UsageCategory::VoiceCommunication)
    }
}

/// Content type reported alongside the usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Music,
    Speech,
    Sonification,
}

/// Audio attributes applied to an engine or a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioAttributes {
    pub usage: UsageCategory,
    pub content_type: ContentType,
}

impl AudioAttributes {
    /// Attributes for music content with the given usage.
    pub fn music(usage: UsageCategory) -> Self {
        Self {
            usage,
            content_type: ContentType::Music,
        }
    }
}

// ============================================================================
// Sources
// ============================================================================

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

/// Encoded audio held in memory by the client.
///
/// Equality is identity: each [`MediaBuffer::new`] call mints a fresh
/// identity that clones share. Re-submitting the same buffer does not trigger
/// a reload, while a separately wrapped buffer does, even when the bytes are
/// identical or both are empty.
#[derive(Clone)]
pub struct MediaBuffer {
    id: u64,
    data: Bytes,
}

impl MediaBuffer {
    /// Wrap encoded audio bytes under a new identity.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            data: data.into(),
        }
    }

    /// Borrow the encoded bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if both handles come from the same [`MediaBuffer::new`] call.
    pub fn same_buffer(&self, other: &MediaBuffer) -> bool {
        self.id == other.id
    }
}

impl PartialEq for MediaBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.same_buffer(other)
    }
}

impl Eq for MediaBuffer {}

impl fmt::Debug for MediaBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Source descriptor handed to [`PlaybackEngine::set_data_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSource {
    /// File on the local filesystem.
    LocalFile { path: PathBuf },
    /// Remote stream fetched by the engine.
    RemoteStream { url: String },
    /// Encoded audio supplied from memory.
    MemoryBuffer { data: MediaBuffer },
}

impl EngineSource {
    /// Returns `true` if the engine needs network access for this source.
    pub fn is_remote(&self) -> bool {
        matches!(self, EngineSource::RemoteStream { .. })
    }
}

// ============================================================================
// Engine Errors
// ============================================================================

/// Engine error code: media server died.
pub const MEDIA_ERROR_SERVER_DIED: i32 = 100;
/// Engine extra code: low-level system error.
pub const MEDIA_ERROR_SYSTEM: i32 = i32::MIN;
/// Engine extra code: file or network I/O error.
pub const MEDIA_ERROR_IO: i32 = -1004;
/// Engine extra code: malformed bitstream.
pub const MEDIA_ERROR_MALFORMED: i32 = -1007;
/// Engine extra code: feature not supported by the engine.
pub const MEDIA_ERROR_UNSUPPORTED: i32 = -1010;
/// Engine extra code: operation timed out.
pub const MEDIA_ERROR_TIMED_OUT: i32 = -110;

/// Primary ("what") classification of an engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorWhat {
    ServerDied,
    Unknown(i32),
}

impl MediaErrorWhat {
    pub fn from_code(code: i32) -> Self {
        match code {
            MEDIA_ERROR_SERVER_DIED => MediaErrorWhat::ServerDied,
            other => MediaErrorWhat::Unknown(other),
        }
    }
}

impl fmt::Display for MediaErrorWhat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaErrorWhat::ServerDied => f.write_str("MEDIA_ERROR_SERVER_DIED"),
            MediaErrorWhat::Unknown(code) => write!(f, "MEDIA_ERROR_UNKNOWN {{what:{}}}", code),
        }
    }
}

/// Secondary ("extra") classification of an engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorExtra {
    System,
    Io,
    Malformed,
    Unsupported,
    TimedOut,
    Unknown(i32),
}

impl MediaErrorExtra {
    pub fn from_code(code: i32) -> Self {
        match code {
            MEDIA_ERROR_SYSTEM => MediaErrorExtra::System,
            MEDIA_ERROR_IO => MediaErrorExtra::Io,
            MEDIA_ERROR_MALFORMED => MediaErrorExtra::Malformed,
            MEDIA_ERROR_UNSUPPORTED => MediaErrorExtra::Unsupported,
            MEDIA_ERROR_TIMED_OUT => MediaErrorExtra::TimedOut,
            other => MediaErrorExtra::Unknown(other),
        }
    }
}

impl fmt::Display for MediaErrorExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaErrorExtra::System => f.write_str("MEDIA_ERROR_SYSTEM"),
            MediaErrorExtra::Io => f.write_str("MEDIA_ERROR_IO"),
            MediaErrorExtra::Malformed => f.write_str("MEDIA_ERROR_MALFORMED"),
            MediaErrorExtra::Unsupported => f.write_str("MEDIA_ERROR_UNSUPPORTED"),
            MediaErrorExtra::TimedOut => f.write_str("MEDIA_ERROR_TIMED_OUT"),
            MediaErrorExtra::Unknown(code) => write!(f, "MEDIA_ERROR_UNKNOWN {{extra:{}}}", code),
        }
    }
}

// ============================================================================
// Callback Slots
// ============================================================================

/// Asynchronous notification raised by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Asynchronous preparation finished.
    Prepared,
    /// Playback reached the natural end of the media.
    Completion,
    /// A seek request finished.
    SeekComplete,
    /// The engine hit a runtime error.
    Error { what: i32, extra: i32 },
}

/// Callback without payload.
pub type EngineCallback = Box<dyn Fn() + Send + Sync>;

/// Error callback. The return value tells the engine whether the error was
/// handled; `false` lets the engine run its default recovery.
pub type EngineErrorCallback = Box<dyn Fn(i32, i32) -> bool + Send + Sync>;

/// Named callback slots assigned to an engine by its owner.
pub struct EngineListeners {
    pub on_prepared: EngineCallback,
    pub on_completion: EngineCallback,
    pub on_seek_complete: EngineCallback,
    pub on_error: EngineErrorCallback,
}

impl EngineListeners {
    /// Listeners that ignore every notification.
    pub fn noop() -> Self {
        Self {
            on_prepared: Box::new(|| {}),
            on_completion: Box::new(|| {}),
            on_seek_complete: Box::new(|| {}),
            on_error: Box::new(|_, _| false),
        }
    }

    /// Route every slot into a single event handler.
    ///
    /// `error_handled` is returned to the engine from the error slot.
    pub fn forward_to<F>(handler: F, error_handled: bool) -> Self
    where
        F: Fn(EngineEvent) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let prepared = Arc::clone(&handler);
        let completion = Arc::clone(&handler);
        let seek_complete = Arc::clone(&handler);
        let error = handler;

        Self {
            on_prepared: Box::new(move || prepared(EngineEvent::Prepared)),
            on_completion: Box::new(move || completion(EngineEvent::Completion)),
            on_seek_complete: Box::new(move || seek_complete(EngineEvent::SeekComplete)),
            on_error: Box::new(move |what, extra| {
                error(EngineEvent::Error { what, extra });
                error_handled
            }),
        }
    }
}

impl fmt::Debug for EngineListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineListeners").finish_non_exhaustive()
    }
}

// ============================================================================
// Engine Traits
// ============================================================================

/// A single native playback resource.
///
/// An engine accepts a new data source only from its idle (unprepared) state;
/// callers reset a prepared engine before rebinding it. After
/// [`release`](PlaybackEngine::release) the engine must not be used again.
pub trait PlaybackEngine: PlatformSend {
    /// Install the callback slots. Replaces any previously installed listeners.
    fn set_listeners(&mut self, listeners: EngineListeners);

    /// Apply usage and content-type attributes.
    fn set_audio_attributes(&mut self, attributes: AudioAttributes) -> Result<()>;

    /// Bind a data source. Fails if the resource cannot be opened.
    fn set_data_source(&mut self, source: &EngineSource) -> Result<()>;

    /// Start asynchronous preparation; completion is reported via `on_prepared`.
    fn prepare_async(&mut self) -> Result<()>;

    /// Prepare synchronously, blocking until the engine is ready.
    fn prepare(&mut self) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Seek to an absolute position; completion is reported via `on_seek_complete`.
    fn seek_to(&mut self, position: Duration) -> Result<()>;

    /// Set output volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    fn set_looping(&mut self, looping: bool) -> Result<()>;

    /// Change the playback speed multiplier.
    fn set_playback_speed(&mut self, speed: f32) -> Result<()>;

    /// Hold (or drop) a partial wake lock while playing.
    fn set_wake_mode(&mut self, stay_awake: bool) -> Result<()>;

    /// Total media duration, when known.
    fn duration(&self) -> Option<Duration>;

    fn current_position(&self) -> Duration;

    /// Return the engine to its idle state, dropping the bound source.
    fn reset(&mut self) -> Result<()>;

    /// Free the native resource.
    fn release(&mut self) -> Result<()>;
}

/// Creates fresh engine handles. Each call yields an exclusively owned engine.
pub trait EngineFactory: PlatformSendSync {
    fn create_engine(&self) -> Result<Box<dyn PlaybackEngine>>;
}
