//! # Source Binder
//!
//! Resolves client sources into [`EngineSource`] descriptors and binds them
//! to an engine handle.

use crate::error::{PlaybackError, Result};
use bridge_traits::{BridgeError, EngineSource, MediaBuffer, PlaybackEngine};
use core_runtime::logging::{redact_url, strip_path};
use std::fmt;
use std::path::PathBuf;

const FILE_SCHEME: &str = "file://";

/// Source requested by the client.
///
/// Equality drives reload suppression: URLs compare by text and locality,
/// buffers by identity (see [`MediaBuffer`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlayerSource {
    #[default]
    None,
    Url { url: String, is_local: bool },
    Buffer(MediaBuffer),
}

impl PlayerSource {
    pub fn url(url: impl Into<String>, is_local: bool) -> Self {
        PlayerSource::Url {
            url: url.into(),
            is_local,
        }
    }

    pub fn buffer(buffer: MediaBuffer) -> Self {
        PlayerSource::Buffer(buffer)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PlayerSource::None)
    }

    /// Engine descriptor for this source, `None` when nothing is set.
    pub fn to_engine_source(&self) -> Option<EngineSource> {
        match self {
            PlayerSource::None => None,
            PlayerSource::Url {
                url,
                is_local: true,
            } => {
                let path = url.strip_prefix(FILE_SCHEME).unwrap_or(url.as_str());
                Some(EngineSource::LocalFile {
                    path: PathBuf::from(path),
                })
            }
            PlayerSource::Url {
                url,
                is_local: false,
            } => Some(EngineSource::RemoteStream { url: url.clone() }),
            PlayerSource::Buffer(data) => Some(EngineSource::MemoryBuffer { data: data.clone() }),
        }
    }

    /// Log-safe rendering: query strings and directories are dropped.
    pub fn redacted(&self) -> String {
        match self {
            PlayerSource::None => "none".to_string(),
            PlayerSource::Url {
                url,
                is_local: true,
            } => format!("file:{}", strip_path(url)),
            PlayerSource::Url {
                url,
                is_local: false,
            } => redact_url(url),
            PlayerSource::Buffer(data) => format!("buffer:{}B", data.len()),
        }
    }
}

impl fmt::Display for PlayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Error for operations that need a source when none is set.
pub fn missing_source() -> PlaybackError {
    PlaybackError::resource_access(
        "No source to bind",
        BridgeError::IllegalState("player has no source".to_string()),
    )
}

/// Bind `source` to an engine that is in its idle (unprepared) state.
///
/// Failures surface as [`PlaybackError::ResourceAccess`] carrying the bridge
/// cause.
pub fn bind_source(engine: &mut dyn PlaybackEngine, source: &PlayerSource) -> Result<()> {
    let Some(engine_source) = source.to_engine_source() else {
        return Err(missing_source());
    };

    let message = match source {
        PlayerSource::Buffer(_) => "Unable to access media resource",
        _ => "Unable to access resource",
    };

    engine
        .set_data_source(&engine_source)
        .map_err(|e| PlaybackError::resource_access(message, e))
}

/// Engine handle exclusively owned by one controller.
///
/// The generation identifies the listener set installed on the engine;
/// callbacks carrying an older generation belong to a superseded binding.
pub struct EngineHandle {
    engine: Box<dyn PlaybackEngine>,
    generation: u64,
}

impl EngineHandle {
    pub fn new(engine: Box<dyn PlaybackEngine>, generation: u64) -> Self {
        Self { engine, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn engine(&self) -> &dyn PlaybackEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn PlaybackEngine {
        self.engine.as_mut()
    }

    /// Stop (optionally), reset and release the engine, consuming the handle.
    ///
    /// Every step runs even if an earlier one fails; the collected failures
    /// are returned together.
    pub fn teardown(mut self, stop_first: bool) -> std::result::Result<(), Vec<BridgeError>> {
        let mut failures = Vec::new();

        if stop_first {
            if let Err(e) = self.engine.stop() {
                failures.push(e);
            }
        }
        if let Err(e) = self.engine.reset() {
            failures.push(e);
        }
        if let Err(e) = self.engine.release() {
            failures.push(e);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
