//! Workspace facade crate.
//!
//! Re-exports the workspace crates behind feature flags so host applications
//! can depend on `audioplayer-workspace` alone. `playback` (the default)
//! pulls in the runtime and bridge contracts as well.

#[cfg(feature = "bridges")]
pub use bridge_traits;

#[cfg(feature = "runtime")]
pub use core_runtime;

#[cfg(feature = "playback")]
pub use core_playback;
