//! # Event Bus System
//!
//! Publishes player notifications over `tokio::sync::broadcast` so that any
//! number of host-side listeners (UI bindings, media-session integrations,
//! analytics) can observe players without the players knowing about them.
//!
//! ## Overview
//!
//! - **[`PlayerEvent`]**: one variant per notification a player emits
//! - **[`EventBus`]**: cloneable broadcast sender
//! - **[`EventStream`]**: receiver wrapper with optional filtering
//! - **[`EventBusNotifier`]**: [`PlayerNotifier`] implementation that
//!   publishes to an `EventBus`
//!
//! ```text
//! ┌────────────┐ notify_*  ┌─────────────────┐ emit ┌──────────┐ subscribe ┌──────┐
//! │ Player "a" ├──────────>│                 ├─────>│          ├──────────>│  UI  │
//! └────────────┘           │ EventBusNotifier│      │ EventBus │           └──────┘
//! ┌────────────┐ notify_*  │                 │      │          │ subscribe ┌──────┐
//! │ Player "b" ├──────────>│                 │      │          ├──────────>│ ...  │
//! └────────────┘           └─────────────────┘      └──────────┘           └──────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, PlayerEvent};
//! use bridge_traits::PlayerId;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(PlayerEvent::Playing { player_id: PlayerId::from("main") }).ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.player_id().as_str(), "main");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; non-fatal.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! Emitting with no subscribers is not an error for players: the notifier
//! drops the event silently, matching the fire-and-forget contract.

use bridge_traits::{PlayerId, PlayerNotifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::trace;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Player Events
// ============================================================================

/// Notification emitted by a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// Preparation finished and the duration is known (if the media has one).
    DurationAvailable {
        player_id: PlayerId,
        /// Duration in milliseconds; `None` for live streams.
        duration_ms: Option<u64>,
    },
    /// Playback actually started.
    Playing { player_id: PlayerId },
    /// Natural end of media was reached.
    Completed { player_id: PlayerId },
    /// A seek finished.
    SeekCompleted { player_id: PlayerId },
    /// The engine reported an error.
    Error {
        player_id: PlayerId,
        /// Human-readable classification of the engine error.
        message: String,
    },
}

impl PlayerEvent {
    /// The player the event belongs to.
    pub fn player_id(&self) -> &PlayerId {
        match self {
            PlayerEvent::DurationAvailable { player_id, .. }
            | PlayerEvent::Playing { player_id }
            | PlayerEvent::Completed { player_id }
            | PlayerEvent::SeekCompleted { player_id }
            | PlayerEvent::Error { player_id, .. } => player_id,
        }
    }

    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlayerEvent::DurationAvailable { .. } => "Duration available",
            PlayerEvent::Playing { .. } => "Playback started",
            PlayerEvent::Completed { .. } => "Playback completed",
            PlayerEvent::SeekCompleted { .. } => "Seek completed",
            PlayerEvent::Error { .. } => "Playback error",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Error { .. } => EventSeverity::Error,
            PlayerEvent::Playing { .. } | PlayerEvent::Completed { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to player events.
///
/// Clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Notifier Adapter
// ============================================================================

/// [`PlayerNotifier`] that publishes every notification to an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventBusNotifier {
    bus: EventBus,
}

impl EventBusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    fn publish(&self, event: PlayerEvent) {
        if let Err(SendError(event)) = self.bus.emit(event) {
            trace!(
                player_id = %event.player_id(),
                event = event.description(),
                "No subscribers for player event"
            );
        }
    }
}

impl PlayerNotifier for EventBusNotifier {
    fn notify_duration(&self, player_id: &PlayerId, duration: Option<Duration>) {
        self.publish(PlayerEvent::DurationAvailable {
            player_id: player_id.clone(),
            duration_ms: duration.map(|d| d.as_millis() as u64),
        });
    }

    fn notify_playing(&self, player_id: &PlayerId) {
        self.publish(PlayerEvent::Playing {
            player_id: player_id.clone(),
        });
    }

    fn notify_completion(&self, player_id: &PlayerId) {
        self.publish(PlayerEvent::Completed {
            player_id: player_id.clone(),
        });
    }

    fn notify_seek_complete(&self, player_id: &PlayerId) {
        self.publish(PlayerEvent::SeekCompleted {
            player_id: player_id.clone(),
        });
    }

    fn notify_error(&self, player_id: &PlayerId, message: &str) {
        self.publish(PlayerEvent::Error {
            player_id: player_id.clone(),
            message: message.to_string(),
        });
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
/// use bridge_traits::PlayerId;
///
/// let bus = EventBus::new(16);
/// let main = PlayerId::from("main");
/// let stream = EventStream::new(bus.subscribe())
///     .filter(move |event| event.player_id() == &main);
/// ```
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &PlayerEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once all senders are dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
