//! Session events and broadcasting.
//!
//! A [`LessonSession`](crate::LessonSession) publishes an event for every
//! transition it makes so observers (the terminal front end, logging, tests)
//! can follow along without touching the session itself.
//!
//! # Example
//!
//! ```
//! use psychostats_core::events::{EventBroadcaster, SessionEvent};
//!
//! let broadcaster = EventBroadcaster::new(16);
//! let mut receiver = broadcaster.subscribe();
//! broadcaster.send(SessionEvent::platform_required("1.1"));
//! assert!(matches!(receiver.try_recv(), Ok(SessionEvent::PlatformRequired(_))));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::platform::Platform;
use crate::progress::LessonStatus;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `lesson_selected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSelectedPayload {
    /// Identifier of the lesson now shown.
    pub lesson_id: String,
    /// When the selection happened.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `platform_required` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRequiredPayload {
    /// Lesson waiting for a platform.
    pub lesson_id: String,
}

/// Payload for the `platform_chosen` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformChosenPayload {
    /// The selected platform.
    pub platform: Platform,
}

/// Payload for the `content_requested` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequestedPayload {
    /// Lesson being generated.
    pub lesson_id: String,
    /// Platform the lesson is tailored to.
    pub platform: Platform,
    /// Whether this is a simplified re-explanation.
    pub reinforcement: bool,
}

/// Payload for the `content_ready` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentReadyPayload {
    /// Lesson whose content arrived.
    pub lesson_id: String,
    /// Whether this was a simplified re-explanation.
    pub reinforcement: bool,
    /// Number of supplementary links.
    pub links: usize,
    /// When the content was committed.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `illustration_ready` and `illustration_absent` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustrationPayload {
    /// Lesson the illustration belongs to.
    pub lesson_id: String,
}

/// Payload for the `stale_result_discarded` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleResultPayload {
    /// Lesson the discarded result was requested for.
    pub lesson_id: String,
    /// `content` or `illustration`.
    pub kind: String,
}

/// Payload for the `feedback_recorded` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPayload {
    /// Lesson the feedback is for.
    pub lesson_id: String,
    /// Recorded status.
    pub status: LessonStatus,
    /// When the feedback was given.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `error` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Lesson session events.
///
/// Serialized as JSON objects with `event` and `payload` fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A lesson was selected.
    LessonSelected(LessonSelectedPayload),
    /// Content is withheld until a platform is chosen.
    PlatformRequired(PlatformRequiredPayload),
    /// A platform was chosen.
    PlatformChosen(PlatformChosenPayload),
    /// A content request was issued.
    ContentRequested(ContentRequestedPayload),
    /// Content was committed.
    ContentReady(ContentReadyPayload),
    /// An illustration was committed.
    IllustrationReady(IllustrationPayload),
    /// The illustration could not be produced.
    IllustrationAbsent(IllustrationPayload),
    /// A result for a superseded request was ignored.
    StaleResultDiscarded(StaleResultPayload),
    /// Lesson feedback was stored.
    FeedbackRecorded(FeedbackPayload),
    /// A non-fatal error occurred.
    Error(ErrorPayload),
}

impl SessionEvent {
    /// Creates a `LessonSelected` event.
    #[must_use]
    pub fn lesson_selected(lesson_id: impl Into<String>) -> Self {
        Self::LessonSelected(LessonSelectedPayload {
            lesson_id: lesson_id.into(),
            timestamp: Utc::now(),
        })
    }

    /// Creates a `PlatformRequired` event.
    #[must_use]
    pub fn platform_required(lesson_id: impl Into<String>) -> Self {
        Self::PlatformRequired(PlatformRequiredPayload {
            lesson_id: lesson_id.into(),
        })
    }

    /// Creates a `PlatformChosen` event.
    #[must_use]
    pub const fn platform_chosen(platform: Platform) -> Self {
        Self::PlatformChosen(PlatformChosenPayload { platform })
    }

    /// Creates a `ContentRequested` event.
    #[must_use]
    pub fn content_requested(
        lesson_id: impl Into<String>,
        platform: Platform,
        reinforcement: bool,
    ) -> Self {
        Self::ContentRequested(ContentRequestedPayload {
            lesson_id: lesson_id.into(),
            platform,
            reinforcement,
        })
    }

    /// Creates a `ContentReady` event.
    #[must_use]
    pub fn content_ready(lesson_id: impl Into<String>, reinforcement: bool, links: usize) -> Self {
        Self::ContentReady(ContentReadyPayload {
            lesson_id: lesson_id.into(),
            reinforcement,
            links,
            timestamp: Utc::now(),
        })
    }

    /// Creates an `IllustrationReady` or `IllustrationAbsent` event.
    #[must_use]
    pub fn illustration(lesson_id: impl Into<String>, ready: bool) -> Self {
        let payload = IllustrationPayload {
            lesson_id: lesson_id.into(),
        };
        if ready {
            Self::IllustrationReady(payload)
        } else {
            Self::IllustrationAbsent(payload)
        }
    }

    /// Creates a `StaleResultDiscarded` event.
    #[must_use]
    pub fn stale_result(lesson_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::StaleResultDiscarded(StaleResultPayload {
            lesson_id: lesson_id.into(),
            kind: kind.into(),
        })
    }

    /// Creates a `FeedbackRecorded` event.
    #[must_use]
    pub fn feedback_recorded(lesson_id: impl Into<String>, status: LessonStatus) -> Self {
        Self::FeedbackRecorded(FeedbackPayload {
            lesson_id: lesson_id.into(),
            status,
            timestamp: Utc::now(),
        })
    }

    /// Creates an `Error` event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::LessonSelected(_) => "lesson_selected",
            Self::PlatformRequired(_) => "platform_required",
            Self::PlatformChosen(_) => "platform_chosen",
            Self::ContentRequested(_) => "content_requested",
            Self::ContentReady(_) => "content_ready",
            Self::IllustrationReady(_) => "illustration_ready",
            Self::IllustrationAbsent(_) => "illustration_absent",
            Self::StaleResultDiscarded(_) => "stale_result_discarded",
            Self::FeedbackRecorded(_) => "feedback_recorded",
            Self::Error(_) => "error",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to every subscriber.
///
/// Events are not kept for subscribers that join later.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    ///
    /// A subscriber that falls behind receives a `Lagged` error and misses
    /// the oldest events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event and returns how many subscribers will see it.
    pub fn send(&self, event: SessionEvent) -> usize {
        // Err only means nobody is subscribed.
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
