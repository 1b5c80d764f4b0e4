//! Lesson orchestration state machine.
//!
//! [`LessonSession`] owns the current lesson, its content and illustration
//! tracks, and the progress store. It performs no I/O: every transition that
//! needs remote data returns [`FetchRequest`]s, and the results come back
//! through [`LessonSession::apply`]. Each request carries a [`FetchTicket`];
//! a result is committed only while its ticket is still the current one, so
//! answers for a lesson or platform the student already left are dropped.
//!
//! Content track:
//! - `NoPlatformSelected` until a platform is known (no request is issued)
//! - `Loading` -> `Ready` when content arrives
//! - `Ready` -> `ReinforcementPending` -> `Ready` for a simplified re-fetch
//!
//! The illustration track (`Loading` -> `Ready | Absent`) restarts on lesson
//! change only.

use std::fmt;

use psychostats_markup::RenderBlock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::content::{Illustration, LessonContent};
use crate::curriculum::LessonTopic;
use crate::error::{PsychoError, Result};
use crate::events::{EventBroadcaster, SessionEvent};
use crate::platform::Platform;
use crate::progress::{LessonStatus, ProgressStore};

// ============================================================================
// States
// ============================================================================

/// State of the content track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonState {
    /// Waiting for the student to pick a platform.
    NoPlatformSelected,
    /// Content for the current lesson is being generated.
    Loading,
    /// Content is displayed.
    Ready,
    /// Content is displayed while a simplified version is generated.
    ReinforcementPending,
}

impl LessonState {
    /// Returns `true` if lesson content is visible in this state.
    #[must_use]
    pub const fn shows_content(&self) -> bool {
        matches!(self, Self::Ready | Self::ReinforcementPending)
    }
}

impl fmt::Display for LessonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoPlatformSelected => "no_platform_selected",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::ReinforcementPending => "reinforcement_pending",
        };
        f.write_str(name)
    }
}

/// State of the illustration track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    /// The illustration is being generated.
    Loading,
    /// The illustration is available.
    Ready(Illustration),
    /// No illustration; a static decoration is shown instead.
    Absent,
}

// ============================================================================
// Requests and outcomes
// ============================================================================

/// Snapshot of what a request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    /// Lesson the request is for.
    pub lesson_id: &'static str,
    /// Platform the content is tailored to; `None` for illustrations.
    pub platform: Option<Platform>,
    /// Whether simplified content was requested.
    pub reinforcement: bool,
}

/// Remote work the session needs done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Generate lesson content.
    Content {
        /// Ticket to hand back with the result.
        ticket: FetchTicket,
        /// Lesson to generate.
        topic: &'static LessonTopic,
        /// Platform to tailor to.
        platform: Platform,
        /// Whether to simplify.
        reinforcement: bool,
    },
    /// Generate the lesson illustration.
    Illustration {
        /// Ticket to hand back with the result.
        ticket: FetchTicket,
        /// Concept to illustrate.
        concept: &'static str,
    },
}

impl FetchRequest {
    /// The request's ticket.
    #[must_use]
    pub const fn ticket(&self) -> FetchTicket {
        match self {
            Self::Content { ticket, .. } | Self::Illustration { ticket, .. } => *ticket,
        }
    }
}

/// Result of a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Lesson content arrived.
    Content {
        /// Ticket of the originating request.
        ticket: FetchTicket,
        /// The content.
        content: LessonContent,
    },
    /// The illustration attempt finished.
    Illustration {
        /// Ticket of the originating request.
        ticket: FetchTicket,
        /// The image, if one was produced.
        illustration: Option<Illustration>,
    },
}

// ============================================================================
// LessonSession
// ============================================================================

/// The lesson view's state machine.
#[derive(Debug)]
pub struct LessonSession {
    store: ProgressStore,
    lesson: &'static LessonTopic,
    state: LessonState,
    content: Option<LessonContent>,
    image: ImageState,
    next_seq: u64,
    content_ticket: Option<FetchTicket>,
    image_ticket: Option<FetchTicket>,
    scroll_to_top: bool,
    events: EventBroadcaster,
}

impl LessonSession {
    /// Creates a session showing `lesson`, without issuing any request.
    ///
    /// Call [`select_lesson`](Self::select_lesson) to start loading.
    #[must_use]
    pub fn new(store: ProgressStore, lesson: &'static LessonTopic) -> Self {
        Self {
            store,
            lesson,
            state: LessonState::NoPlatformSelected,
            content: None,
            image: ImageState::Absent,
            next_seq: 0,
            content_ticket: None,
            image_ticket: None,
            scroll_to_top: false,
            events: EventBroadcaster::default(),
        }
    }

    /// Publishes events on `events` instead of a private broadcaster.
    #[must_use]
    pub fn with_events(mut self, events: EventBroadcaster) -> Self {
        self.events = events;
        self
    }

    /// Broadcaster the session publishes on.
    #[must_use]
    pub const fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current content track state.
    #[must_use]
    pub const fn state(&self) -> LessonState {
        self.state
    }

    /// Current lesson.
    #[must_use]
    pub const fn lesson(&self) -> &'static LessonTopic {
        self.lesson
    }

    /// Displayed content, if any.
    #[must_use]
    pub const fn content(&self) -> Option<&LessonContent> {
        self.content.as_ref()
    }

    /// Displayed content interpreted into blocks.
    #[must_use]
    pub fn blocks(&self) -> Vec<RenderBlock> {
        self.content.as_ref().map(LessonContent::blocks).unwrap_or_default()
    }

    /// Illustration track state.
    #[must_use]
    pub const fn image(&self) -> &ImageState {
        &self.image
    }

    /// Selected platform.
    #[must_use]
    pub const fn platform(&self) -> Option<Platform> {
        self.store.platform()
    }

    /// Progress store.
    #[must_use]
    pub const fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Status recorded for the current lesson.
    #[must_use]
    pub fn status(&self) -> Option<LessonStatus> {
        self.store.status(self.lesson.id)
    }

    /// Returns `true` while a content result is outstanding.
    #[must_use]
    pub const fn awaiting_content(&self) -> bool {
        self.content_ticket.is_some()
    }

    /// Returns `true` while an illustration result is outstanding.
    #[must_use]
    pub const fn awaiting_illustration(&self) -> bool {
        self.image_ticket.is_some()
    }

    /// Returns and clears the request to scroll the view to the top.
    ///
    /// Set when simplified content replaces the previous explanation.
    pub fn take_scroll_to_top(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_top)
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Switches to `lesson`, clearing displayed content and restarting both
    /// tracks.
    ///
    /// Without a platform the content track stays in `NoPlatformSelected`
    /// and only the illustration is requested.
    pub fn select_lesson(&mut self, lesson: &'static LessonTopic) -> Vec<FetchRequest> {
        info!(lesson = lesson.id, "Lesson selected");
        self.lesson = lesson;
        self.content = None;
        self.scroll_to_top = false;
        self.events.send(SessionEvent::lesson_selected(lesson.id));

        let mut requests = Vec::with_capacity(2);
        match self.store.platform() {
            Some(platform) => requests.push(self.begin_content(platform, false)),
            None => {
                self.state = LessonState::NoPlatformSelected;
                self.content_ticket = None;
                self.events.send(SessionEvent::platform_required(lesson.id));
            }
        }

        let ticket = self.issue(None, false);
        self.image = ImageState::Loading;
        self.image_ticket = Some(ticket);
        requests.push(FetchRequest::Illustration {
            ticket,
            concept: lesson.title,
        });
        requests
    }

    /// Records the platform and reloads the lesson for it.
    ///
    /// Choosing the platform already in use while content is shown or
    /// loading changes nothing. The illustration is not restarted.
    pub fn choose_platform(&mut self, platform: Platform) -> Vec<FetchRequest> {
        let unchanged = self.store.platform() == Some(platform);
        if unchanged && self.state != LessonState::NoPlatformSelected {
            debug!(%platform, "Platform unchanged");
            return Vec::new();
        }

        if let Err(e) = self.store.set_platform(platform) {
            self.report_persist_failure(&e);
        }
        self.events.send(SessionEvent::platform_chosen(platform));
        info!(%platform, "Platform chosen");

        self.content = None;
        vec![self.begin_content(platform, false)]
    }

    /// Stores feedback for the current lesson.
    ///
    /// `NeedsReinforcement` is accepted only while content is `Ready` and
    /// requests a simplified version; the current content stays visible
    /// until it arrives. `Completed` and `ReviewLater` are accepted whenever
    /// content is shown.
    pub fn record_feedback(&mut self, status: LessonStatus) -> Result<Vec<FetchRequest>> {
        let allowed = match status {
            LessonStatus::NeedsReinforcement => self.state == LessonState::Ready,
            LessonStatus::Completed | LessonStatus::ReviewLater => self.state.shows_content(),
        };
        if !allowed {
            return Err(PsychoError::invalid_transition(self.state, status));
        }

        if let Err(e) = self.store.set_status(self.lesson.id, status) {
            self.report_persist_failure(&e);
        }
        self.events
            .send(SessionEvent::feedback_recorded(self.lesson.id, status));
        info!(lesson = self.lesson.id, %status, "Feedback recorded");

        if status != LessonStatus::NeedsReinforcement {
            return Ok(Vec::new());
        }
        let Some(platform) = self.store.platform() else {
            return Err(PsychoError::invalid_transition(
                LessonState::NoPlatformSelected,
                LessonState::ReinforcementPending,
            ));
        };
        let request = self.begin_content(platform, true);
        self.state = LessonState::ReinforcementPending;
        Ok(vec![request])
    }

    /// Commits a fetch result if its ticket is still current.
    ///
    /// Returns `false` when the result was stale and discarded.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Content { ticket, content } => self.apply_content(ticket, content),
            FetchOutcome::Illustration {
                ticket,
                illustration,
            } => self.apply_illustration(ticket, illustration),
        }
    }

    /// Commits lesson content if `ticket` is current.
    pub fn apply_content(&mut self, ticket: FetchTicket, content: LessonContent) -> bool {
        if self.content_ticket != Some(ticket) {
            debug!(lesson = ticket.lesson_id, "Discarding stale content");
            self.events
                .send(SessionEvent::stale_result(ticket.lesson_id, "content"));
            return false;
        }

        self.content_ticket = None;
        self.scroll_to_top = ticket.reinforcement;
        self.state = LessonState::Ready;
        self.events.send(SessionEvent::content_ready(
            ticket.lesson_id,
            ticket.reinforcement,
            content.links.len(),
        ));
        self.content = Some(content);
        true
    }

    /// Commits the illustration result if `ticket` is current.
    pub fn apply_illustration(
        &mut self,
        ticket: FetchTicket,
        illustration: Option<Illustration>,
    ) -> bool {
        if self.image_ticket != Some(ticket) {
            debug!(lesson = ticket.lesson_id, "Discarding stale illustration");
            self.events
                .send(SessionEvent::stale_result(ticket.lesson_id, "illustration"));
            return false;
        }

        self.image_ticket = None;
        self.events
            .send(SessionEvent::illustration(ticket.lesson_id, illustration.is_some()));
        self.image = illustration.map_or(ImageState::Absent, ImageState::Ready);
        true
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn issue(&mut self, platform: Option<Platform>, reinforcement: bool) -> FetchTicket {
        self.next_seq += 1;
        FetchTicket {
            seq: self.next_seq,
            lesson_id: self.lesson.id,
            platform,
            reinforcement,
        }
    }

    fn begin_content(&mut self, platform: Platform, reinforcement: bool) -> FetchRequest {
        let ticket = self.issue(Some(platform), reinforcement);
        self.content_ticket = Some(ticket);
        if !reinforcement {
            self.state = LessonState::Loading;
        }
        self.events.send(SessionEvent::content_requested(
            self.lesson.id,
            platform,
            reinforcement,
        ));
        FetchRequest::Content {
            ticket,
            topic: self.lesson,
            platform,
            reinforcement,
        }
    }

    fn report_persist_failure(&self, error: &PsychoError) {
        warn!(error = %error, "Failed to persist session state");
        self.events.send(SessionEvent::error(error.to_string()));
    }
}
