//! PsychoStats Core
//!
//! Everything between the generation service and the terminal: the lesson
//! curriculum and function glossary, durable progress, lesson content
//! requests with their fallback policy, the tutor chat, concept videos, and
//! the lesson session state machine that ties them together.
//!
//! # Modules
//!
//! - [`config`] - `psychostats.json` loading and validation
//! - [`error`] - Error types
//! - [`curriculum`] / [`glossary`] - Static reference data
//! - [`progress`] - Progress and platform preference storage
//! - [`content`] - Lesson content and illustration requests
//! - [`session`] - Lesson state machine
//! - [`driver`] - Async execution of session requests
//! - [`events`] - Session event broadcasting
//! - [`tutor`] / [`video`] - Tutor chat and concept videos

pub mod config;
pub mod content;
pub mod curriculum;
pub mod driver;
pub mod error;
pub mod events;
pub mod glossary;
pub mod platform;
pub mod progress;
pub mod prompt;
pub mod session;
pub mod tutor;
pub mod video;

pub use config::{ColorMode, Config, VideoConfig};
pub use content::{ContentClient, Illustration, LessonContent, SupplementaryLink};
pub use curriculum::{
    curriculum, first_lesson, lesson, lessons_in, LessonTopic, ModuleLevel, RESEARCH_TIP,
};
pub use driver::FetchDriver;
pub use error::{PsychoError, Result};
pub use events::{EventBroadcaster, SessionEvent};
pub use glossary::{glossary, search_glossary, ExcelFunction, FunctionCategory};
pub use platform::Platform;
pub use progress::{FileBackend, KeyValueBackend, LessonStatus, MemoryBackend, ProgressStore};
pub use session::{FetchOutcome, FetchRequest, FetchTicket, ImageState, LessonSession, LessonState};
pub use tutor::TutorChat;
pub use video::{ConceptVideo, VideoFailure, VIDEO_SUGGESTIONS};
