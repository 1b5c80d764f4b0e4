//! PsychoStats Generation Service
//!
//! Boundary to the external generative AI service that writes lessons,
//! draws concept illustrations, renders concept videos and answers tutor
//! questions.
//!
//! [`GenerationService`] is the seam the rest of the workspace depends on.
//! [`GeminiClient`] implements it over the Gemini REST API and
//! [`mock::MockService`] replays scripted responses for tests.

pub mod error;
pub mod gemini;
pub mod mock;
pub mod request;
pub mod response;

use async_trait::async_trait;

pub use error::{ErrorKind, GenerationError, Result};
pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_BASE_URL};
pub use request::{ChatTurn, Role, TextRequest, VideoRequest};
pub use response::{
    Blob, Candidate, Content, GenerateResponse, GroundingChunk, GroundingMetadata, Part,
    VideoOperation, WebSource,
};

/// Operations consumed from the generation service.
///
/// Implementations report a missing credential as
/// [`GenerationError::MissingCredential`] without making any request.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generates text, optionally grounded with web search citations.
    async fn generate_text(&self, request: &TextRequest) -> Result<GenerateResponse>;

    /// Generates an image; the result carries it as an inline data part.
    async fn generate_image(&self, prompt: &str) -> Result<GenerateResponse>;

    /// Starts a long-running video generation.
    async fn start_video(&self, request: &VideoRequest) -> Result<VideoOperation>;

    /// Fetches the current state of a video operation.
    async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation>;

    /// Downloads a generated video file.
    async fn download_video(&self, uri: &str) -> Result<Vec<u8>>;
}
