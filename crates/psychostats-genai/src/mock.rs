//! Scripted generation service for tests.
//!
//! Responses are queued per operation and handed out in order. Every call is
//! recorded so tests can assert on how many requests were made and with which
//! strategy, without network access or credentials.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::{GenerationError, Result};
use crate::request::{TextRequest, VideoRequest};
use crate::response::{GenerateResponse, VideoOperation};
use crate::GenerationService;

/// A call received by [`MockService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// A text generation call.
    Text {
        /// Whether grounding was requested.
        grounding: bool,
        /// Text of the last user turn.
        prompt: String,
        /// Number of turns sent.
        turns: usize,
    },
    /// An image generation call.
    Image {
        /// The prompt.
        prompt: String,
    },
    /// A video generation start.
    StartVideo {
        /// The prompt.
        prompt: String,
    },
    /// A poll of a video operation.
    PollVideo {
        /// Operation name.
        name: String,
    },
    /// A video download.
    DownloadVideo {
        /// Download URI.
        uri: String,
    },
}

type Scripted<T> = Mutex<VecDeque<(Duration, Result<T>)>>;

/// Generation service that replays queued responses.
///
/// An operation whose queue is empty fails with a malformed-response error.
#[derive(Debug, Default)]
pub struct MockService {
    text: Scripted<GenerateResponse>,
    image: Scripted<GenerateResponse>,
    video: Scripted<VideoOperation>,
    download: Scripted<Vec<u8>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

fn pop<T>(queue: &Scripted<T>, operation: &str) -> (Duration, Result<T>) {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
        .unwrap_or_else(|| {
            (
                Duration::ZERO,
                Err(GenerationError::MalformedResponse(format!(
                    "no scripted {operation} response left"
                ))),
            )
        })
}

fn push<T>(queue: &Scripted<T>, delay: Duration, result: Result<T>) {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push_back((delay, result));
}

impl MockService {
    /// Creates a mock with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a text generation result.
    #[must_use]
    pub fn with_text(self, result: Result<GenerateResponse>) -> Self {
        push(&self.text, Duration::ZERO, result);
        self
    }

    /// Queues a text generation result that resolves after `delay`.
    #[must_use]
    pub fn with_delayed_text(self, delay: Duration, result: Result<GenerateResponse>) -> Self {
        push(&self.text, delay, result);
        self
    }

    /// Queues an image generation result.
    #[must_use]
    pub fn with_image(self, result: Result<GenerateResponse>) -> Self {
        push(&self.image, Duration::ZERO, result);
        self
    }

    /// Queues an image generation result that resolves after `delay`.
    #[must_use]
    pub fn with_delayed_image(self, delay: Duration, result: Result<GenerateResponse>) -> Self {
        push(&self.image, delay, result);
        self
    }

    /// Queues a video operation, consumed by `start_video` and then by each
    /// `poll_video` in order.
    #[must_use]
    pub fn with_video(self, result: Result<VideoOperation>) -> Self {
        push(&self.video, Duration::ZERO, result);
        self
    }

    /// Queues a video download result.
    #[must_use]
    pub fn with_download(self, result: Result<Vec<u8>>) -> Self {
        push(&self.download, Duration::ZERO, result);
        self
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of text generation calls received so far.
    #[must_use]
    pub fn text_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RecordedCall::Text { .. }))
            .count()
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    async fn replay<T>(queue: &Scripted<T>, operation: &str) -> Result<T> {
        let (delay, result) = pop(queue, operation);
        if !delay.is_zero() {
            sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl GenerationService for MockService {
    async fn generate_text(&self, request: &TextRequest) -> Result<GenerateResponse> {
        self.record(RecordedCall::Text {
            grounding: request.grounding,
            prompt: request.last_user_text().unwrap_or_default().to_string(),
            turns: request.contents.len(),
        });
        Self::replay(&self.text, "text").await
    }

    async fn generate_image(&self, prompt: &str) -> Result<GenerateResponse> {
        self.record(RecordedCall::Image {
            prompt: prompt.to_string(),
        });
        Self::replay(&self.image, "image").await
    }

    async fn start_video(&self, request: &VideoRequest) -> Result<VideoOperation> {
        self.record(RecordedCall::StartVideo {
            prompt: request.prompt.clone(),
        });
        Self::replay(&self.video, "video").await
    }

    async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        self.record(RecordedCall::PollVideo {
            name: operation.name.clone(),
        });
        Self::replay(&self.video, "video").await
    }

    async fn download_video(&self, uri: &str) -> Result<Vec<u8>> {
        self.record(RecordedCall::DownloadVideo {
            uri: uri.to_string(),
        });
        Self::replay(&self.download, "download").await
    }
}
