//! Concept video generation.
//!
//! Video generation is a long-running operation: it is started, then polled
//! at a fixed interval until done. Polling stops after a bounded number of
//! attempts.

use std::sync::Arc;
use std::time::Duration;

use psychostats_genai::{ErrorKind, GenerationError, GenerationService, VideoOperation, VideoRequest};
use tracing::{debug, info, warn};

use crate::config::VideoConfig;
use crate::prompt::video_prompt;

/// Example concepts offered to the student.
pub const VIDEO_SUGGESTIONS: [&str; 3] = [
    "Correlación positiva entre estudio y notas",
    "Distribución normal (Campana de Gauss)",
    "Diagrama de dispersión de ansiedad vs edad",
];

/// Displayable reason a video could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VideoFailure {
    /// The video model is not enabled for this key's project.
    #[error("El modelo de video no está disponible en este momento. Puede que no esté habilitado en el proyecto seleccionado.")]
    ModelUnavailable,

    /// The key may not generate videos.
    #[error("No tienes permisos para generar videos. Por favor verifica tu clave de acceso.")]
    NoPermission,

    /// Polling ran out before the video finished.
    #[error("El video está tardando demasiado en generarse. Intenta de nuevo más tarde.")]
    TimedOut,

    /// Any other failure.
    #[error("No se pudo generar el video. Intenta con otro concepto o más tarde.")]
    Failed,
}

impl VideoFailure {
    /// Classifies an error detail by the substrings the service uses.
    #[must_use]
    pub fn classify(detail: &str) -> Self {
        if detail.contains("Requested entity was not found") || detail.contains("404") {
            Self::ModelUnavailable
        } else if detail.contains("Permission") || detail.contains("403") {
            Self::NoPermission
        } else {
            Self::Failed
        }
    }

    /// Classifies a service error.
    ///
    /// The error kind decides first. Only API messages are searched for
    /// substrings; transport errors carry request URLs and are never matched.
    #[must_use]
    pub fn from_error(err: &GenerationError) -> Self {
        match err {
            GenerationError::Network(_) | GenerationError::MalformedResponse(_) => Self::Failed,
            GenerationError::MissingCredential { .. } | GenerationError::Api { .. } => {
                match err.kind() {
                    ErrorKind::NotFound => Self::ModelUnavailable,
                    ErrorKind::PermissionDenied
                    | ErrorKind::InvalidCredential
                    | ErrorKind::MissingCredential => Self::NoPermission,
                    ErrorKind::Transient | ErrorKind::Unknown => Self::classify(&err.detail()),
                }
            }
        }
    }

    /// Classifies the error status of a finished operation.
    ///
    /// Codes are gRPC (`5` not found, `7` permission denied) or HTTP.
    #[must_use]
    pub fn from_operation_error(code: i32, message: &str) -> Self {
        match code {
            5 | 404 => Self::ModelUnavailable,
            7 | 403 => Self::NoPermission,
            _ => Self::classify(message),
        }
    }
}

/// Generates short concept videos.
pub struct ConceptVideo {
    service: Arc<dyn GenerationService>,
    poll_interval: Duration,
    max_polls: u32,
}

impl std::fmt::Debug for ConceptVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConceptVideo")
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .finish_non_exhaustive()
    }
}

impl ConceptVideo {
    /// Creates a generator using the configured polling policy.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>, config: &VideoConfig) -> Self {
        Self::with_policy(service, config.poll_interval(), config.max_polls)
    }

    /// Creates a generator with an explicit polling policy.
    #[must_use]
    pub fn with_policy(
        service: Arc<dyn GenerationService>,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        Self {
            service,
            poll_interval,
            max_polls,
        }
    }

    /// Generates a video for `concept` and returns its download URI.
    pub async fn generate(&self, concept: &str) -> Result<String, VideoFailure> {
        let request = VideoRequest::new(video_prompt(concept));
        info!(concept, "Starting video generation");

        let mut operation = self
            .service
            .start_video(&request)
            .await
            .map_err(|err| failure("start", &err))?;

        let mut polls = 0;
        while !operation.done {
            if polls >= self.max_polls {
                warn!(concept, polls, "Video generation did not finish in time");
                return Err(VideoFailure::TimedOut);
            }
            tokio::time::sleep(self.poll_interval).await;
            operation = self
                .service
                .poll_video(&operation)
                .await
                .map_err(|err| failure("poll", &err))?;
            polls += 1;
            debug!(name = %operation.name, polls, done = operation.done, "Polled video operation");
        }

        finished_uri(&operation)
    }

    /// Downloads a generated video.
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>, VideoFailure> {
        self.service
            .download_video(uri)
            .await
            .map_err(|err| failure("download", &err))
    }
}

fn failure(stage: &str, err: &GenerationError) -> VideoFailure {
    warn!(stage, kind = %err.kind(), error = %err.detail(), "Video generation failed");
    VideoFailure::from_error(err)
}

fn finished_uri(operation: &VideoOperation) -> Result<String, VideoFailure> {
    if let Some(error) = &operation.error {
        warn!(name = %operation.name, code = error.code, error = %error.message, "Video operation failed");
        return Err(VideoFailure::from_operation_error(error.code, &error.message));
    }
    operation.video_uri().map(str::to_string).ok_or_else(|| {
        warn!(name = %operation.name, "Finished video operation has no video");
        VideoFailure::Failed
    })
}
