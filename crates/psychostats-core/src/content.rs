//! Lesson content and illustration retrieval.
//!
//! [`ContentClient::fetch_lesson_content`] never fails. A grounded request
//! is tried first; credential and permission problems end immediately with
//! a fixed diagnostic, anything else gets one retry without web search. If
//! that also fails the lesson body becomes an apology listing likely causes.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use psychostats_genai::{ErrorKind, GenerateResponse, GenerationService, TextRequest};
use psychostats_markup::RenderBlock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::curriculum::LessonTopic;
use crate::platform::Platform;
use crate::prompt::{illustration_prompt, lesson_prompt, LESSON_SYSTEM_INSTRUCTION};

/// Shown when the service answers without text.
pub const EMPTY_CONTENT_PLACEHOLDER: &str = "No se pudo generar el contenido.";

/// Title used for links the service returned without one.
pub const DEFAULT_LINK_TITLE: &str = "Recurso Relacionado";

/// Shown when no API key is configured.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "### Falta la clave de acceso

No se encontró una clave de API configurada, así que no podemos generar esta lección.

Define la variable de entorno con tu clave de Gemini (por defecto `API_KEY`) y vuelve a abrir la lección.";

/// Shown when the service rejects the key or the request.
pub const INVALID_CREDENTIAL_MESSAGE: &str = "### Clave de acceso no válida

El servicio rechazó la clave de API o la solicitud. Revisa que la clave esté copiada completa, que siga activa y vuelve a intentarlo.";

/// Shown when the key lacks access to the model.
pub const PERMISSION_DENIED_MESSAGE: &str = "### Sin permisos suficientes

Tu clave de API no tiene permiso para usar el modelo de generación. Verifica que la API esté habilitada en tu proyecto.";

/// Lesson body used when both attempts failed.
#[must_use]
pub fn generation_failed_message(detail: &str) -> String {
    format!(
        "### Lo sentimos

Hubo un problema técnico generando esta lección. Las causas más comunes son:

- No hay una clave de API configurada.
- La clave de API no es válida.
- Falló la conexión de red.

Por favor intenta de nuevo o selecciona otra lección del menú.

Error: {detail}"
    )
}

/// Fixed diagnostic for failures that a retry cannot fix.
const fn final_diagnostic(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::MissingCredential => Some(MISSING_CREDENTIAL_MESSAGE),
        ErrorKind::InvalidCredential => Some(INVALID_CREDENTIAL_MESSAGE),
        ErrorKind::PermissionDenied => Some(PERMISSION_DENIED_MESSAGE),
        ErrorKind::NotFound | ErrorKind::Transient | ErrorKind::Unknown => None,
    }
}

// ============================================================================
// Content types
// ============================================================================

/// A video or tutorial the service cited while writing the lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplementaryLink {
    /// Display title.
    pub title: String,
    /// Target address.
    pub uri: String,
}

/// Generated lesson body with its supplementary links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonContent {
    /// Lesson markup, or an in-band diagnostic.
    pub text: String,
    /// Video-like links, at most the configured maximum.
    pub links: Vec<SupplementaryLink>,
}

impl LessonContent {
    /// Content consisting only of a message.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            links: Vec::new(),
        }
    }

    /// Interprets the text into render blocks.
    #[must_use]
    pub fn blocks(&self) -> Vec<RenderBlock> {
        psychostats_markup::render(&self.text)
    }
}

/// A generated raster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Illustration {
    /// Image MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 image bytes.
    pub data_base64: String,
}

impl Illustration {
    /// Decoded image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data_base64.trim())
    }

    /// File extension matching the MIME type.
    #[must_use]
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

// ============================================================================
// ContentClient
// ============================================================================

/// Fetches lesson text and illustrations from a [`GenerationService`].
#[derive(Clone)]
pub struct ContentClient {
    service: Arc<dyn GenerationService>,
    max_links: usize,
}

impl std::fmt::Debug for ContentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentClient")
            .field("max_links", &self.max_links)
            .finish_non_exhaustive()
    }
}

impl ContentClient {
    /// Creates a client keeping at most `max_links` links per lesson.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>, max_links: usize) -> Self {
        Self { service, max_links }
    }

    /// Generates a lesson. Failures are returned as displayable text.
    pub async fn fetch_lesson_content(
        &self,
        topic: &LessonTopic,
        reinforcement: bool,
        platform: Platform,
    ) -> LessonContent {
        let request = TextRequest::prompt(lesson_prompt(topic, reinforcement, platform))
            .with_system_instruction(LESSON_SYSTEM_INSTRUCTION);

        info!(lesson = topic.id, reinforcement, %platform, "Requesting lesson content");

        let grounded = request.clone().with_grounding(true);
        match self.service.generate_text(&grounded).await {
            Ok(response) => return self.content_from(&response),
            Err(err) => {
                if let Some(message) = final_diagnostic(err.kind()) {
                    warn!(lesson = topic.id, kind = %err.kind(), "Lesson generation cannot be retried");
                    return LessonContent::message(message);
                }
                warn!(lesson = topic.id, error = %err.detail(), "Grounded generation failed, retrying without search");
            }
        }

        match self.service.generate_text(&request).await {
            Ok(response) => LessonContent::message(text_or_placeholder(&response)),
            Err(err) => {
                warn!(lesson = topic.id, error = %err.detail(), "Fallback generation failed");
                LessonContent::message(generation_failed_message(&err.detail()))
            }
        }
    }

    /// Generates the decorative illustration for a concept.
    ///
    /// Returns `None` on any failure.
    pub async fn fetch_concept_illustration(&self, concept: &str) -> Option<Illustration> {
        let response = match self.service.generate_image(&illustration_prompt(concept)).await {
            Ok(response) => response,
            Err(err) => {
                warn!(concept, error = %err.detail(), "Illustration generation failed");
                return None;
            }
        };

        let Some(blob) = response.first_inline_data() else {
            warn!(concept, "Illustration response carried no image");
            return None;
        };

        let illustration = Illustration {
            mime_type: blob.mime_type.clone(),
            data_base64: blob.data.clone(),
        };
        if let Err(e) = illustration.decode() {
            warn!(concept, error = %e, "Illustration data is not valid base64");
            return None;
        }
        debug!(concept, mime = %illustration.mime_type, "Illustration ready");
        Some(illustration)
    }

    fn content_from(&self, response: &GenerateResponse) -> LessonContent {
        let links: Vec<SupplementaryLink> = response
            .grounding_chunks()
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.as_deref()?;
                (uri.contains("youtube") || uri.contains("video")).then(|| SupplementaryLink {
                    title: web
                        .title
                        .clone()
                        .filter(|title| !title.is_empty())
                        .unwrap_or_else(|| DEFAULT_LINK_TITLE.to_string()),
                    uri: uri.to_string(),
                })
            })
            .take(self.max_links)
            .collect();

        debug!(links = links.len(), "Lesson content received");
        LessonContent {
            text: text_or_placeholder(response),
            links,
        }
    }
}

fn text_or_placeholder(response: &GenerateResponse) -> String {
    response
        .text()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| EMPTY_CONTENT_PLACEHOLDER.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use psychostats_genai::mock::{MockService, RecordedCall};
    use psychostats_genai::GenerationError;

    use super::*;
    use crate::curriculum::lesson;

    fn client(mock: &Arc<MockService>) -> ContentClient {
        ContentClient::new(Arc::clone(mock) as Arc<dyn GenerationService>, 3)
    }

    async fn fetch(mock: &Arc<MockService>) -> LessonContent {
        client(mock)
            .fetch_lesson_content(lesson("4.1").unwrap(), false, Platform::Windows)
            .await
    }

    #[tokio::test]
    async fn test_grounded_success_keeps_video_links() {
        let response = GenerateResponse::from_text("## Concepto\nTexto").with_web_sources([
            ("https://www.youtube.com/watch?v=1", "Tutorial 1"),
            ("https://example.org/articulo", "Artículo"),
            ("https://videos.example.com/2", ""),
            ("https://youtube.com/3", "Tutorial 3"),
            ("https://youtube.com/4", "Tutorial 4"),
        ]);
        let mock = Arc::new(MockService::new().with_text(Ok(response)));

        let content = fetch(&mock).await;

        assert_eq!(content.text, "## Concepto\nTexto");
        assert_eq!(
            content.links,
            vec![
                SupplementaryLink {
                    title: "Tutorial 1".to_string(),
                    uri: "https://www.youtube.com/watch?v=1".to_string(),
                },
                SupplementaryLink {
                    title: DEFAULT_LINK_TITLE.to_string(),
                    uri: "https://videos.example.com/2".to_string(),
                },
                SupplementaryLink {
                    title: "Tutorial 3".to_string(),
                    uri: "https://youtube.com/3".to_string(),
                },
            ]
        );
        assert_eq!(mock.text_call_count(), 1);
        assert!(matches!(
            mock.calls()[0],
            RecordedCall::Text { grounding: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_text_uses_placeholder() {
        let mock = Arc::new(MockService::new().with_text(Ok(GenerateResponse::default())));
        let content = fetch(&mock).await;
        assert_eq!(content.text, EMPTY_CONTENT_PLACEHOLDER);
        assert!(content.links.is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_is_not_retried() {
        let mock = Arc::new(
            MockService::new().with_text(Err(GenerationError::missing_credential("API_KEY"))),
        );
        let content = fetch(&mock).await;
        assert_eq!(content.text, MISSING_CREDENTIAL_MESSAGE);
        assert_eq!(mock.text_call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_credential_is_not_retried() {
        let mock = Arc::new(MockService::new().with_text(Err(GenerationError::api(
            ErrorKind::InvalidCredential,
            400,
            "API key not valid. Please pass a valid API key.",
        ))));
        let content = fetch(&mock).await;
        assert_eq!(content.text, INVALID_CREDENTIAL_MESSAGE);
        assert_eq!(mock.text_call_count(), 1);
    }

    #[tokio::test]
    async fn test_permission_denied_is_not_retried() {
        let mock = Arc::new(MockService::new().with_text(Err(GenerationError::api(
            ErrorKind::PermissionDenied,
            403,
            "Permission denied",
        ))));
        let content = fetch(&mock).await;
        assert_eq!(content.text, PERMISSION_DENIED_MESSAGE);
        assert_eq!(mock.text_call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_falls_back_once() {
        let mock = Arc::new(
            MockService::new()
                .with_text(Err(GenerationError::Network("connection reset".to_string())))
                .with_text(Ok(GenerateResponse::from_text("Lección sin enlaces"))),
        );
        let content = fetch(&mock).await;

        assert_eq!(content.text, "Lección sin enlaces");
        assert!(content.links.is_empty());
        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[1], RecordedCall::Text { grounding: false, .. }));
    }

    #[tokio::test]
    async fn test_both_attempts_failing_embeds_detail() {
        let mock = Arc::new(
            MockService::new()
                .with_text(Err(GenerationError::api(ErrorKind::Transient, 503, "overloaded")))
                .with_text(Err(GenerationError::Network("dns error".to_string()))),
        );
        let content = fetch(&mock).await;

        assert!(content.text.starts_with("### Lo sentimos"));
        assert!(content.text.ends_with("Error: dns error"));
        assert_eq!(mock.text_call_count(), 2);
    }

    #[tokio::test]
    async fn test_illustration_success() {
        let mock = Arc::new(
            MockService::new().with_image(Ok(GenerateResponse::from_inline_image(
                "image/png",
                "iVBORw0KGgo=",
            ))),
        );
        let illustration = client(&mock)
            .fetch_concept_illustration("Histogramas")
            .await
            .unwrap();

        assert_eq!(illustration.data_base64, "iVBORw0KGgo=");
        assert_eq!(illustration.decode().unwrap()[..4], [0x89, b'P', b'N', b'G']);
        assert_eq!(illustration.extension(), "png");
        assert!(matches!(
            &mock.calls()[0],
            RecordedCall::Image { prompt } if prompt.contains("Histogramas")
        ));
    }

    #[tokio::test]
    async fn test_illustration_failures_return_none() {
        let mock = Arc::new(
            MockService::new()
                .with_image(Err(GenerationError::Network("offline".to_string())))
                .with_image(Ok(GenerateResponse::from_text("sin imagen")))
                .with_image(Ok(GenerateResponse::from_inline_image("image/png", "%%%"))),
        );
        let client = client(&mock);
        for _ in 0..3 {
            assert!(client.fetch_concept_illustration("Media").await.is_none());
        }
    }

    #[test]
    fn test_content_blocks() {
        let content = LessonContent::message("## Título\n- punto");
        let kinds: Vec<&str> = content.blocks().iter().map(RenderBlock::kind).collect();
        assert_eq!(kinds, vec!["heading", "bullet_item"]);
    }
}
