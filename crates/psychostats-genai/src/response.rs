//! Response shapes returned by the generation service.
//!
//! The remote API omits fields freely, so every optional piece is modeled
//! explicitly and the helper accessors return `None` or an empty slice
//! instead of failing.

use serde::{Deserialize, Serialize};

// ============================================================================
// Content Generation
// ============================================================================

/// Result of a `generateContent` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Generated candidates; only the first one is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Web citations, present only for grounded requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// The parts of a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Role that produced the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single content part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// Inline binary data such as a generated image.
    InlineData {
        /// The encoded payload.
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    /// Any part kind this client does not use.
    Other(serde_json::Value),
}

/// Base64-encoded inline data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

/// Grounding citations attached to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Retrieved sources.
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// One retrieved source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// Web page source, absent for other source kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

/// A cited web page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    /// Page address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GenerateResponse {
    /// Builds a single-candidate text response.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::Text { text: text.into() }],
                }),
                grounding_metadata: None,
            }],
        }
    }

    /// Builds a single-candidate response carrying one inline image.
    #[must_use]
    pub fn from_inline_image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::InlineData {
                        inline_data: Blob {
                            mime_type: mime_type.into(),
                            data: data.into(),
                        },
                    }],
                }),
                grounding_metadata: None,
            }],
        }
    }

    /// Attaches web citations to the first candidate.
    #[must_use]
    pub fn with_web_sources<I, U, T>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = (U, T)>,
        U: Into<String>,
        T: Into<String>,
    {
        let chunks = sources
            .into_iter()
            .map(|(uri, title)| GroundingChunk {
                web: Some(WebSource {
                    uri: Some(uri.into()),
                    title: Some(title.into()),
                }),
            })
            .collect();
        if let Some(first) = self.candidates.first_mut() {
            first.grounding_metadata = Some(GroundingMetadata {
                grounding_chunks: chunks,
            });
        }
        self
    }

    fn parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate, `None` when there is none.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Grounding citations of the first candidate.
    #[must_use]
    pub fn grounding_chunks(&self) -> &[GroundingChunk] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
            .map(|metadata| metadata.grounding_chunks.as_slice())
            .unwrap_or_default()
    }

    /// First inline data part of the first candidate.
    #[must_use]
    pub fn first_inline_data(&self) -> Option<&Blob> {
        self.parts().iter().find_map(|part| match part {
            Part::InlineData { inline_data } => Some(inline_data),
            _ => None,
        })
    }
}

// ============================================================================
// Long-Running Video Operations
// ============================================================================

/// Handle of a long-running video generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOperation {
    /// Operation resource name, used for polling.
    pub name: String,
    /// Whether the operation has finished.
    #[serde(default)]
    pub done: bool,
    /// Failure reported by the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
    /// Result, present once `done` is set and no error occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<OperationResponse>,
}

/// Error status of a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// Numeric status code.
    #[serde(default)]
    pub code: i32,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Payload of a finished video operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// Generated videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_video_response: Option<GeneratedVideos>,
}

/// List of generated videos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideos {
    /// Generated samples.
    #[serde(default, alias = "generatedVideos")]
    pub generated_samples: Vec<GeneratedVideo>,
}

/// A single generated video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    /// Downloadable file reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoFile>,
}

/// Location of a generated video file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    /// Download URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl VideoOperation {
    /// Creates a pending operation handle.
    #[must_use]
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a finished operation carrying one video.
    #[must_use]
    pub fn finished(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            error: None,
            response: Some(OperationResponse {
                generate_video_response: Some(GeneratedVideos {
                    generated_samples: vec![GeneratedVideo {
                        video: Some(VideoFile {
                            uri: Some(uri.into()),
                        }),
                    }],
                }),
            }),
        }
    }

    /// Creates a finished operation that failed.
    #[must_use]
    pub fn failed(name: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            error: Some(OperationError {
                code,
                message: message.into(),
            }),
            response: None,
        }
    }

    /// Download URI of the first generated video.
    #[must_use]
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
    }
}
