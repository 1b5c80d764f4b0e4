//! HTTP client for the Gemini REST API.
//!
//! Text and image generation go through `models/{model}:generateContent`;
//! video generation starts with `models/{model}:predictLongRunning` and is
//! polled through the returned operation name.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::error::{ErrorKind, GenerationError, Result};
use crate::request::{Role, TextRequest, VideoRequest};
use crate::response::{GenerateResponse, VideoOperation};
use crate::GenerationService;

/// Default endpoint of the Gemini API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    /// Scheme and host of the API, without the version segment.
    pub base_url: String,
    /// API key; `None` when the environment variable was not set.
    pub api_key: Option<String>,
    /// Name of the environment variable the key was read from.
    pub api_key_env: String,
    /// Model used for lesson text and tutoring.
    pub text_model: String,
    /// Model used for concept illustrations.
    pub image_model: String,
    /// Model used for concept videos.
    pub video_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: "API_KEY".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            video_model: "veo-3.1-fast-generate-preview".to_string(),
        }
    }
}

impl GeminiConfig {
    /// Reads the API key from the named environment variable.
    ///
    /// An empty value counts as unset.
    #[must_use]
    pub fn with_key_from_env(mut self, env_var: impl Into<String>) -> Self {
        let env_var = env_var.into();
        self.api_key = std::env::var(&env_var).ok().filter(|key| !key.trim().is_empty());
        self.api_key_env = env_var;
        self
    }

    /// Sets the API key directly.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Error envelope returned by the API on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// [`GenerationService`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Creates a client with a fresh connection pool.
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Returns the connection settings.
    #[must_use]
    pub const fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::missing_credential(&self.config.api_key_env))
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.base())
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        let key = self.api_key()?;
        debug!(url = %url, "POST generation request");
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, key)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let key = self.api_key()?;
        debug!(url = %url, "GET generation resource");
        let response = self.http.get(url).header(API_KEY_HEADER, key).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(GenerationError::from);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::error_from_body(status.as_u16(), &body))
    }

    fn error_from_body(status: u16, body: &str) -> GenerationError {
        let (message, api_status) = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => (parsed.error.message, parsed.error.status),
            Err(_) if body.trim().is_empty() => (format!("HTTP {status}"), None),
            Err(_) => (body.trim().to_string(), None),
        };
        let kind = ErrorKind::classify(status, api_status.as_deref(), &message);
        warn!(status, kind = %kind, message = %message, "Generation API returned an error");
        GenerationError::api(kind, status, message)
    }

    fn text_body(request: &TextRequest) -> Value {
        // The API rejects conversations that open with a model turn.
        let contents: Vec<Value> = request
            .contents
            .iter()
            .skip_while(|turn| turn.role == Role::Model)
            .map(|turn| {
                json!({
                    "role": turn.role,
                    "parts": [{ "text": turn.text }],
                })
            })
            .collect();

        let mut body = json!({ "contents": contents });
        if let Some(instruction) = &request.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        if request.grounding {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }
        body
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.config.text_model, grounding = request.grounding))]
    async fn generate_text(&self, request: &TextRequest) -> Result<GenerateResponse> {
        let url = self.model_url(&self.config.text_model, "generateContent");
        self.post_json(&url, &Self::text_body(request)).await
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.image_model))]
    async fn generate_image(&self, prompt: &str) -> Result<GenerateResponse> {
        let url = self.model_url(&self.config.image_model, "generateContent");
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        self.post_json(&url, &body).await
    }

    #[instrument(skip(self, request), fields(model = %self.config.video_model))]
    async fn start_video(&self, request: &VideoRequest) -> Result<VideoOperation> {
        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        let body = json!({
            "instances": [{ "prompt": request.prompt }],
            "parameters": {
                "aspectRatio": request.aspect_ratio,
                "resolution": request.resolution,
            },
        });
        self.post_json(&url, &body).await
    }

    #[instrument(skip(self, operation), fields(operation = %operation.name))]
    async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        let url = format!("{}/v1beta/{}", self.base(), operation.name);
        self.get_json(&url).await
    }

    #[instrument(skip(self))]
    async fn download_video(&self, uri: &str) -> Result<Vec<u8>> {
        let key = self.api_key()?;
        let response = self
            .http
            .get(uri)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error_from_body(status.as_u16(), &body));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
