//! Integration tests for the Gemini HTTP client.
//!
//! A local axum server stands in for the generation API and records every
//! request, so these tests check the wire format and the error handling of
//! the content, tutor and video flows without network access.

use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use psychostats_core::content::{MISSING_CREDENTIAL_MESSAGE, PERMISSION_DENIED_MESSAGE};
use psychostats_core::{lesson, ConceptVideo, ContentClient, Platform, TutorChat};
use psychostats_genai::{
    ErrorKind, GeminiClient, GeminiConfig, GenerationService, TextRequest,
};
use serde_json::{json, Value};

// ============================================================================
// Mock API server
// ============================================================================

/// A request received by the mock API.
#[derive(Debug, Clone)]
struct Captured {
    path: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Default)]
struct MockApi {
    requests: Mutex<Vec<Captured>>,
    replies: Mutex<VecDeque<(StatusCode, Value)>>,
}

impl MockApi {
    fn reply(&self, status: StatusCode, body: Value) {
        self.replies.lock().unwrap().push_back((status, body));
    }

    fn record(&self, path: String, headers: &HeaderMap, body: Value) -> (StatusCode, Json<Value>) {
        let api_key = headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Captured {
            path,
            api_key,
            body,
        });

        let (status, body) = self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": { "message": "no reply queued", "status": "INTERNAL" } }),
            )
        });
        (status, Json(body))
    }

    fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }
}

async fn model_call(
    State(api): State<Arc<MockApi>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    api.record(format!("/v1beta/models/{call}"), &headers, body)
}

async fn operation(
    State(api): State<Arc<MockApi>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    api.record(format!("/v1beta/operations/{id}"), &headers, Value::Null)
}

async fn file(
    State(api): State<Arc<MockApi>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Vec<u8> {
    let _ = api.record(format!("/files/{name}"), &headers, Value::Null);
    b"fake-mp4-bytes".to_vec()
}

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Spawns the mock API and returns its base URL.
async fn spawn_mock_api(api: Arc<MockApi>) -> String {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = Router::new()
        .route("/v1beta/models/:call", post(model_call))
        .route("/v1beta/operations/:id", get(operation))
        .route("/files/:name", get(file))
        .with_state(api);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://{addr}")
}

async fn client_with_key(api: &Arc<MockApi>) -> (String, Arc<dyn GenerationService>) {
    let base_url = spawn_mock_api(Arc::clone(api)).await;
    let config = GeminiConfig::default()
        .with_base_url(&base_url)
        .with_api_key("test-key");
    (base_url, Arc::new(GeminiClient::new(config)))
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

// ============================================================================
// Lesson content
// ============================================================================

/// Tests that a grounded lesson request carries the key, the search tool and
/// the system instruction, and that only video links are kept.
#[tokio::test]
async fn test_grounded_lesson_request_wire_format() {
    let api = Arc::new(MockApi::default());
    api.reply(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "## Tablas dinámicas\n\nTexto." }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://www.youtube.com/watch?v=abc", "title": "Tutorial" } },
                        { "web": { "uri": "https://example.com/articulo", "title": "Artículo" } }
                    ]
                }
            }]
        }),
    );
    let (_, service) = client_with_key(&api).await;
    let client = ContentClient::new(service, 3);

    let content = client
        .fetch_lesson_content(lesson("4.1").unwrap(), false, Platform::Mac)
        .await;

    assert!(content.text.starts_with("## Tablas dinámicas"));
    assert_eq!(content.links.len(), 1);
    assert_eq!(content.links[0].title, "Tutorial");

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/v1beta/models/gemini-2.5-flash:generateContent");
    assert_eq!(request.api_key.as_deref(), Some("test-key"));
    assert_eq!(request.body["tools"], json!([{ "googleSearch": {} }]));
    assert!(request.body["systemInstruction"]["parts"][0]["text"].is_string());

    let prompt = request.body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(prompt.contains("Mac"));
    assert_eq!(request.body["contents"][0]["role"], "user");
}

/// Tests that a permission error is reported once, without a fallback.
#[tokio::test]
async fn test_permission_denied_is_not_retried() {
    let api = Arc::new(MockApi::default());
    api.reply(
        StatusCode::FORBIDDEN,
        json!({
            "error": {
                "code": 403,
                "message": "The caller does not have access to this model",
                "status": "PERMISSION_DENIED"
            }
        }),
    );
    let (_, service) = client_with_key(&api).await;
    let client = ContentClient::new(service, 3);

    let content = client
        .fetch_lesson_content(lesson("1.1").unwrap(), false, Platform::Windows)
        .await;

    assert_eq!(content.text, PERMISSION_DENIED_MESSAGE);
    assert!(content.links.is_empty());
    assert_eq!(api.requests().len(), 1);
}

/// Tests that a transient failure falls back to one ungrounded request.
#[tokio::test]
async fn test_transient_failure_falls_back_without_search() {
    let api = Arc::new(MockApi::default());
    api.reply(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": { "code": 503, "message": "The model is overloaded", "status": "UNAVAILABLE" } }),
    );
    api.reply(StatusCode::OK, text_reply("## Promedios sin búsqueda"));
    let (_, service) = client_with_key(&api).await;
    let client = ContentClient::new(service, 3);

    let content = client
        .fetch_lesson_content(lesson("3.1").unwrap(), true, Platform::Web)
        .await;

    assert_eq!(content.text, "## Promedios sin búsqueda");
    assert!(content.links.is_empty());

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].body.get("tools").is_some());
    assert!(requests[1].body.get("tools").is_none());
    assert_eq!(
        requests[0].body["contents"], requests[1].body["contents"],
        "fallback must resend the same prompt"
    );
}

/// Tests that two failures produce the apology with the last error detail.
#[tokio::test]
async fn test_both_attempts_failing_reports_detail() {
    let api = Arc::new(MockApi::default());
    api.reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "first failure", "status": "INTERNAL" } }),
    );
    api.reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "second failure", "status": "INTERNAL" } }),
    );
    let (_, service) = client_with_key(&api).await;
    let client = ContentClient::new(service, 3);

    let content = client
        .fetch_lesson_content(lesson("2.1").unwrap(), false, Platform::Tablet)
        .await;

    assert!(content.text.starts_with("### Lo sentimos"));
    assert!(content.text.contains("second failure"));
    assert_eq!(api.requests().len(), 2);
}

/// Tests that a missing key fails without contacting the API.
#[tokio::test]
async fn test_missing_key_sends_no_requests() {
    let api = Arc::new(MockApi::default());
    let base_url = spawn_mock_api(Arc::clone(&api)).await;
    let gemini = GeminiClient::new(GeminiConfig::default().with_base_url(&base_url));

    let err = gemini
        .generate_text(&TextRequest::prompt("hola"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingCredential);

    let client = ContentClient::new(Arc::new(gemini), 3);
    let content = client
        .fetch_lesson_content(lesson("1.1").unwrap(), false, Platform::Windows)
        .await;
    assert_eq!(content.text, MISSING_CREDENTIAL_MESSAGE);

    assert!(api.requests().is_empty());
}

// ============================================================================
// Illustrations, tutor and video
// ============================================================================

/// Tests that inline image data becomes an illustration.
#[tokio::test]
async fn test_illustration_from_inline_data() {
    let api = Arc::new(MockApi::default());
    api.reply(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }] }
            }]
        }),
    );
    let (_, service) = client_with_key(&api).await;
    let client = ContentClient::new(service, 3);

    let illustration = client
        .fetch_concept_illustration("Tablas Dinámicas")
        .await
        .expect("illustration");

    assert_eq!(illustration.mime_type, "image/png");
    assert_eq!(illustration.decode().unwrap(), b"hello");
    assert_eq!(
        api.requests()[0].path,
        "/v1beta/models/gemini-2.5-flash-image:generateContent"
    );
}

/// Tests that an image response without image data yields no illustration.
#[tokio::test]
async fn test_illustration_absent_when_only_text_returned() {
    let api = Arc::new(MockApi::default());
    api.reply(StatusCode::OK, text_reply("no puedo dibujar"));
    let (_, service) = client_with_key(&api).await;
    let client = ContentClient::new(service, 3);

    assert!(client.fetch_concept_illustration("Filtros").await.is_none());
}

/// Tests that the tutor sends the conversation without the greeting turn.
#[tokio::test]
async fn test_tutor_conversation_on_the_wire() {
    let api = Arc::new(MockApi::default());
    api.reply(StatusCode::OK, text_reply("Usa PROMEDIO."));
    api.reply(StatusCode::OK, text_reply("Y DESVEST.P para la dispersión."));
    let (_, service) = client_with_key(&api).await;
    let mut chat = TutorChat::new(service);

    assert_eq!(chat.ask("¿Cómo calculo la media?").await.as_deref(), Some("Usa PROMEDIO."));
    assert!(chat.ask("¿Y la dispersión?").await.is_some());

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    let contents = requests[1].body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"][0]["text"], "¿Y la dispersión?");
    assert!(requests[1].body.get("tools").is_none());
    assert_eq!(chat.history().len(), 5);
}

/// Tests the full video flow: start, poll until done, then download.
#[tokio::test]
async fn test_video_generation_polls_until_done() {
    let api = Arc::new(MockApi::default());
    let (base_url, service) = client_with_key(&api).await;
    let video_uri = format!("{base_url}/files/clip.mp4");

    api.reply(StatusCode::OK, json!({ "name": "operations/op-1" }));
    api.reply(StatusCode::OK, json!({ "name": "operations/op-1", "done": false }));
    api.reply(
        StatusCode::OK,
        json!({
            "name": "operations/op-1",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": video_uri } }]
                }
            }
        }),
    );

    let generator = ConceptVideo::with_policy(service, Duration::from_millis(10), 5);
    let uri = generator.generate("Distribución normal").await.unwrap();
    assert_eq!(uri, video_uri);

    let bytes = generator.download(&uri).await.unwrap();
    assert_eq!(bytes, b"fake-mp4-bytes");

    let requests = api.requests();
    assert_eq!(
        requests[0].path,
        "/v1beta/models/veo-3.1-fast-generate-preview:predictLongRunning"
    );
    assert_eq!(requests[0].body["parameters"]["aspectRatio"], "16:9");
    assert!(requests[0].body["instances"][0]["prompt"]
        .as_str()
        .unwrap()
        .contains("Distribución normal"));
    assert!(requests.iter().any(|r| r.path == "/v1beta/operations/op-1"));
    assert_eq!(requests.last().unwrap().path, "/files/clip.mp4");
    assert!(requests
        .iter()
        .all(|r| r.api_key.as_deref() == Some("test-key")));
}

/// Tests that an unavailable video model is reported as such.
#[tokio::test]
async fn test_video_model_not_found() {
    let api = Arc::new(MockApi::default());
    api.reply(
        StatusCode::NOT_FOUND,
        json!({ "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" } }),
    );
    let (_, service) = client_with_key(&api).await;

    let generator = ConceptVideo::with_policy(service, Duration::from_millis(10), 5);
    let failure = generator.generate("Correlación").await.unwrap_err();

    assert_eq!(failure, psychostats_core::VideoFailure::ModelUnavailable);
    assert_eq!(api.requests().len(), 1);
}
