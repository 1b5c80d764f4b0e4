//! End-to-end tests of the lesson flow.
//!
//! These tests drive a [`LessonSession`] through the [`FetchDriver`] with a
//! scripted generation service and file-backed progress, the way the CLI
//! does, and check what a student would see and what survives a restart.

use std::sync::Arc;
use std::time::Duration;

use psychostats_core::{
    curriculum, lesson, ContentClient, EventBroadcaster, FetchDriver, FileBackend, ImageState,
    LessonSession, LessonState, LessonStatus, Platform, ProgressStore, SessionEvent,
};
use psychostats_genai::mock::{MockService, RecordedCall};
use psychostats_genai::{GenerateResponse, GenerationError, GenerationService};
use psychostats_markup::RenderBlock;

fn driver_for(mock: &Arc<MockService>) -> FetchDriver {
    let service: Arc<dyn GenerationService> = mock.clone();
    FetchDriver::new(ContentClient::new(service, 3))
}

async fn settle(driver: &mut FetchDriver, session: &mut LessonSession) {
    while let Some(outcome) = driver.next().await {
        session.apply(outcome);
    }
}

const LESSON_TEXT: &str = "## Tablas dinámicas\n\n\
Las tablas resumen datos por grupo.\n\n\
* **Filas**: la variable de agrupación\n\
* **Valores**: la media de ansiedad\n\n\
### Práctica de laboratorio\n\n\
- [ ] Inserta una tabla dinámica desde la pestaña Insertar\n\n\
| Grupo | Media |\n\
|---|---|\n\
| Control | 12.4 |\n\
| Terapia | 8.1 |";

/// Tests the first visit: no platform, then choosing one, reading the lesson
/// and marking it completed. Progress must survive reopening the store.
#[tokio::test]
async fn test_first_visit_through_completion() {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let mock = Arc::new(
        MockService::new()
            .with_image(Ok(GenerateResponse::from_inline_image("image/png", "aGVsbG8=")))
            .with_text(Ok(GenerateResponse::from_text(LESSON_TEXT)
                .with_web_sources([("https://www.youtube.com/watch?v=x", "Tablas en 5 minutos")]))),
    );
    let mut driver = driver_for(&mock);

    let store = ProgressStore::open(FileBackend::new(state_dir.path()));
    let topic = lesson("4.1").unwrap();
    let mut session = LessonSession::new(store, topic);

    driver.dispatch(session.select_lesson(topic));
    assert_eq!(session.state(), LessonState::NoPlatformSelected);
    assert_eq!(driver.in_flight(), 1, "only the illustration is requested");
    settle(&mut driver, &mut session).await;
    assert!(matches!(session.image(), ImageState::Ready(_)));
    assert!(session.content().is_none());

    driver.dispatch(session.choose_platform(Platform::Mac));
    assert_eq!(session.state(), LessonState::Loading);
    settle(&mut driver, &mut session).await;

    assert_eq!(session.state(), LessonState::Ready);
    let blocks = session.blocks();
    assert!(blocks.iter().any(|b| matches!(b, RenderBlock::Heading { .. })));
    assert!(blocks.iter().any(|b| matches!(b, RenderBlock::Table { .. })));
    assert!(blocks.iter().any(|b| matches!(b, RenderBlock::ChecklistItem { checked: false, .. })));
    assert_eq!(session.content().unwrap().links.len(), 1);

    let requests = session.record_feedback(LessonStatus::Completed).unwrap();
    assert!(requests.is_empty());
    assert_eq!(session.state(), LessonState::Ready);

    let reopened = ProgressStore::open(FileBackend::new(state_dir.path()));
    assert_eq!(reopened.platform(), Some(Platform::Mac));
    assert_eq!(reopened.status("4.1"), Some(LessonStatus::Completed));
    assert_eq!(reopened.completed_count(), 1);

    let prompt = mock.calls().into_iter().find_map(|call| match call {
        RecordedCall::Text { prompt, grounding, .. } => Some((prompt, grounding)),
        _ => None,
    });
    let (prompt, grounding) = prompt.unwrap();
    assert!(grounding);
    assert!(prompt.contains("Mac"));
}

/// Tests that asking for reinforcement keeps the old content visible until
/// the simplified version replaces it.
#[tokio::test]
async fn test_reinforcement_replaces_content() {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let mut store = ProgressStore::open(FileBackend::new(state_dir.path()));
    store.set_platform(Platform::Windows).unwrap();

    let mock = Arc::new(
        MockService::new()
            .with_text(Ok(GenerateResponse::from_text("## Versión completa")))
            .with_image(Ok(GenerateResponse::default()))
            .with_text(Ok(GenerateResponse::from_text("## Versión sencilla"))),
    );
    let mut driver = driver_for(&mock);
    let topic = lesson("3.2").unwrap();
    let mut session = LessonSession::new(store, topic);

    driver.dispatch(session.select_lesson(topic));
    settle(&mut driver, &mut session).await;
    assert_eq!(session.image(), &ImageState::Absent);
    assert!(!session.take_scroll_to_top());

    driver.dispatch(session.record_feedback(LessonStatus::NeedsReinforcement).unwrap());
    assert_eq!(session.state(), LessonState::ReinforcementPending);
    assert_eq!(session.content().unwrap().text, "## Versión completa");

    settle(&mut driver, &mut session).await;
    assert_eq!(session.state(), LessonState::Ready);
    assert_eq!(session.content().unwrap().text, "## Versión sencilla");
    assert!(session.take_scroll_to_top());
    assert_eq!(session.status(), Some(LessonStatus::NeedsReinforcement));
}

/// Tests that switching lessons quickly never shows the older lesson.
#[tokio::test]
async fn test_rapid_lesson_switch_keeps_latest() {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let mut store = ProgressStore::open(FileBackend::new(state_dir.path()));
    store.set_platform(Platform::Web).unwrap();

    let mock = Arc::new(
        MockService::new()
            .with_delayed_text(
                Duration::from_millis(80),
                Ok(GenerateResponse::from_text("primera")),
            )
            .with_delayed_image(Duration::from_millis(80), Ok(GenerateResponse::default()))
            .with_text(Ok(GenerateResponse::from_text("segunda")))
            .with_image(Ok(GenerateResponse::default())),
    );
    let mut driver = driver_for(&mock);

    let events = EventBroadcaster::default();
    let mut rx = events.subscribe();
    let first = lesson("1.1").unwrap();
    let second = lesson("1.2").unwrap();
    let mut session = LessonSession::new(store, first).with_events(events);

    driver.dispatch(session.select_lesson(first));
    tokio::task::yield_now().await;
    driver.dispatch(session.select_lesson(second));
    settle(&mut driver, &mut session).await;

    assert_eq!(session.lesson().id, "1.2");
    assert_eq!(session.content().unwrap().text, "segunda");

    let mut stale = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, SessionEvent::StaleResultDiscarded(_)) {
            stale += 1;
        }
    }
    assert_eq!(stale, 2);
}

/// Tests that a service outage still leaves the student with a readable
/// message and a usable session.
#[tokio::test]
async fn test_outage_shows_apology() {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let mut store = ProgressStore::open(FileBackend::new(state_dir.path()));
    store.set_platform(Platform::Tablet).unwrap();

    let mock = Arc::new(
        MockService::new()
            .with_text(Err(GenerationError::Network("connection refused".to_string())))
            .with_text(Err(GenerationError::Network("connection refused".to_string())))
            .with_image(Err(GenerationError::Network("connection refused".to_string()))),
    );
    let mut driver = driver_for(&mock);
    let topic = lesson("5.1").unwrap();
    let mut session = LessonSession::new(store, topic);

    driver.dispatch(session.select_lesson(topic));
    settle(&mut driver, &mut session).await;

    assert_eq!(session.state(), LessonState::Ready);
    let text = &session.content().unwrap().text;
    assert!(text.starts_with("### Lo sentimos"));
    assert!(text.contains("connection refused"));
    assert_eq!(session.image(), &ImageState::Absent);
    assert_eq!(mock.text_call_count(), 2);

    assert!(session.record_feedback(LessonStatus::ReviewLater).is_ok());
}

/// Tests that corrupt saved progress starts fresh instead of failing.
#[test]
fn test_corrupt_progress_file_starts_fresh() {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let backend = FileBackend::new(state_dir.path());
    std::fs::write(backend.path_for("progress"), "{not json").unwrap();

    let store = ProgressStore::open(backend);
    assert!(store.progress().is_empty());
    assert_eq!(store.completed_count(), 0);
    assert_eq!(curriculum().len(), 12);
}
