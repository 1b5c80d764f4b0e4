//! Interactive lesson loop.
//!
//! The session publishes what changed on its event broadcaster; the loop
//! drains those events after every transition and redraws from them.

use std::path::{Path, PathBuf};

use psychostats_core::{
    curriculum, first_lesson, lesson, ContentClient, Config, FetchDriver, ImageState,
    LessonSession, LessonState, LessonStatus, LessonTopic, Platform, PsychoError,
    SessionEvent, RESEARCH_TIP,
};
use psychostats_markup::TerminalRenderer;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::{build_service, open_store, print_platform_options, prompt, stdin_lines};

/// Caption shown under the lesson title when no illustration is available.
const ILLUSTRATION_FALLBACK: &str = "Psicología & Datos";

/// What a line of input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StudyCommand {
    Feedback(LessonStatus),
    NextLesson,
    ChangePlatform,
    Quit,
}

impl StudyCommand {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "c" => Some(Self::Feedback(LessonStatus::Completed)),
            "2" | "r" => Some(Self::Feedback(LessonStatus::NeedsReinforcement)),
            "3" | "l" => Some(Self::Feedback(LessonStatus::ReviewLater)),
            "n" => Some(Self::NextLesson),
            "p" => Some(Self::ChangePlatform),
            "q" | "salir" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Parses a platform answer given by number or by name.
fn parse_platform_choice(input: &str) -> Option<Platform> {
    let input = input.trim();
    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| Platform::ALL.get(i).copied());
    }
    input.parse().ok()
}

/// The lesson after `current`, wrapping to the first.
fn next_lesson(current: &LessonTopic) -> &'static LessonTopic {
    let lessons = curriculum();
    lessons
        .iter()
        .position(|topic| topic.id == current.id)
        .and_then(|index| lessons.get(index + 1))
        .unwrap_or_else(first_lesson)
}

/// Two-line stand-in for a missing illustration.
fn illustration_fallback(topic: &LessonTopic) -> String {
    format!("📊 {}\n   {ILLUSTRATION_FALLBACK}", topic.title)
}

struct StudyView {
    renderer: TerminalRenderer,
    color: bool,
    illustrations_dir: PathBuf,
}

impl StudyView {
    fn new(config: &Config) -> Self {
        let color = config.color.enabled();
        Self {
            renderer: TerminalRenderer::new(color),
            color,
            illustrations_dir: Path::new(&config.state_dir).join("illustrations"),
        }
    }

    /// Redraws for every event published since the last call.
    fn drain(&self, events: &mut broadcast::Receiver<SessionEvent>, session: &mut LessonSession) {
        loop {
            match events.try_recv() {
                Ok(event) => self.on_event(&event, session),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn on_event(&self, event: &SessionEvent, session: &mut LessonSession) {
        tracing::debug!(event = event.event_name(), "Session event");
        match event {
            SessionEvent::PlatformRequired(_) => self.show_platform_question(),
            SessionEvent::ContentRequested(payload) => {
                self.show_loading(session.lesson(), payload.reinforcement);
            }
            SessionEvent::ContentReady(_) => self.show_lesson(session),
            SessionEvent::IllustrationReady(_) => self.save_illustration(session),
            SessionEvent::IllustrationAbsent(_) => {
                println!("\n{}", illustration_fallback(session.lesson()));
            }
            SessionEvent::FeedbackRecorded(payload) => {
                if payload.status != LessonStatus::NeedsReinforcement {
                    println!("Guardado: {}", payload.status.badge());
                    self.show_commands();
                }
            }
            SessionEvent::Error(payload) => {
                println!("Aviso: no se pudo guardar tu progreso ({}).", payload.message);
            }
            SessionEvent::LessonSelected(_)
            | SessionEvent::PlatformChosen(_)
            | SessionEvent::StaleResultDiscarded(_) => {}
        }
    }

    fn show_platform_question(&self) {
        println!();
        println!("¡Bienvenido al Laboratorio! 🧬");
        println!("Para darte las instrucciones precisas, necesitamos saber qué herramienta usarás hoy.");
        println!();
        print_platform_options(None);
        println!();
        prompt("Elige 1-4 (o q para salir): ");
    }

    fn show_loading(&self, topic: &LessonTopic, reinforcement: bool) {
        let what = if reinforcement {
            "Preparando una explicación más sencilla"
        } else {
            "Generando la lección"
        };
        println!();
        println!("{what}: {} {}...", topic.id, topic.title);
    }

    fn show_lesson(&self, session: &mut LessonSession) {
        if session.take_scroll_to_top() && self.color {
            print!("\x1b[2J\x1b[H");
        }

        let topic = session.lesson();
        println!();
        println!("{} | Lección {}", topic.level.label(), topic.id);
        if let Some(status) = session.status() {
            println!("[{}]", status.badge());
        }
        println!("{}", topic.title);
        if let Some(platform) = session.platform() {
            println!("Plataforma: {}", platform.label());
        }
        if session.awaiting_illustration() {
            println!("(Generando ilustración...)");
        }
        println!();
        print!("{}", self.renderer.render(&session.blocks()));

        if let Some(content) = session.content() {
            if !content.links.is_empty() {
                println!();
                println!("Para profundizar:");
                for link in &content.links {
                    println!("  - {}: {}", link.title, link.uri);
                }
            }
        }

        println!();
        println!("Tip Investigador: {RESEARCH_TIP}");
        self.show_commands();
    }

    fn show_commands(&self) {
        println!();
        println!("¿Cómo te fue con esta lección?");
        println!("  1) ¡Lo entendí!   2) Necesito refuerzo   3) Repasar después");
        println!("  n) Siguiente lección   p) Cambiar plataforma   q) Salir");
        prompt("> ");
    }

    fn save_illustration(&self, session: &LessonSession) {
        let ImageState::Ready(illustration) = session.image() else {
            return;
        };

        let path = self.illustrations_dir.join(format!(
            "{}.{}",
            session.lesson().id,
            illustration.extension()
        ));
        let written = illustration
            .decode()
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                std::fs::create_dir_all(&self.illustrations_dir)
                    .and_then(|()| std::fs::write(&path, bytes))
                    .map_err(|e| e.to_string())
            });
        match written {
            Ok(()) => println!("\n(Ilustración guardada en {})", path.display()),
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "Failed to save illustration");
                println!("\n{}", illustration_fallback(session.lesson()));
            }
        }
    }
}

/// Explains why feedback cannot be recorded right now.
const fn feedback_refusal(session: &LessonSession) -> &'static str {
    if session.awaiting_content() {
        "Espera a que termine de cargar la lección."
    } else {
        "Primero elige una plataforma."
    }
}

/// Runs the interactive study loop starting at `lesson_id`.
pub async fn run(config: &Config, lesson_id: Option<&str>) -> anyhow::Result<()> {
    let start = match lesson_id {
        Some(id) => lesson(id)?,
        None => first_lesson(),
    };

    let view = StudyView::new(config);
    let mut session = LessonSession::new(open_store(config), start);
    let mut events = session.events().subscribe();
    let mut driver = FetchDriver::new(ContentClient::new(build_service(config), config.max_links));

    driver.dispatch(session.select_lesson(start));
    view.drain(&mut events, &mut session);
    let mut lines = stdin_lines();

    loop {
        tokio::select! {
            Some(outcome) = driver.next() => {
                session.apply(outcome);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if session.state() == LessonState::NoPlatformSelected {
                    if line.trim().eq_ignore_ascii_case("q") {
                        break;
                    }
                    match parse_platform_choice(&line) {
                        Some(platform) => driver.dispatch(session.choose_platform(platform)),
                        None => prompt("Opción no válida. Elige 1-4: "),
                    }
                } else {
                    match StudyCommand::parse(&line) {
                        Some(StudyCommand::Quit) => break,
                        Some(StudyCommand::Feedback(status)) => {
                            match session.record_feedback(status) {
                                Ok(requests) => driver.dispatch(requests),
                                Err(PsychoError::InvalidStateTransition { .. }) => {
                                    println!("{}", feedback_refusal(&session));
                                }
                                Err(e) => return Err(e.into()),
                            }
                        }
                        Some(StudyCommand::NextLesson) => {
                            let next = next_lesson(session.lesson());
                            driver.dispatch(session.select_lesson(next));
                        }
                        Some(StudyCommand::ChangePlatform) => {
                            println!();
                            print_platform_options(session.platform());
                            prompt("Elige 1-4: ");
                            let Some(answer) = lines.next_line().await? else {
                                break;
                            };
                            let requests = parse_platform_choice(&answer)
                                .map(|platform| session.choose_platform(platform))
                                .unwrap_or_default();
                            if requests.is_empty() {
                                view.show_commands();
                            }
                            driver.dispatch(requests);
                        }
                        None => {
                            println!("Comando no reconocido.");
                            view.show_commands();
                        }
                    }
                }
            }
        }
        view.drain(&mut events, &mut session);
    }

    tracing::debug!(
        in_flight = driver.in_flight(),
        completed = session.store().completed_count(),
        "Study session finished"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use psychostats_core::{MemoryBackend, ProgressStore};

    use super::*;

    #[test]
    fn test_parse_study_commands() {
        assert_eq!(
            StudyCommand::parse(" 2 "),
            Some(StudyCommand::Feedback(LessonStatus::NeedsReinforcement))
        );
        assert_eq!(
            StudyCommand::parse("C"),
            Some(StudyCommand::Feedback(LessonStatus::Completed))
        );
        assert_eq!(StudyCommand::parse("salir"), Some(StudyCommand::Quit));
        assert_eq!(StudyCommand::parse("hola"), None);
    }

    #[test]
    fn test_parse_platform_choice_by_number_and_name() {
        assert_eq!(parse_platform_choice("1"), Some(Platform::Windows));
        assert_eq!(parse_platform_choice("4"), Some(Platform::Web));
        assert_eq!(parse_platform_choice("mac"), Some(Platform::Mac));
        assert_eq!(parse_platform_choice("0"), None);
        assert_eq!(parse_platform_choice("5"), None);
        assert_eq!(parse_platform_choice("linux"), None);
    }

    #[test]
    fn test_next_lesson_wraps() {
        assert_eq!(next_lesson(lesson("1.1").unwrap()).id, curriculum()[1].id);
        let last = curriculum().last().unwrap();
        assert_eq!(next_lesson(last).id, first_lesson().id);
    }

    #[test]
    fn test_illustration_fallback_names_lesson() {
        let text = illustration_fallback(lesson("4.1").unwrap());
        assert!(text.contains(lesson("4.1").unwrap().title));
        assert!(text.ends_with("Psicología & Datos"));
    }

    #[test]
    fn test_feedback_refusal_depends_on_loading() {
        let store = ProgressStore::open(MemoryBackend::new());
        let topic = lesson("2.1").unwrap();
        let mut session = LessonSession::new(store, topic);

        let _ = session.select_lesson(topic);
        assert_eq!(feedback_refusal(&session), "Primero elige una plataforma.");

        let _ = session.choose_platform(Platform::Web);
        assert_eq!(feedback_refusal(&session), "Espera a que termine de cargar la lección.");
    }

    #[test]
    fn test_view_drains_session_events() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            state_dir: dir.path().display().to_string(),
            ..Config::default()
        };
        let view = StudyView::new(&config);
        let store = ProgressStore::open(MemoryBackend::new());
        let topic = lesson("1.1").unwrap();
        let mut session = LessonSession::new(store, topic);
        let mut events = session.events().subscribe();

        let requests = session.select_lesson(topic);
        let ticket = requests[0].ticket();
        session.apply_illustration(ticket, None);

        view.drain(&mut events, &mut session);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(session.image(), &ImageState::Absent);
    }
}
