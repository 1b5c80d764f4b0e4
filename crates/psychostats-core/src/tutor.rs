//! Conversational tutor.

use std::sync::Arc;

use psychostats_genai::{ChatTurn, GenerationService, TextRequest};
use tracing::{debug, warn};

use crate::prompt::TUTOR_PERSONA;

/// Opening message of every conversation.
pub const TUTOR_GREETING: &str = "¡Hola! Soy tu tutor de PsychoStats. Entiendo que Excel puede parecer intimidante al principio, pero iremos paso a paso. ¿En qué puedo ayudarte hoy con tus datos?";

/// Reply used when the service cannot be reached.
pub const TUTOR_APOLOGY: &str = "Lo siento, hubo un error de conexión. Intenta preguntar nuevamente.";

/// A tutoring conversation.
///
/// The greeting is a local model turn; only the turns from the first
/// student question onward are sent to the service.
pub struct TutorChat {
    service: Arc<dyn GenerationService>,
    history: Vec<ChatTurn>,
}

impl std::fmt::Debug for TutorChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TutorChat")
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl TutorChat {
    /// Starts a conversation with the greeting turn.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            history: vec![ChatTurn::model(TUTOR_GREETING)],
        }
    }

    /// All turns so far, greeting included.
    #[must_use]
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Sends a question and returns the reply.
    ///
    /// Never fails: service errors and empty answers become
    /// [`TUTOR_APOLOGY`]. Blank questions are ignored and return `None`.
    pub async fn ask(&mut self, question: &str) -> Option<String> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.history.push(ChatTurn::user(question));
        let request =
            TextRequest::conversation(self.history.clone()).with_system_instruction(TUTOR_PERSONA);

        let reply = match self.service.generate_text(&request).await {
            Ok(response) => response.text().unwrap_or_else(|| {
                warn!("Tutor reply was empty");
                TUTOR_APOLOGY.to_string()
            }),
            Err(err) => {
                warn!(error = %err.detail(), "Tutor chat failed");
                TUTOR_APOLOGY.to_string()
            }
        };

        debug!(turns = self.history.len(), "Tutor replied");
        self.history.push(ChatTurn::model(reply.clone()));
        Some(reply)
    }
}
