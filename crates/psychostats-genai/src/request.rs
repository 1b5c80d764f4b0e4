//! Request shapes accepted by a [`GenerationService`](crate::GenerationService).

use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The student.
    User,
    /// The generation model.
    Model,
}

/// One turn of a conversation sent to the text model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who wrote the turn.
    pub role: Role,
    /// Plain text of the turn.
    pub text: String,
}

impl ChatTurn {
    /// Creates a user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Creates a model turn.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A text generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    /// Persona and standing rules for the model.
    pub system_instruction: Option<String>,
    /// Conversation so far; a single user turn for one-shot prompts.
    pub contents: Vec<ChatTurn>,
    /// Whether the web search tool is enabled so the response carries
    /// grounding citations.
    pub grounding: bool,
}

impl TextRequest {
    /// Creates a one-shot request from a single prompt.
    #[must_use]
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            contents: vec![ChatTurn::user(text)],
            grounding: false,
        }
    }

    /// Creates a request that continues a conversation.
    #[must_use]
    pub const fn conversation(contents: Vec<ChatTurn>) -> Self {
        Self {
            system_instruction: None,
            contents,
            grounding: false,
        }
    }

    /// Sets the system instruction.
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Enables or disables search grounding.
    #[must_use]
    pub const fn with_grounding(mut self, grounding: bool) -> Self {
        self.grounding = grounding;
        self
    }

    /// Returns the text of the last user turn, if any.
    #[must_use]
    pub fn last_user_text(&self) -> Option<&str> {
        self.contents
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.text.as_str())
    }
}

/// A long-running video generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    /// Description of the animation.
    pub prompt: String,
    /// Output aspect ratio, e.g. `16:9`.
    pub aspect_ratio: String,
    /// Output resolution, e.g. `720p`.
    pub resolution: String,
}

impl VideoRequest {
    /// Creates a 16:9, 720p request.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: "16:9".to_string(),
            resolution: "720p".to_string(),
        }
    }
}
