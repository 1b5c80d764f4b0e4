//! Error types for PsychoStats.
//!
//! Content, illustration and tutor operations never return these; they
//! degrade to displayable text instead. The variants here cover startup,
//! persistence and misuse of the lesson session.

use std::path::PathBuf;

/// A specialized `Result` type for PsychoStats operations.
pub type Result<T> = std::result::Result<T, PsychoError>;

/// Errors that can occur in PsychoStats.
#[derive(Debug, thiserror::Error)]
pub enum PsychoError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your psychostats.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// No lesson with this identifier exists in the curriculum.
    #[error("Unknown lesson '{id}'\n\nSuggestion: Run 'psychostats lessons' to list lesson identifiers")]
    UnknownLesson {
        /// The identifier that was requested.
        id: String,
    },

    /// The platform name is not one of the supported options.
    #[error("Unknown platform '{name}'\n\nSuggestion: Choose one of: windows, mac, tablet, web")]
    InvalidPlatform {
        /// The name that was given.
        name: String,
    },

    // ========================================================================
    // State Persistence Errors
    // ========================================================================
    /// Writing progress or preference state failed.
    #[error("Failed to save state to '{path}': {message}\n\nSuggestion: Check write permissions for the state directory")]
    StatePersist {
        /// Path of the state entry.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // State Machine Errors
    // ========================================================================
    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },
}

impl PsychoError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `UnknownLesson` error.
    #[must_use]
    pub fn unknown_lesson(id: impl Into<String>) -> Self {
        Self::UnknownLesson { id: id.into() }
    }

    /// Creates a new `InvalidPlatform` error.
    #[must_use]
    pub fn invalid_platform(name: impl Into<String>) -> Self {
        Self::InvalidPlatform { name: name.into() }
    }

    /// Creates a new `StatePersist` error.
    #[must_use]
    pub fn state_persist(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StatePersist {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = PsychoError::unknown_lesson("9.9");
        let msg = err.to_string();
        assert!(msg.contains("Unknown lesson '9.9'"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = PsychoError::invalid_transition("loading", "reinforcement_pending");
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot go from loading to reinforcement_pending"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PsychoError = io_err.into();
        assert!(matches!(err, PsychoError::Io(_)));
    }
}
