//! Error types for calls to the generation service.
//!
//! Every failure carries an [`ErrorKind`] so callers can decide whether a
//! degraded retry is worth attempting or whether the failure is final.

/// A specialized `Result` type for generation service calls.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors returned by a [`GenerationService`](crate::GenerationService).
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    // ========================================================================
    // Credential Errors
    // ========================================================================
    /// No API key was available when the call was about to be made.
    ///
    /// Detected before any network traffic happens.
    #[error("API key not configured: environment variable '{env_var}' is not set\n\nSuggestion: Export {env_var} with a valid Gemini API key")]
    MissingCredential {
        /// Name of the environment variable that was expected to hold the key.
        env_var: String,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// The service answered with a non-success status.
    #[error("Generation API error ({kind}, HTTP {status}): {message}\n\nSuggestion: {suggestion}")]
    Api {
        /// Classified failure category.
        kind: ErrorKind,
        /// HTTP status code of the response.
        status: u16,
        /// Message reported by the service.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The request never produced a response (DNS, connect, reset).
    #[error("Network error: {0}\n\nSuggestion: Check your network connection")]
    Network(String),

    /// The service answered with a body that could not be understood.
    #[error("Malformed response from generation API: {0}")]
    MalformedResponse(String),
}

/// Failure categories of the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No credential is configured.
    MissingCredential,
    /// The credential was rejected, or the request itself was invalid.
    InvalidCredential,
    /// The credential is valid but lacks access to the resource.
    PermissionDenied,
    /// The model or operation does not exist or is unavailable.
    NotFound,
    /// Rate limiting, server errors and network failures.
    Transient,
    /// Anything else.
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "missing_credential"),
            Self::InvalidCredential => write!(f, "invalid_credential"),
            Self::PermissionDenied => write!(f, "permission_denied"),
            Self::NotFound => write!(f, "not_found"),
            Self::Transient => write!(f, "transient"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl ErrorKind {
    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::MissingCredential => "Set the API key environment variable before starting",
            Self::InvalidCredential => "Check that your API key is correct and has not been revoked",
            Self::PermissionDenied => "Make sure the API key's project has access to this model",
            Self::NotFound => "Check the model name in psychostats.json",
            Self::Transient => "Retry later; the service may be overloaded",
            Self::Unknown => "Check the generation service status page",
        }
    }

    /// Returns `true` if a different request strategy could still succeed.
    ///
    /// Credential and permission problems fail identically on every path.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::MissingCredential | Self::InvalidCredential | Self::PermissionDenied
        )
    }

    /// Classifies a failed response from its HTTP status, the API status
    /// string (e.g. `PERMISSION_DENIED`) and the error message.
    #[must_use]
    pub fn classify(status: u16, api_status: Option<&str>, message: &str) -> Self {
        let api_status = api_status.unwrap_or_default();

        if message.contains("API key not valid")
            || message.contains("API_KEY_INVALID")
            || api_status == "UNAUTHENTICATED"
            || api_status == "INVALID_ARGUMENT"
            || matches!(status, 400 | 401)
        {
            return Self::InvalidCredential;
        }

        if api_status == "PERMISSION_DENIED" || message.contains("Permission") || status == 403 {
            return Self::PermissionDenied;
        }

        if api_status == "NOT_FOUND"
            || message.contains("Requested entity was not found")
            || status == 404
        {
            return Self::NotFound;
        }

        if api_status == "RESOURCE_EXHAUSTED"
            || api_status == "UNAVAILABLE"
            || matches!(status, 408 | 429)
            || (500..600).contains(&status)
        {
            return Self::Transient;
        }

        Self::Unknown
    }
}

impl GenerationError {
    /// Creates a new `MissingCredential` error.
    #[must_use]
    pub fn missing_credential(env_var: impl Into<String>) -> Self {
        Self::MissingCredential {
            env_var: env_var.into(),
        }
    }

    /// Creates a new `Api` error with automatic suggestion based on error kind.
    #[must_use]
    pub fn api(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            kind,
            status,
            message: message.into(),
            suggestion: kind.suggestion().to_string(),
        }
    }

    /// Returns the classified failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential { .. } => ErrorKind::MissingCredential,
            Self::Api { kind, .. } => *kind,
            Self::Network(_) => ErrorKind::Transient,
            Self::MalformedResponse(_) => ErrorKind::Unknown,
        }
    }

    /// Returns `true` if a degraded retry may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns the underlying detail without the suggestion suffix.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::MissingCredential { env_var } => format!("{env_var} is not set"),
            Self::Api { message, .. } => message.clone(),
            Self::Network(message) | Self::MalformedResponse(message) => message.clone(),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
