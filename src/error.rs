//! Error types for the onboarding service.

use crate::onboarding::state::OnboardingStage;

/// Top-level error type for the service binary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown platform backend: {0}")]
    UnknownBackend(String),
}

/// Failure of a call against the backend platform.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("{operation} request failed: {reason}")]
    Request { operation: String, reason: String },

    /// The platform answered with a non-success status. Displays the
    /// platform's own message so it can be passed through to callers.
    #[error("{message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("Invalid response from {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },
}

impl PlatformError {
    /// Whether the platform rejected the call because the resource already
    /// exists (duplicate ID, email, or unique index violation).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }
}

/// An onboarding step was recorded out of order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("Already at terminal stage {0}")]
    Terminal(OnboardingStage),

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: OnboardingStage,
        to: OnboardingStage,
    },

    #[error("Expected stage {expected}, found {found}")]
    OutOfOrder {
        expected: OnboardingStage,
        found: OnboardingStage,
    },
}

/// Errors returned by the onboarding pipeline.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    /// A required field is missing or empty.
    #[error("{0}")]
    Validation(String),

    /// The request body is not valid JSON. Reported as a server error.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// A staff profile with the same employee ID already exists.
    #[error("Employee already exists")]
    Conflict,

    /// A platform call failed after the pipeline reached `stage`.
    #[error("{source}")]
    Platform {
        stage: OnboardingStage,
        #[source]
        source: PlatformError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OnboardingError {
    pub fn missing_fields() -> Self {
        Self::Validation("Missing required fields".to_string())
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
