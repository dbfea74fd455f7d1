use std::fmt;

use thiserror::Error;

/// Coarse failure class, used to tell transient trouble from permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout or connection failure before a response arrived.
    Transport,
    /// The service answered with a non-success status.
    Service,
    /// The service answered but the body was unusable.
    Malformed,
    /// The response carried no inline image part.
    NoImage,
    /// The worker running the request stopped before settling.
    Aborted,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Service => "service",
            FailureKind::Malformed => "malformed",
            FailureKind::NoImage => "no_image",
            FailureKind::Aborted => "aborted",
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(self, FailureKind::Transport | FailureKind::Aborted)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("analysis failed ({kind}): {message}")]
pub struct AnalysisError {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generation failed for '{style_id}' ({kind}): {message}")]
pub struct GenerationError {
    pub style_id: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Reasons a user action was not started. Hosts normally prevent these by
/// disabling the triggering control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("an image, or a land description longer than 10 characters, is required")]
    MissingInput,
    #[error("a batch is already running")]
    BatchInFlight,
    #[error("style '{0}' is not in the active catalog")]
    UnknownStyle(String),
    #[error("there is no generated variant '{0}' yet")]
    NoVariant(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl FlowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FlowError::Analysis(err) => err.kind,
            FlowError::Generation(err) => err.kind,
        }
    }
}
