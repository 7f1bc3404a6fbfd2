use crate::fields::FieldId;

/// A client-side submission check failed.
///
/// Carries the control that should receive focus and the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SubmissionError {
    pub field: FieldId,
    pub message: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum KardexError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read field registry file: {0}")]
    RegistryRead(std::io::Error),
    #[error("field registry schema mismatch at {path}: {message}")]
    RegistrySchema { path: String, message: String },
    #[error("unknown patient path: {0}")]
    UnknownPatientPath(String),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("record has no patient object at '{0}'")]
    MissingPatient(&'static str),
    #[error("no record found for {kind} '{term}'")]
    NotFound { kind: String, term: String },
    #[error("backend request failed: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
    #[error("submission blocked: {0}")]
    Submission(#[from] SubmissionError),
    #[error("server rejected the request: {0}")]
    Rejected(String),
    #[error("no movement selected")]
    NoMovementSelected,
}

pub type KardexResult<T> = std::result::Result<T, KardexError>;
