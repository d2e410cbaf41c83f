//! # Error Taxonomy
//! Every suspension point in the matcher and backlog pipelines returns
//! this single kind instead of raising/propagating a language exception.
//! `ErrorClassifier` (C10) is the only place that knows how a kind maps
//! onto a transport status; everywhere else just propagates `ErrorKind`
//! with `?`.

use thiserror::Error;

/// Failure taxonomy shared by every component (C1-C9).
///
/// A failed hard constraint in the scorer is *not* an error (spec §7):
/// it is expressed as the 5% floor score, never as `ErrorKind`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ErrorKind {
    /// Shape, length, or precondition failure — including "no requirements
    /// extracted" and corrupt/already-valid sessions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// LLM timeout/rate-limit/transport/model error after internal retries.
    #[error("external service failure: {0}")]
    ExternalService(String),

    /// LLM returned non-conforming JSON after the retry budget.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// DB connectivity, constraint violation, transaction rollback.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Unexpected failure with no clearer classification.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }
    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Transport-facing status class (C10). Kept decoupled from any specific
/// HTTP crate so the classifier stays usable outside of `api.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    ClientError,
    BadGateway,
    InternalError,
}

impl StatusClass {
    /// Numeric HTTP status a transport layer would map this to.
    pub fn http_code(self) -> u16 {
        match self {
            StatusClass::ClientError => 400,
            StatusClass::BadGateway => 502,
            StatusClass::InternalError => 500,
        }
    }
}

/// C10 — maps an `ErrorKind` to its externally visible status class.
pub fn classify(err: &ErrorKind) -> StatusClass {
    match err {
        ErrorKind::InvalidInput(_) => StatusClass::ClientError,
        ErrorKind::ExternalService(_) => StatusClass::BadGateway,
        ErrorKind::Storage(_) => StatusClass::InternalError,
        ErrorKind::MalformedResponse(_) => StatusClass::BadGateway,
        ErrorKind::Internal(_) => StatusClass::InternalError,
    }
}

pub type Result<T> = std::result::Result<T, ErrorKind>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_maps_every_kind() {
        assert_eq!(
            classify(&ErrorKind::invalid_input("x")),
            StatusClass::ClientError
        );
        assert_eq!(
            classify(&ErrorKind::external_service("x")),
            StatusClass::BadGateway
        );
        assert_eq!(
            classify(&ErrorKind::malformed_response("x")),
            StatusClass::BadGateway
        );
        assert_eq!(classify(&ErrorKind::storage("x")), StatusClass::InternalError);
        assert_eq!(classify(&ErrorKind::internal("x")), StatusClass::InternalError);
    }

    #[test]
    fn http_codes_match_spec() {
        assert_eq!(StatusClass::ClientError.http_code(), 400);
        assert_eq!(StatusClass::BadGateway.http_code(), 502);
        assert_eq!(StatusClass::InternalError.http_code(), 500);
    }
}
