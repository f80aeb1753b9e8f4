//! Error taxonomy and HTTP failure classification.
//!
//! Transport failures are classified into an [`ApiErrorKind`] from the
//! response status code and/or the server-reported error string. Some
//! endpoints signal application errors with a human-readable string inside a
//! 200 response, so classification looks at both keys: exact status match
//! first, then exact error-string match, falling back to a generic failure.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure category derived from an HTTP status code or server error string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    AuthenticationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    /// Anything the classifier could not pin down.
    Api,
}

/// A classified transport failure.
///
/// The message is intentionally verbose (status, url, method, server error
/// text, traceback text, raw body) to aid debugging against a
/// development-mode server. Programmatic handling should match on `kind`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    /// The server-reported error string, e.g. "Resource not found.".
    pub error: String,
    pub(crate) message: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("cannot save a {0}")]
    CantSave(&'static str),

    #[error("a pk, slug, code or token is required to use get()")]
    MissingLookup,

    #[error("record has no identifier; fetch or save it first")]
    MissingIdentifier,

    #[error("expected status code {expected:?}, got {got}")]
    UnexpectedStatus { expected: &'static [u16], got: u16 },

    #[error("negative indexing is not supported")]
    NegativeIndex,

    #[error("step must be non-zero")]
    ZeroStep,

    #[error("index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("field {field}: {reason}")]
    Field { field: String, reason: String },

    #[error("expected a JSON object, got: {0}")]
    UnexpectedBody(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classification of the underlying transport failure, if this is one.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api(e) => Some(e.kind),
            _ => None,
        }
    }

    pub(crate) fn field(field: &str, reason: impl Into<String>) -> Self {
        Error::Field {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Map a status code and server error string to a failure category.
///
/// Exact status match wins over the string match; neither matching yields
/// the generic category. Pure mapping, no side effects.
pub fn classify(status: u16, error: &str) -> ApiErrorKind {
    match status {
        401 => ApiErrorKind::Unauthorized,
        403 => ApiErrorKind::Forbidden,
        404 => ApiErrorKind::NotFound,
        501 => ApiErrorKind::MethodNotAllowed,
        _ => match error {
            "Resource not found." => ApiErrorKind::NotFound,
            "Authentication failed." => ApiErrorKind::AuthenticationFailed,
            _ => ApiErrorKind::Api,
        },
    }
}
