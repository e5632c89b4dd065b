use http::{Method, StatusCode};
use micro_record::RecordError;
use std::io;
use thiserror::Error;

/// Failures raised while resolving a request to a dispatch target.
///
/// These are distinct from application failures raised by a handler, which
/// travel as [`HandlerError`] and are shaped into the JSON error envelope.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("undefined route: {path}")]
    NotFound { path: String },

    #[error("invalid request method for route {path}: {method}")]
    MethodNotAllowed { method: Method, path: String },

    #[error("invalid route target {controller}::{action}: {reason}")]
    InvalidRoute {
        controller: String,
        action: String,
        reason: String,
    },

    #[error("invalid URI pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl RouteError {
    pub fn not_found<S: ToString>(path: S) -> Self {
        Self::NotFound { path: path.to_string() }
    }

    pub fn method_not_allowed<S: ToString>(method: Method, path: S) -> Self {
        Self::MethodNotAllowed { method, path: path.to_string() }
    }

    pub fn invalid_route<C, A, R>(controller: C, action: A, reason: R) -> Self
    where
        C: ToString,
        A: ToString,
        R: ToString,
    {
        Self::InvalidRoute {
            controller: controller.to_string(),
            action: action.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern<P: ToString, R: ToString>(pattern: P, reason: R) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidRoute { .. } | Self::InvalidPattern { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What can go wrong while responding to a resolved target: a dispatch-time
/// routing failure, or an I/O failure from the response sink.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// An application failure raised by a handler, carrying an optional HTTP
/// status. The dispatch boundary turns it into the error envelope; the
/// message is what the client sees.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    status: Option<StatusCode>,
}

impl HandlerError {
    pub fn new<S: ToString>(message: S) -> Self {
        Self { message: message.to_string(), status: None }
    }

    pub fn with_status<S: ToString>(status: StatusCode, message: S) -> Self {
        Self { message: message.to_string(), status: Some(status) }
    }

    pub fn bad_request<S: ToString>(message: S) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized<S: ToString>(message: S) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden<S: ToString>(message: S) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found<S: ToString>(message: S) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed<S: ToString>(message: S) -> Self {
        Self::with_status(StatusCode::METHOD_NOT_ALLOWED, message)
    }

    pub fn unsupported_media_type<S: ToString>(message: S) -> Self {
        Self::with_status(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }

    pub fn internal<S: ToString>(message: S) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The status the response will carry, falling back to 500.
    pub fn resolved_status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Record coercion failures surface to clients as bad requests.
impl From<RecordError> for HandlerError {
    fn from(e: RecordError) -> Self {
        Self::bad_request(e)
    }
}

/// Programmer-error invariant violations, e.g. closing a session twice.
#[derive(Debug, Error)]
#[error("logic error: {reason}")]
pub struct LogicError {
    reason: String,
}

impl LogicError {
    pub fn new<S: ToString>(reason: S) -> Self {
        Self { reason: reason.to_string() }
    }
}
