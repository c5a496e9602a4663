//! Error types for osc-core
//!
//! Every HTTP failure is a single [`ApiError`] whose [`ErrorKind`] and
//! retryability are derived from the status code alone. Everything that can go
//! wrong around the HTTP exchange (transport faults, malformed bodies,
//! cancellation, configuration) is a variant of [`Error`].

use thiserror::Error;

/// Result type alias for osc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Closed classification of HTTP failure statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
    Conflict,
    Gone,
    UnprocessableEntity,
    TooEarly,
    RateLimited,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    /// Any status without a dedicated kind
    UnexpectedStatus,
}

impl ErrorKind {
    /// Map a status code to its kind
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            408 => Self::RequestTimeout,
            409 => Self::Conflict,
            410 => Self::Gone,
            422 => Self::UnprocessableEntity,
            425 => Self::TooEarly,
            429 => Self::RateLimited,
            500 => Self::InternalServerError,
            501 => Self::NotImplemented,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            _ => Self::UnexpectedStatus,
        }
    }

    /// Human-readable reason phrase used as the error message
    pub const fn reason(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::RequestTimeout => "Request Timeout",
            Self::Conflict => "Conflict",
            Self::Gone => "Gone",
            Self::UnprocessableEntity => "Unprocessable Entity",
            Self::TooEarly => "Too Early",
            Self::RateLimited => "Too Many Requests",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
            Self::BadGateway => "Bad Gateway",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::GatewayTimeout => "Gateway Timeout",
            Self::UnexpectedStatus => "Unexpected HTTP Error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Whether a failure status came from the caller's side or the server's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 4xx and any other non-5xx failure status
    Client,
    /// 5xx
    Server,
}

/// A non-2xx response from the storage service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status} {message}: {body}")]
pub struct ApiError {
    pub status: u16,
    pub kind: ErrorKind,
    pub retryable: bool,
    pub message: String,
    /// Raw response body, kept verbatim for diagnostics
    pub body: String,
}

impl ApiError {
    /// Build the error for a failure status.
    ///
    /// Retryability is fixed per kind; only the `UnexpectedStatus` fallback
    /// depends on the numeric range (retryable iff `status >= 500`).
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let kind = ErrorKind::from_status(status);
        let retryable = match kind {
            ErrorKind::RequestTimeout
            | ErrorKind::TooEarly
            | ErrorKind::RateLimited
            | ErrorKind::InternalServerError
            | ErrorKind::NotImplemented
            | ErrorKind::BadGateway
            | ErrorKind::ServiceUnavailable
            | ErrorKind::GatewayTimeout => true,
            ErrorKind::BadRequest
            | ErrorKind::Unauthorized
            | ErrorKind::Forbidden
            | ErrorKind::NotFound
            | ErrorKind::MethodNotAllowed
            | ErrorKind::Conflict
            | ErrorKind::Gone
            | ErrorKind::UnprocessableEntity => false,
            ErrorKind::UnexpectedStatus => status >= 500,
        };

        Self {
            status,
            kind,
            retryable,
            message: kind.reason().to_string(),
            body: body.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        if self.status >= 500 {
            ErrorCategory::Server
        } else {
            ErrorCategory::Client
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Client
    }

    pub fn is_server_error(&self) -> bool {
        self.category() == ErrorCategory::Server
    }
}

/// Low-level failure class for errors raised below the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    /// Connection pool stayed saturated for the whole lease timeout
    PoolTimeout,
    Io,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::PoolTimeout => "pool_timeout",
            Self::Io => "io",
            Self::Other => "other",
        };
        f.write_str(text)
    }
}

/// Main error type for osc-core
#[derive(Debug, Error)]
pub enum Error {
    /// The service answered with a failure status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Connection, timeout or I/O failure while talking to the service
    #[error("transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// A 2xx response whose body did not match the expected shape
    #[error("failed to decode response body: {message}")]
    Decode { message: String, body: String },

    /// The request could not be built (bad URL, header, or body)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("alias not found: {0}")]
    AliasNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The caller cancelled the call
    #[error("request cancelled")]
    Cancelled,

    /// The dispatcher was shut down while the call was pending
    #[error("client closed")]
    ClientClosed,
}

impl Error {
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Whether the retry policy may re-attempt after this failure.
    ///
    /// Transport faults are always retryable; HTTP failures follow the status
    /// taxonomy; everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(api) => api.retryable,
            Error::Transport { .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            _ => None,
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(api) => Some(api),
            _ => None,
        }
    }

    /// Raw response body carried by the error, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Api(api) => Some(&api.body),
            Error::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Get the appropriate CLI exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Api(api) => match api.kind {
                ErrorKind::Unauthorized | ErrorKind::Forbidden => 4,
                ErrorKind::NotFound | ErrorKind::Gone => 5,
                ErrorKind::Conflict => 6,
                ErrorKind::BadRequest
                | ErrorKind::MethodNotAllowed
                | ErrorKind::UnprocessableEntity => 2,
                _ => 1,
            },
            Error::Transport { .. } => 3,
            Error::InvalidRequest(_) | Error::InvalidPath(_) | Error::Config(_) => 2,
            Error::AliasNotFound(_) => 5,
            Error::Cancelled => 130,
            Error::Decode { .. } | Error::Io(_) | Error::ClientClosed => 1,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [500, 501, 502, 503, 504, 429, 408, 425] {
            let err = ApiError::from_status(status, "");
            assert!(err.retryable, "{status} should be retryable");
        }
    }

    #[test]
    fn test_terminal_statuses() {
        for status in [400, 401, 403, 404, 405, 409, 410, 422] {
            let err = ApiError::from_status(status, "");
            assert!(!err.retryable, "{status} should not be retryable");
        }
    }

    #[test]
    fn test_unmapped_status_fallback() {
        for status in [300, 302, 418, 451, 499] {
            let err = ApiError::from_status(status, "");
            assert_eq!(err.kind, ErrorKind::UnexpectedStatus);
            assert!(!err.retryable);
            assert_eq!(err.message, "Unexpected HTTP Error");
        }
        for status in [505, 507, 599] {
            let err = ApiError::from_status(status, "");
            assert_eq!(err.kind, ErrorKind::UnexpectedStatus);
            assert!(err.retryable);
        }
    }

    #[test]
    fn test_kind_table() {
        let table = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (405, ErrorKind::MethodNotAllowed),
            (408, ErrorKind::RequestTimeout),
            (409, ErrorKind::Conflict),
            (410, ErrorKind::Gone),
            (422, ErrorKind::UnprocessableEntity),
            (425, ErrorKind::TooEarly),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::InternalServerError),
            (501, ErrorKind::NotImplemented),
            (502, ErrorKind::BadGateway),
            (503, ErrorKind::ServiceUnavailable),
            (504, ErrorKind::GatewayTimeout),
        ];
        for (status, kind) in table {
            assert_eq!(ErrorKind::from_status(status), kind);
        }
    }

    #[test]
    fn test_body_kept_verbatim() {
        let err = ApiError::from_status(409, r#"{"error":"bucket already exists"}"#);
        assert_eq!(err.body, r#"{"error":"bucket already exists"}"#);
        assert_eq!(err.message, "Conflict");
        assert_eq!(err.category(), ErrorCategory::Client);
    }

    #[test]
    fn test_error_retryability() {
        assert!(Error::transport(TransportErrorKind::Connect, "refused").is_retryable());
        assert!(Error::from(ApiError::from_status(503, "")).is_retryable());
        assert!(!Error::from(ApiError::from_status(404, "")).is_retryable());
        assert!(
            !Error::Decode {
                message: "expected value".into(),
                body: "oops".into()
            }
            .is_retryable()
        );
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::ClientClosed.is_retryable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::from(ApiError::from_status(404, "")).exit_code(), 5);
        assert_eq!(Error::from(ApiError::from_status(403, "")).exit_code(), 4);
        assert_eq!(Error::from(ApiError::from_status(409, "")).exit_code(), 6);
        assert_eq!(
            Error::transport(TransportErrorKind::Timeout, "slow").exit_code(),
            3
        );
        assert_eq!(Error::AliasNotFound("x".into()).exit_code(), 5);
        assert_eq!(Error::Cancelled.exit_code(), 130);
    }
}
