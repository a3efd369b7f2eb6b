use std::fmt;

use thiserror::Error;

/// Sub-kind of a non-success HTTP status, used for log wording and for
/// callers that react to specific statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    Other,
}

impl StatusKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::ServerError => "server error",
            Self::Other => "unexpected status",
        };
        f.write_str(label)
    }
}

/// Every way a gateway call can fail.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response arrived: connect failure, timeout, or a broken body.
    #[error("network error: {message}")]
    Network { timed_out: bool, message: String },

    /// A response arrived with a non-2xx status.
    #[error("request failed ({status} {kind}): {message}")]
    HttpStatus {
        status: u16,
        kind: StatusKind,
        message: String,
    },

    /// A 2xx response whose envelope reports failure.
    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The descriptor could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            kind: StatusKind::from_status(status),
            message: message.into(),
        }
    }

    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        Self::Network {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }

    /// HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus {
                kind: StatusKind::Unauthorized,
                ..
            }
        )
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguished_statuses() {
        assert_eq!(StatusKind::from_status(401), StatusKind::Unauthorized);
        assert_eq!(StatusKind::from_status(403), StatusKind::Forbidden);
        assert_eq!(StatusKind::from_status(404), StatusKind::NotFound);
        assert_eq!(StatusKind::from_status(500), StatusKind::ServerError);
        assert_eq!(StatusKind::from_status(502), StatusKind::Other);
        assert_eq!(StatusKind::from_status(418), StatusKind::Other);
    }

    #[test]
    fn http_status_helpers() {
        let err = GatewayError::http_status(401, "token expired");
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            "request failed (401 unauthorized): token expired"
        );
    }

    #[test]
    fn api_error_has_no_status() {
        let err = GatewayError::Api {
            code: 602,
            message: "task not found".to_string(),
        };
        assert_eq!(err.status(), None);
        assert!(!err.is_unauthorized());
        assert_eq!(err.to_string(), "api error 602: task not found");
    }
}
