//! Error taxonomy shared by every network-facing module.
//!
//! Failures are classified where they happen (from the `reqwest::Error` or the
//! HTTP status) so callers branch on the variant instead of on message text.

use std::fmt;

/// Why a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    Timeout,
    Connect,
    /// Connection dropped or body interrupted mid-transfer.
    Interrupted,
    ServerError(u16),
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("request timed out"),
            Self::Connect => f.write_str("connection failed"),
            Self::Interrupted => f.write_str("connection interrupted"),
            Self::ServerError(status) => write!(f, "server error {status}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{service}: transient failure ({kind})")]
    Transient {
        service: &'static str,
        kind: TransientKind,
    },

    #[error("{service}: credential rejected (HTTP {status})")]
    Auth { service: &'static str, status: u16 },

    #[error("{service}: HTTP {status}")]
    Http { service: &'static str, status: u16 },

    #[error("{service}: unexpected response shape: {detail}")]
    UnexpectedResponse {
        service: &'static str,
        detail: String,
    },
}

impl LyricsError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unexpected(service: &'static str, detail: impl fmt::Display) -> Self {
        Self::UnexpectedResponse {
            service,
            detail: detail.to_string(),
        }
    }

    /// Map a non-success status code onto the taxonomy.
    pub fn from_status(service: &'static str, status: reqwest::StatusCode) -> Self {
        let code = status.as_u16();
        match code {
            401 | 403 => Self::Auth {
                service,
                status: code,
            },
            408 | 429 => Self::Transient {
                service,
                kind: TransientKind::ServerError(code),
            },
            _ if status.is_server_error() => Self::Transient {
                service,
                kind: TransientKind::ServerError(code),
            },
            _ => Self::Http {
                service,
                status: code,
            },
        }
    }

    /// Classify a transport-level error from reqwest.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(service, status);
        }
        if err.is_timeout() {
            return Self::Transient {
                service,
                kind: TransientKind::Timeout,
            };
        }
        if err.is_connect() {
            return Self::Transient {
                service,
                kind: TransientKind::Connect,
            };
        }
        if err.is_decode() {
            return Self::unexpected(service, err);
        }
        if err.is_request() || err.is_body() {
            return Self::Transient {
                service,
                kind: TransientKind::Interrupted,
            };
        }
        Self::unexpected(service, err)
    }

    /// The only retry predicate in the crate.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(LyricsError::from_status("genius", StatusCode::FORBIDDEN).is_auth());
        assert!(LyricsError::from_status("genius", StatusCode::UNAUTHORIZED).is_auth());
        assert!(LyricsError::from_status("genius", StatusCode::BAD_GATEWAY).is_transient());
        assert!(LyricsError::from_status("genius", StatusCode::TOO_MANY_REQUESTS).is_transient());

        let not_found = LyricsError::from_status("genius", StatusCode::NOT_FOUND);
        assert!(!not_found.is_transient());
        assert!(!not_found.is_auth());
    }

    #[test]
    fn test_invalid_argument_is_permanent() {
        let err = LyricsError::invalid("title must not be empty");
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "invalid argument: title must not be empty");
    }
}
