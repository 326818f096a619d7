//! Overpass client error types.

use std::time::Duration;

/// Longest body excerpt kept in errors.
pub(crate) const BODY_EXCERPT_CHARS: usize = 500;

/// Errors from executing an Overpass query.
///
/// An empty result set is not an error; it comes back as `Ok` with no
/// elements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverpassError {
    /// The request never produced an HTTP response
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Overpass answered with a non-200 status
    #[error("Overpass returned HTTP {status}")]
    Status { status: u16, body: String },

    /// A 200 response whose body was not valid Overpass JSON
    #[error("invalid Overpass response: {message}")]
    Parse { message: String, body: String },

    /// The exchange did not finish within the query's budget
    #[error("Overpass query timed out after {after:?}")]
    Timeout { after: Duration },

    /// The caller cancelled the query
    #[error("query cancelled")]
    Cancelled,
}

impl OverpassError {
    pub(crate) fn parse(err: &serde_json::Error, body: &str) -> Self {
        OverpassError::Parse {
            message: err.to_string(),
            body: excerpt(body),
        }
    }

    /// HTTP status, for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            OverpassError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, OverpassError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OverpassError::Cancelled)
    }

    /// Whether Overpass was asked for too much, either by our own budget
    /// running out or by the server giving up (504).
    pub fn suggests_smaller_area(&self) -> bool {
        self.is_timeout() || self.status() == Some(504)
    }

    /// Whether Overpass is rate limiting us.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

impl From<reqwest::Error> for OverpassError {
    fn from(err: reqwest::Error) -> Self {
        OverpassError::Transport {
            message: err.to_string(),
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OverpassError::Status {
            status: 429,
            body: "rate_limited".into(),
        };
        assert_eq!(err.to_string(), "Overpass returned HTTP 429");
        assert!(err.is_rate_limited());

        let err = OverpassError::Timeout {
            after: Duration::from_millis(1),
        };
        assert_eq!(err.to_string(), "Overpass query timed out after 1ms");
        assert!(err.suggests_smaller_area());

        assert_eq!(OverpassError::Cancelled.to_string(), "query cancelled");
    }

    #[test]
    fn gateway_timeout_suggests_smaller_area() {
        let err = OverpassError::Status {
            status: 504,
            body: String::new(),
        };
        assert!(err.suggests_smaller_area());
        assert!(!err.is_timeout());
    }

    #[test]
    fn parse_error_keeps_excerpt() {
        let body = "x".repeat(2000);
        let json_err = serde_json::from_str::<serde_json::Value>(&body).unwrap_err();
        let err = OverpassError::parse(&json_err, &body);
        match err {
            OverpassError::Parse { body, .. } => assert_eq!(body.len(), BODY_EXCERPT_CHARS),
            other => panic!("unexpected {other:?}"),
        }
    }
}
