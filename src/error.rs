//! Error types shared by the catalog, queue and codec layers.

use thiserror::Error;

/// Result alias used by the remote-facing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed wire-format input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("map entry `{token}` has no `=` separator")]
    MissingSeparator { token: String },
    #[error("map entry `{token}` is not valid base64: {reason}")]
    InvalidBase64 { token: String, reason: String },
    #[error("map entry `{token}` does not decode to UTF-8")]
    InvalidUtf8 { token: String },
}

/// Failures surfaced by [`crate::list_plans`], [`crate::queue_build`] and friends.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connection `{connection}` requires credentials to be set up")]
    AuthRequired { connection: String },
    #[error("request for {endpoint} was unsuccessful, status code is {status}")]
    RemoteCallFailed { endpoint: String, status: u16 },
    #[error("request for {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("error parsing response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("plan `{plan}` is not offered by connection `{connection}`")]
    UnknownPlan { connection: String, plan: String },
    #[error("plan `{plan}` does not declare variable `{variable}`")]
    UndeclaredVariable { plan: String, variable: String },
}

impl Error {
    /// True for every failure that came back from (or on the way to) the remote instance.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Error::RemoteCallFailed { .. } | Error::Transport { .. } | Error::MalformedResponse { .. }
        )
    }

    /// Endpoint or URL the failure is attributed to, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Error::RemoteCallFailed { endpoint, .. } | Error::Transport { endpoint, .. } => {
                Some(endpoint)
            }
            Error::MalformedResponse { url, .. } => Some(url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_failure_grouping() {
        let failed = Error::RemoteCallFailed {
            endpoint: "/rest/api/latest/plan".to_string(),
            status: 500,
        };
        let malformed = Error::MalformedResponse {
            url: "http://bamboo/rest/api/latest/plan".to_string(),
            reason: "missing `plans`".to_string(),
        };
        let auth = Error::AuthRequired {
            connection: "main".to_string(),
        };

        assert!(failed.is_remote_failure());
        assert!(malformed.is_remote_failure());
        assert!(!auth.is_remote_failure());
        assert_eq!(malformed.endpoint(), Some("http://bamboo/rest/api/latest/plan"));
        assert_eq!(auth.endpoint(), None);
    }

    #[test]
    fn test_status_in_message() {
        let err = Error::RemoteCallFailed {
            endpoint: "/rest/api/latest/queue/PROJ-PLAN".to_string(),
            status: 503,
        };
        let message = err.to_string();
        assert!(message.contains("/rest/api/latest/queue/PROJ-PLAN"));
        assert!(message.contains("503"));
    }
}
