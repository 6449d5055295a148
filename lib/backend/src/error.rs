//! Error types for the backend crate.

use std::fmt;

/// Whether a backend failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Transient failure (timeout, rate limit, upstream unavailable).
    /// The session remains usable; the caller may retry the same turn.
    Transient,
    /// Permanent failure (bad request, auth, model rejection).
    /// The session remains usable but the failed turn is not recorded.
    Permanent,
}

/// An error from the AI backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Failure class.
    pub kind: BackendErrorKind,
    /// Upstream status code, if the backend reported one.
    pub status: Option<u32>,
    /// Human-readable description.
    pub message: String,
}

impl BackendError {
    /// Creates a transient error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Transient,
            status: None,
            message: message.into(),
        }
    }

    /// Creates a permanent error.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Permanent,
            status: None,
            message: message.into(),
        }
    }

    /// Attaches an upstream status code.
    #[must_use]
    pub fn with_status(mut self, status: u32) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if the caller may retry the same turn.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == BackendErrorKind::Transient
    }

    /// Returns a multi-line description suitable for showing to the
    /// requesting user, including the upstream status when known.
    #[must_use]
    pub fn user_detail(&self) -> String {
        match self.status {
            Some(status) => format!("{}\n\nStatus: {}", self.message, status),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => {
                write!(f, "backend request failed ({}): {}", status, self.message)
            }
            None => write!(f, "backend request failed: {}", self.message),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_retryable() {
        let err = BackendError::transient("rate limited").with_status(429);
        assert!(err.is_transient());
        assert_eq!(err.status, Some(429));
    }

    #[test]
    fn permanent_is_not_retryable() {
        let err = BackendError::permanent("invalid model");
        assert!(!err.is_transient());
    }

    #[test]
    fn display_includes_status() {
        let err = BackendError::transient("upstream unavailable").with_status(503);
        let display = err.to_string();
        assert!(display.contains("503"));
        assert!(display.contains("upstream unavailable"));
    }

    #[test]
    fn user_detail_formats_status_on_own_line() {
        let err = BackendError::permanent("API error").with_status(429);
        assert_eq!(err.user_detail(), "API error\n\nStatus: 429");

        let bare = BackendError::permanent("API error");
        assert_eq!(bare.user_detail(), "API error");
    }
}
