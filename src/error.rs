//! Error types for dirlock.
//!
//! Uses thiserror for derive macros. Every failure path of the acquire
//! protocol ends in exactly one of these values; cleanup failures are layered
//! on top of the primary cause instead of replacing it.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for dirlock operations.
///
/// Each variant maps to a specific exit code (see [`exit_codes`]).
#[derive(Error, Debug)]
pub enum LockError {
    /// User provided invalid arguments.
    #[error("{0}")]
    UserError(String),

    /// Configuration could not be read or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The lock directory or the initial request entry could not be created.
    #[error("{context}: {source}")]
    Setup {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The wait budget elapsed before the request reached the front of the queue.
    #[error("timed out ({max_wait:?}) waiting for turn to acquire lock")]
    Timeout { max_wait: Duration },

    /// The wait budget elapsed while one or two locks kept existing.
    #[error("timed out ({max_wait:?}) waiting for {existing} existing lock(s) to be released")]
    ContentionExhausted { max_wait: Duration, existing: usize },

    /// More lock entries exist than the protocol can ever produce.
    #[error("{count} locks found in '{}', expected at most 2", dir.display())]
    ConsistencyViolation { dir: PathBuf, count: usize },

    /// The lock entry could not be written.
    #[error("failed to create lock '{}': {source}", path.display())]
    LockCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// One of our own entries could not be removed.
    #[error("failed to remove '{}': {source} - please remove manually", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A primary failure followed by a failed removal of our own entry.
    #[error("{primary} (also failed to remove '{}': {source} - please remove manually)", path.display())]
    CleanupAfter {
        primary: Box<LockError>,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The caller's cancellation flag was raised.
    #[error("lock acquisition cancelled")]
    Cancelled,

    /// No lock with the given id exists.
    #[error("no lock with id '{id}' in '{}'", dir.display())]
    NotFound { id: String, dir: PathBuf },

    /// More than one lock carries the given id.
    #[error("found {count} locks with id '{id}', expected exactly one")]
    Ambiguous { id: String, count: usize },
}

impl LockError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// A compound error reports the cleanup failure, since the stale entry is
    /// what needs attention first.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::UserError(_) | LockError::Config(_) => exit_codes::USER_ERROR,
            LockError::NotFound { .. } | LockError::Ambiguous { .. } => exit_codes::USER_ERROR,
            LockError::Setup { .. } => exit_codes::SETUP_FAILURE,
            LockError::Timeout { .. } | LockError::ContentionExhausted { .. } => {
                exit_codes::TIMEOUT
            }
            LockError::Cancelled => exit_codes::TIMEOUT,
            LockError::ConsistencyViolation { .. } | LockError::LockCreate { .. } => {
                exit_codes::LOCK_FAILURE
            }
            LockError::Cleanup { .. } | LockError::CleanupAfter { .. } => {
                exit_codes::CLEANUP_FAILURE
            }
        }
    }

    /// Whether the wait budget ran out (in either phase).
    pub fn is_timeout(&self) -> bool {
        match self {
            LockError::Timeout { .. } | LockError::ContentionExhausted { .. } => true,
            LockError::CleanupAfter { primary, .. } => primary.is_timeout(),
            _ => false,
        }
    }

    /// Whether a stale entry was left behind in the lock directory.
    pub fn needs_manual_cleanup(&self) -> bool {
        matches!(
            self,
            LockError::Cleanup { .. } | LockError::CleanupAfter { .. }
        )
    }

    /// Layer a failed removal of `path` on top of this error.
    pub fn with_cleanup_failure(self, path: PathBuf, source: io::Error) -> Self {
        LockError::CleanupAfter {
            primary: Box::new(self),
            path,
            source,
        }
    }
}

/// Result type alias for dirlock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "denied")
    }

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = LockError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn setup_error_has_correct_exit_code() {
        let err = LockError::Setup {
            context: "unable to create lock dir '/x'".to_string(),
            source: io_err(),
        };
        assert_eq!(err.exit_code(), exit_codes::SETUP_FAILURE);
        assert_eq!(err.to_string(), "unable to create lock dir '/x': denied");
    }

    #[test]
    fn timeouts_share_exit_code() {
        let queued = LockError::Timeout {
            max_wait: Duration::from_secs(5),
        };
        let contended = LockError::ContentionExhausted {
            max_wait: Duration::from_secs(5),
            existing: 1,
        };
        assert_eq!(queued.exit_code(), exit_codes::TIMEOUT);
        assert_eq!(contended.exit_code(), exit_codes::TIMEOUT);
        assert!(queued.is_timeout());
        assert!(contended.is_timeout());
        assert!(queued.to_string().contains("5s"));
    }

    #[test]
    fn consistency_violation_is_lock_failure() {
        let err = LockError::ConsistencyViolation {
            dir: PathBuf::from("/locks"),
            count: 3,
        };
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
        assert!(!err.is_timeout());
        assert_eq!(
            err.to_string(),
            "3 locks found in '/locks', expected at most 2"
        );
    }

    #[test]
    fn compound_error_reports_both_causes() {
        let err = LockError::Timeout {
            max_wait: Duration::from_secs(2),
        }
        .with_cleanup_failure(PathBuf::from("/locks/a.request"), io_err());

        let msg = err.to_string();
        assert!(msg.starts_with("timed out (2s)"));
        assert!(msg.contains("/locks/a.request"));
        assert!(msg.contains("please remove manually"));
        assert!(err.is_timeout());
        assert!(err.needs_manual_cleanup());
        assert_eq!(err.exit_code(), exit_codes::CLEANUP_FAILURE);
    }

    #[test]
    fn not_found_message_names_id() {
        let err = LockError::NotFound {
            id: "abc".to_string(),
            dir: PathBuf::from("/locks"),
        };
        assert_eq!(err.to_string(), "no lock with id 'abc' in '/locks'");
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }
}
