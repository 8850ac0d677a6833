//! Outcome of a cancellable retry loop
//!
//! The plain loops return the operation's error untouched. Only
//! [`retry_notify_until`](super::retry_notify_until) needs to tell
//! "the operation failed" apart from "the caller cancelled", which is what
//! `RetryError` is for.

use std::error::Error;
use std::fmt;

/// Errors returned by a cancellable retry loop
///
/// Generic over `E`, the error type of the operation being retried.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The loop ended on an operation error: the backoff stopped or the
    /// attempt cap was reached
    Failed(E),

    /// The cancellation signal fired while waiting between attempts
    Cancelled {
        /// Number of attempts made before cancellation
        attempts: u32,
        /// The error from the attempt preceding the interrupted wait
        last_error: E,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Failed(source) => write!(f, "{}", source),
            RetryError::Cancelled {
                attempts,
                last_error,
            } => write!(
                f,
                "retry cancelled after {} attempts: {}",
                attempts, last_error
            ),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::Failed(source) => Some(source),
            RetryError::Cancelled { last_error, .. } => Some(last_error),
        }
    }
}

impl<E> RetryError<E> {
    /// Create a cancelled error
    pub fn cancelled(attempts: u32, last_error: E) -> Self {
        RetryError::Cancelled {
            attempts,
            last_error,
        }
    }

    /// Check if this error indicates cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// Number of attempts made, if known
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Cancelled { attempts, .. } => Some(*attempts),
            RetryError::Failed(_) => None,
        }
    }

    /// Get the operation error, consuming this error
    ///
    /// For a cancelled loop this is the error of the last attempt made.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Failed(source) => source,
            RetryError::Cancelled { last_error, .. } => last_error,
        }
    }

    /// Get a reference to the operation error
    pub fn inner(&self) -> &E {
        match self {
            RetryError::Failed(source) => source,
            RetryError::Cancelled { last_error, .. } => last_error,
        }
    }

    /// Map the error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::Failed(source) => RetryError::Failed(f(source)),
            RetryError::Cancelled {
                attempts,
                last_error,
            } => RetryError::Cancelled {
                attempts,
                last_error: f(last_error),
            },
        }
    }
}

impl<E> From<E> for RetryError<E> {
    fn from(source: E) -> Self {
        RetryError::Failed(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_failed_error() {
        let err: RetryError<io::Error> =
            io::Error::new(io::ErrorKind::TimedOut, "timeout").into();

        assert!(!err.is_cancelled());
        assert_eq!(err.attempts(), None);
        assert_eq!(err.to_string(), "timeout");
        assert_eq!(err.inner().kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_cancelled_error() {
        let err = RetryError::cancelled(2, io::Error::other("connection reset"));

        assert!(err.is_cancelled());
        assert_eq!(err.attempts(), Some(2));

        let display = err.to_string();
        assert!(display.contains("retry cancelled"));
        assert!(display.contains("2 attempts"));
        assert!(display.contains("connection reset"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_into_inner() {
        let err: RetryError<String> = RetryError::cancelled(3, "last".to_string());
        assert_eq!(err.into_inner(), "last");

        let err: RetryError<String> = RetryError::Failed("failed".to_string());
        assert_eq!(err.into_inner(), "failed");
    }

    #[test]
    fn test_map_err() {
        let err: RetryError<i32> = RetryError::cancelled(3, 42);

        let mapped = err.map_err(|n| format!("error code: {}", n));
        assert!(matches!(
            mapped,
            RetryError::Cancelled { attempts: 3, ref last_error } if last_error == "error code: 42"
        ));
    }
}
