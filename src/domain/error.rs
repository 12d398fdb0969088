//! Domain-level error types for wechat-db-handler.
//!
//! All errors are typed with `thiserror`. Transport failures and remote
//! command failures are separate variants because callers recover from
//! them differently: probing code treats a remote failure as "not there".

use std::error::Error as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The channel to the device could not deliver the command or its output.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The command ran on the device and exited with a non-zero status.
    #[error(
        "Command `{command}` failed on the device with exit code {exit_code}{}",
        first_line(output)
    )]
    RemoteExecution {
        command: String,
        exit_code: i32,
        output: Vec<String>,
    },

    /// No user directory on the device holds the message database.
    #[error("Could not find any candidate databases")]
    NoCandidateFound,

    /// More than one candidate database and no explicit path was given.
    #[error("More than one candidate database found: {}", candidates.join(", "))]
    AmbiguousCandidate { candidates: Vec<String> },

    /// None of the staging candidates is writable without root.
    #[error("No writable staging directory on the device (tried: {})", tried.join(", "))]
    NoWritableLocation { tried: Vec<String> },

    /// The cipher attach/export/detach pipeline failed.
    #[error("Transcode error: {message}")]
    Transcode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A pull or push step failed; cleanup has still been attempted.
    #[error("{operation} failed")]
    OperationFailed {
        operation: &'static str,
        #[source]
        source: Box<AppError>,
    },

    /// The preference file could not be read or did not hold the UIN.
    #[error("Preferences error: {message}")]
    Preferences { message: String },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a transcode error from a rusqlite error with context.
    pub fn transcode(message: impl Into<String>, err: rusqlite::Error) -> Self {
        Self::Transcode {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a transcode error for a host file the pipeline could not touch.
    pub fn transcode_io(message: impl Into<String>, path: &Path, err: std::io::Error) -> Self {
        Self::Transcode {
            message: format!("{} ({})", message.into(), path.display()),
            source: Some(Box::new(err)),
        }
    }

    /// Create an IO error bound to a host path.
    pub fn io_at(message: impl Into<String>, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} ({})", message.into(), path.into().display()),
            source: Some(err),
        }
    }

    /// Wrap a failed pull/push step.
    pub fn operation_failed(operation: &'static str, err: Self) -> Self {
        Self::OperationFailed {
            operation,
            source: Box::new(err),
        }
    }

    /// Whether the device ran the command and reported failure.
    #[must_use]
    pub const fn is_remote_execution(&self) -> bool {
        matches!(self, Self::RemoteExecution { .. })
    }

    /// Whether the transport itself failed.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether a transport failure is anywhere in this error's cause chain.
    #[must_use]
    pub fn caused_by_transport(&self) -> bool {
        if self.is_transport() {
            return true;
        }
        let mut cause = self.source();
        while let Some(err) = cause {
            if err.downcast_ref::<Self>().is_some_and(Self::is_transport) {
                return true;
            }
            cause = err.source();
        }
        false
    }
}

fn first_line(output: &[String]) -> String {
    output
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(|line| format!(": {line}"))
        .unwrap_or_default()
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let transport = AppError::transport("device offline");
        let remote = AppError::RemoteExecution {
            command: "ls /nope".into(),
            exit_code: 1,
            output: Vec::new(),
        };

        assert!(transport.is_transport());
        assert!(!transport.is_remote_execution());
        assert!(remote.is_remote_execution());
        assert!(!remote.is_transport());
    }

    #[test]
    fn test_operation_failed_keeps_cause() {
        let err = AppError::operation_failed("Pull", AppError::transport("adb exited with 1"));
        assert_eq!(err.to_string(), "Pull failed");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("Transport error: adb exited with 1")
        );
        assert!(err.caused_by_transport());

        let AppError::OperationFailed { source, .. } = err else {
            panic!("expected OperationFailed");
        };
        assert!(source.is_transport());
    }

    #[test]
    fn test_transcode_context_and_cause_are_separate() {
        let cause = rusqlite::Error::InvalidQuery;
        let cause_text = cause.to_string();
        let err = AppError::transcode("`DETACH DATABASE x` failed on /tmp/a.db", cause);

        assert_eq!(
            err.to_string(),
            "Transcode error: `DETACH DATABASE x` failed on /tmp/a.db"
        );
        assert!(!err.to_string().contains(&cause_text));
        assert_eq!(err.source().map(ToString::to_string), Some(cause_text));
        assert!(!err.caused_by_transport());
    }

    #[test]
    fn test_remote_execution_shows_first_output_line() {
        let err = AppError::RemoteExecution {
            command: "ls /data/x".into(),
            exit_code: 1,
            output: vec![String::new(), "ls: /data/x: No such file or directory".into()],
        };
        assert_eq!(
            err.to_string(),
            "Command `ls /data/x` failed on the device with exit code 1: ls: /data/x: No such file or directory"
        );
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = AppError::AmbiguousCandidate {
            candidates: vec!["/a/EnMicroMsg.db".into(), "/b/EnMicroMsg.db".into()],
        };
        assert!(err.to_string().contains("/a/EnMicroMsg.db, /b/EnMicroMsg.db"));
    }
}
