//! Domain models for device commands, device paths and cipher keys.

use serde::Serialize;

/// Length of the truncated key the messaging app derives for its database.
pub const DERIVED_KEY_LEN: usize = 7;

/// Raw reply from the transport for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    /// Status of the transport call itself (not of the remote command).
    pub status: i32,
    /// Combined output text.
    pub output: String,
}

impl TransportReply {
    /// Create a reply.
    pub fn new(status: i32, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
        }
    }

    /// Whether the transport delivered the call.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.status == 0
    }
}

/// Outcome of a command that ran on the device.
///
/// `output_lines` never contains the status line appended for exit-code
/// extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommandResult {
    pub transport_succeeded: bool,
    pub remote_exit_code: i32,
    pub output_lines: Vec<String>,
}

/// Absolute path of a database file on the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CandidatePath(String);

impl CandidatePath {
    /// Wrap a device path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CandidatePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device directory that was writable without root when probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingDirectory(String);

impl StagingDirectory {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Device path of a file inside this directory.
    #[must_use]
    pub fn file(&self, name: &str) -> String {
        format!("{}/{}", self.0.trim_end_matches('/'), name)
    }
}

impl std::fmt::Display for StagingDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Database key: exactly seven lowercase hex characters.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey(String);

impl DerivedKey {
    /// Wraps the leading characters of a lowercase hex digest.
    pub(crate) fn from_digest_prefix(prefix: &str) -> Self {
        debug_assert_eq!(prefix.len(), DERIVED_KEY_LEN);
        Self(prefix.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Keys are printed on purpose by the CLI, but never through `{:?}`.
impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Result of a pull or push whose main steps succeeded.
#[derive(Debug, Clone)]
pub struct TransferSummary {
    /// Database path on the device.
    pub device_path: CandidatePath,
    /// File on the host.
    pub host_path: String,
    /// Staged file that was used as the intermediate hop.
    pub staged_path: String,
    /// Why removing the staged file failed, if it did.
    pub cleanup_error: Option<String>,
}
