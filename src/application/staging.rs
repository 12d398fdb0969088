//! Resolution of an unprivileged-writable staging directory.
//!
//! `adb push`/`adb pull` run as the shell user, so files move through a
//! directory that user can write; root only copies into or out of it.

use crate::domain::config::StagingConfig;
use crate::domain::{AppError, Result, StagingDirectory};
use crate::infrastructure::{DeviceTransport, ShellExecutor};

/// Probes staging candidates in order.
pub struct StagingResolver<'a, T> {
    shell: &'a ShellExecutor<T>,
    config: &'a StagingConfig,
}

impl<'a, T: DeviceTransport> StagingResolver<'a, T> {
    #[must_use]
    pub const fn new(shell: &'a ShellExecutor<T>, config: &'a StagingConfig) -> Self {
        Self { shell, config }
    }

    /// Returns the first candidate where a marker file can be created and
    /// removed without root.
    ///
    /// # Errors
    /// `NoWritableLocation` if no candidate is writable; transport errors
    /// propagate.
    pub fn resolve_staging_directory(&self) -> Result<StagingDirectory> {
        for candidate in &self.config.candidates {
            let dir = StagingDirectory::new(candidate.as_str());
            let marker = dir.file(&self.config.marker_name);

            match self.shell.execute(&format!("touch {marker} && rm {marker}")) {
                Ok(_) => {
                    tracing::debug!(dir = dir.as_str(), "Staging directory is writable");
                    return Ok(dir);
                }
                Err(e) if e.is_remote_execution() => {
                    tracing::debug!(dir = %dir, "Staging directory is not writable");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::NoWritableLocation {
            tried: self.config.candidates.clone(),
        })
    }
}
