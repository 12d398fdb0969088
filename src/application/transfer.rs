//! Moving the database between the device and the host.
//!
//! Both directions hop through a staging directory: root copies the file
//! between its protected location and the staging directory, the transport
//! moves it between the staging directory and the host. The staged copy is
//! removed afterwards no matter how the main steps went.

use crate::domain::config::AppConfig;
use crate::domain::{AppError, CandidatePath, Result, TransferSummary};
use crate::infrastructure::{DeviceTransport, ShellExecutor};

use super::locator::DatabaseLocator;
use super::reporter::Reporter;
use super::staging::StagingResolver;

/// Staged file on the device, removed exactly once.
///
/// [`StagedFile::remove`] removes it and reports the outcome; if the guard
/// is dropped without that, removal is attempted on drop and only logged.
struct StagedFile<'a, T: DeviceTransport> {
    shell: &'a ShellExecutor<T>,
    path: String,
    removed: bool,
}

impl<'a, T: DeviceTransport> StagedFile<'a, T> {
    const fn new(shell: &'a ShellExecutor<T>, path: String) -> Self {
        Self {
            shell,
            path,
            removed: false,
        }
    }

    fn remove(mut self) -> Result<()> {
        self.removed = true;
        self.remove_now()
    }

    fn remove_now(&self) -> Result<()> {
        self.shell
            .execute(&format!("rm -f {}", self.path))
            .map(|_| ())
    }
}

impl<T: DeviceTransport> Drop for StagedFile<'_, T> {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = self.remove_now() {
                tracing::warn!(path = %self.path, error = %e, "Failed to remove staged file");
            }
        }
    }
}

/// Pull and push operations.
pub struct TransferService<'a, T> {
    shell: &'a ShellExecutor<T>,
    config: &'a AppConfig,
    reporter: &'a dyn Reporter,
}

impl<'a, T: DeviceTransport> TransferService<'a, T> {
    #[must_use]
    pub const fn new(
        shell: &'a ShellExecutor<T>,
        config: &'a AppConfig,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            shell,
            config,
            reporter,
        }
    }

    /// Copies a device database to `destination` on the host.
    ///
    /// Without an explicit `source` the single candidate found on the device
    /// is used.
    ///
    /// # Errors
    /// `NoCandidateFound`/`AmbiguousCandidate` when auto-selection fails,
    /// `NoWritableLocation` when there is nowhere to stage, and
    /// `OperationFailed` when copying or pulling fails.
    pub fn pull(&self, source: Option<CandidatePath>, destination: &str) -> Result<TransferSummary> {
        let source = match source {
            Some(path) => path,
            None => self.select_single_candidate()?,
        };

        let staging = StagingResolver::new(self.shell, &self.config.staging)
            .resolve_staging_directory()?;
        let staged_path = staging.file(&self.config.staging.working_name);
        let staged = StagedFile::new(self.shell, staged_path.clone());

        let outcome = self.copy_then_pull(&source, &staged_path, destination);
        let cleanup_error = self.clean_up(staged);

        outcome.map_err(|e| AppError::operation_failed("Pull", e))?;

        tracing::info!(source = %source, destination, "Pull completed");

        Ok(TransferSummary {
            device_path: source,
            host_path: destination.to_string(),
            staged_path,
            cleanup_error,
        })
    }

    /// Copies a host file over the database at `destination` on the device.
    ///
    /// # Errors
    /// `NoWritableLocation` when there is nowhere to stage, and
    /// `OperationFailed` when pushing or copying fails.
    pub fn push(&self, source: &str, destination: CandidatePath) -> Result<TransferSummary> {
        let staging = StagingResolver::new(self.shell, &self.config.staging)
            .resolve_staging_directory()?;
        let staged_path = staging.file(&self.config.staging.working_name);
        let staged = StagedFile::new(self.shell, staged_path.clone());

        let outcome = self.push_then_copy(source, &staged_path, &destination);
        let cleanup_error = self.clean_up(staged);

        outcome.map_err(|e| AppError::operation_failed("Push", e))?;

        tracing::info!(source, destination = %destination, "Push completed");

        Ok(TransferSummary {
            device_path: destination,
            host_path: source.to_string(),
            staged_path,
            cleanup_error,
        })
    }

    fn select_single_candidate(&self) -> Result<CandidatePath> {
        let mut candidates =
            DatabaseLocator::new(self.shell, self.config).find_candidate_databases()?;

        match candidates.len() {
            0 => Err(AppError::NoCandidateFound),
            1 => Ok(candidates.remove(0)),
            _ => Err(AppError::AmbiguousCandidate {
                candidates: candidates.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    fn copy_then_pull(&self, source: &CandidatePath, staged: &str, destination: &str) -> Result<()> {
        self.reporter.step("Copying the DB to a user directory...");
        self.shell.execute_as_root(&format!("cp {source} {staged}"))?;

        self.reporter.step("Pulling the DB to your computer...");
        self.shell.pull_file(staged, destination)
    }

    fn push_then_copy(&self, source: &str, staged: &str, destination: &CandidatePath) -> Result<()> {
        self.reporter.step("Pushing the DB to the device...");
        self.shell.push_file(source, staged)?;

        self.reporter.step("Copying the DB to its final home...");
        self.shell
            .execute_as_root(&format!("cp {staged} {destination}"))
            .map(|_| ())
    }

    fn clean_up(&self, staged: StagedFile<'_, T>) -> Option<String> {
        self.reporter.step("Cleaning up...");
        let path = staged.path.clone();

        staged.remove().err().map(|e| {
            tracing::warn!(path = %path, error = %e, "Failed to remove staged file");
            e.to_string()
        })
    }
}
