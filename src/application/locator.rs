//! Discovery of message databases on the device.
//!
//! Each account gets a directory named by a 32 hex character hash under the
//! app's `MicroMsg` directory; those holding the database are candidates.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::config::AppConfig;
use crate::domain::{CandidatePath, Result};
use crate::infrastructure::{DeviceTransport, ShellExecutor};

#[allow(clippy::unwrap_used)]
static USER_DIRECTORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[0-9A-Fa-f]{32}$").unwrap());

/// Whether a directory entry has the shape of a per-user directory.
#[must_use]
pub fn is_user_directory_name(name: &str) -> bool {
    USER_DIRECTORY.is_match(name)
}

/// Finds candidate databases using root listings.
pub struct DatabaseLocator<'a, T> {
    shell: &'a ShellExecutor<T>,
    config: &'a AppConfig,
}

impl<'a, T: DeviceTransport> DatabaseLocator<'a, T> {
    #[must_use]
    pub const fn new(shell: &'a ShellExecutor<T>, config: &'a AppConfig) -> Self {
        Self { shell, config }
    }

    /// Lists every user directory that contains the database.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    /// Returns error if the data directory cannot be listed, or a probe
    /// fails for any reason other than the file being absent.
    pub fn find_candidate_databases(&self) -> Result<Vec<CandidatePath>> {
        let data_dir = self.config.app.data_dir.trim_end_matches('/');
        let listing = self.shell.execute_as_root(&format!("ls {data_dir}"))?;

        let user_dirs: Vec<&str> = listing
            .output_lines
            .iter()
            .flat_map(|line| line.split_whitespace())
            .filter(|entry| is_user_directory_name(entry))
            .collect();

        tracing::debug!(count = user_dirs.len(), "User directories found");

        let mut found = Vec::new();
        for user_dir in user_dirs {
            let db_path = self.config.database_path_in(user_dir);

            match self.shell.execute_as_root(&format!("ls {db_path}")) {
                Ok(_) => {
                    tracing::info!(path = %db_path, "Found candidate database");
                    found.push(CandidatePath::new(db_path));
                }
                Err(e) if e.is_remote_execution() => {
                    tracing::debug!(path = %db_path, "No database in user directory");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(found)
    }
}
