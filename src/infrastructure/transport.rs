//! Device transport backed by the `adb` command-line tool.
//!
//! The transport only moves commands and files; it knows nothing about
//! remote exit codes. See [`crate::infrastructure::ShellExecutor`] for that.

use std::path::PathBuf;
use std::process::{Command, Output};

use crate::domain::config::DeviceConfig;
use crate::domain::{AppError, Result, TransportReply};

/// Channel used to issue shell commands and move files to/from the device.
pub trait DeviceTransport {
    /// Run a shell command and return the combined reply.
    ///
    /// # Errors
    /// Returns a transport error if the channel could not be used at all.
    fn shell(&self, command: &str) -> Result<TransportReply>;

    /// Copy a host file onto the device.
    fn push(&self, host_path: &str, device_path: &str) -> Result<TransportReply>;

    /// Copy a device file onto the host.
    fn pull(&self, device_path: &str, host_path: &str) -> Result<TransportReply>;

    /// Block until a device is attached.
    fn wait_for_device(&self) -> Result<()>;
}

/// `adb` process wrapper.
#[derive(Debug, Clone)]
pub struct AdbTransport {
    program: PathBuf,
    serial: Option<String>,
}

impl AdbTransport {
    /// Create a transport for a specific `adb` binary.
    #[must_use]
    pub const fn new(program: PathBuf, serial: Option<String>) -> Self {
        Self { program, serial }
    }

    /// Resolve the `adb` binary from configuration or `PATH`.
    ///
    /// # Errors
    /// Returns error if no `adb` binary can be found.
    pub fn from_config(config: &DeviceConfig) -> Result<Self> {
        let program = match &config.adb_path {
            Some(path) => path.clone(),
            None => which::which("adb").map_err(|e| AppError::Config {
                message: format!("Could not find `adb` on PATH ({e}); set device.adb_path"),
            })?,
        };

        tracing::debug!(adb = %program.display(), serial = ?config.serial, "Using adb");

        Ok(Self::new(program, config.serial.clone()))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(serial) = &self.serial {
            cmd.args(["-s", serial]);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<TransportReply> {
        tracing::trace!(?args, "adb");

        let output = self.command().args(args).output().map_err(|e| {
            AppError::transport(format!("Failed to run {}: {e}", self.program.display()))
        })?;

        Ok(reply_from_output(&output))
    }
}

/// Successful calls expose stdout only so that trailing diagnostics on
/// stderr cannot displace the status line. Failed calls expose both.
fn reply_from_output(output: &Output) -> TransportReply {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let status = output.status.code().unwrap_or(-1);

    if !stderr.trim().is_empty() {
        tracing::debug!(status, stderr = %stderr.trim(), "adb stderr");
    }

    if output.status.success() {
        TransportReply::new(status, stdout)
    } else {
        let combined = format!("{}\n{}", stderr.trim_end(), stdout.trim_end());
        TransportReply::new(status, combined.trim())
    }
}

impl DeviceTransport for AdbTransport {
    fn shell(&self, command: &str) -> Result<TransportReply> {
        self.run(&["shell", command])
    }

    fn push(&self, host_path: &str, device_path: &str) -> Result<TransportReply> {
        self.run(&["push", host_path, device_path])
    }

    fn pull(&self, device_path: &str, host_path: &str) -> Result<TransportReply> {
        self.run(&["pull", device_path, host_path])
    }

    fn wait_for_device(&self) -> Result<()> {
        let reply = self.run(&["wait-for-device"])?;
        if reply.succeeded() {
            Ok(())
        } else {
            Err(AppError::transport(format!(
                "wait-for-device exited with {}: {}",
                reply.status,
                reply.output.trim()
            )))
        }
    }
}
