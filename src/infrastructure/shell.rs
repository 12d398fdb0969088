//! Remote command execution with exit-status recovery.
//!
//! The transport only returns text, so every command is sent as
//! `<command>; echo $?`. The last line of the reply is popped and parsed as
//! the command's exit status; everything before it is the command output.

use crate::domain::{AppError, RemoteCommandResult, Result};

use super::transport::DeviceTransport;

/// Suffix that makes the remote shell print the exit status last.
const STATUS_PROBE: &str = "; echo $?";

/// Runs commands on the device, as the shell user or as root.
pub struct ShellExecutor<T> {
    transport: T,
}

impl<T: DeviceTransport> ShellExecutor<T> {
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    #[cfg(test)]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs a command as the unprivileged shell user.
    ///
    /// # Errors
    /// `Transport` if the reply never arrived or carries no status line;
    /// `RemoteExecution` if the command exited non-zero.
    pub fn execute(&self, command: &str) -> Result<RemoteCommandResult> {
        let reply = self.transport.shell(&format!("{command}{STATUS_PROBE}"))?;

        if !reply.succeeded() {
            return Err(AppError::transport(format!(
                "Shell command `{command}` was not delivered (status {}): {}",
                reply.status,
                reply.output.trim()
            )));
        }

        let (output_lines, exit_code) = split_status_line(&reply.output).ok_or_else(|| {
            AppError::transport(format!(
                "Reply to `{command}` did not end with an exit status"
            ))
        })?;

        tracing::debug!(command, exit_code, lines = output_lines.len(), "Remote command finished");

        if exit_code != 0 {
            return Err(AppError::RemoteExecution {
                command: command.to_string(),
                exit_code,
                output: output_lines,
            });
        }

        Ok(RemoteCommandResult {
            transport_succeeded: true,
            remote_exit_code: exit_code,
            output_lines,
        })
    }

    /// Runs a command through `su -c`.
    ///
    /// # Errors
    /// Same as [`Self::execute`].
    pub fn execute_as_root(&self, command: &str) -> Result<RemoteCommandResult> {
        self.execute(&su_wrap(command))
    }

    /// Copies a device file to the host.
    ///
    /// # Errors
    /// Returns a transport error if the pull did not complete.
    pub fn pull_file(&self, device_path: &str, host_path: &str) -> Result<()> {
        let reply = self.transport.pull(device_path, host_path)?;
        if !reply.succeeded() {
            return Err(AppError::transport(format!(
                "Pulling {device_path} exited with {}: {}",
                reply.status,
                reply.output.trim()
            )));
        }
        Ok(())
    }

    /// Copies a host file to the device.
    ///
    /// # Errors
    /// Returns a transport error if the push did not complete.
    pub fn push_file(&self, host_path: &str, device_path: &str) -> Result<()> {
        let reply = self.transport.push(host_path, device_path)?;
        if !reply.succeeded() {
            return Err(AppError::transport(format!(
                "Pushing {host_path} exited with {}: {}",
                reply.status,
                reply.output.trim()
            )));
        }
        Ok(())
    }

    /// Blocks until a device is attached.
    ///
    /// # Errors
    /// Returns a transport error if waiting failed.
    pub fn wait_for_device(&self) -> Result<()> {
        self.transport.wait_for_device()
    }
}

/// Pops and parses the trailing status line.
///
/// Returns `None` when the reply is empty or the last line is not an integer.
fn split_status_line(output: &str) -> Option<(Vec<String>, i32)> {
    let mut lines: Vec<String> = output.trim_end().lines().map(str::to_string).collect();
    let status = lines.pop()?.trim().parse().ok()?;
    Some((lines, status))
}

/// Wraps a command for `su -c "..."`, escaping what the outer shell would
/// otherwise interpret inside double quotes.
fn su_wrap(command: &str) -> String {
    let mut escaped = String::with_capacity(command.len());
    for c in command.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("su -c \"{escaped}\"")
}
