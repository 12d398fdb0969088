//! Test doubles shared by the unit tests.

use std::cell::RefCell;

use crate::application::Reporter;
use crate::domain::{AppError, Result, TransportReply};
use crate::infrastructure::DeviceTransport;

/// One call made against [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Shell(String),
    Push(String, String),
    Pull(String, String),
    WaitForDevice,
}

/// Scripted reply for a shell command.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Command ran and printed `lines`, then exited with `code`.
    Exit { code: i32, lines: Vec<String> },
    /// Reply returned verbatim, status probe and all.
    Raw(TransportReply),
    /// The transport could not be used.
    Unreachable,
}

/// In-memory transport that replays scripted replies and records calls.
///
/// Rules match the command as the caller wrote it: the status probe suffix
/// and any `su -c "..."` wrapper are removed before comparison. Commands
/// with no rule succeed with no output.
#[derive(Debug, Default)]
pub struct FakeTransport {
    rules: Vec<(String, Scripted)>,
    push_status: i32,
    pull_status: i32,
    calls: RefCell<Vec<TransportCall>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command: &str, reply: Scripted) -> Self {
        self.rules.push((command.to_string(), reply));
        self
    }

    pub fn ok(self, command: &str, lines: &[&str]) -> Self {
        self.on(
            command,
            Scripted::Exit {
                code: 0,
                lines: lines.iter().map(|l| (*l).to_string()).collect(),
            },
        )
    }

    pub fn fail(self, command: &str, code: i32) -> Self {
        self.on(
            command,
            Scripted::Exit {
                code,
                lines: vec![format!("{command}: No such file or directory")],
            },
        )
    }

    pub fn failing_pull(mut self) -> Self {
        self.pull_status = 1;
        self
    }

    pub fn failing_push(mut self) -> Self {
        self.push_status = 1;
        self
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.borrow().clone()
    }

    /// Shell commands with the status probe and `su` wrapper removed.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Shell(raw) => Some(unwrap_command(raw)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        self.calls.borrow_mut().push(call);
    }
}

fn unwrap_command(raw: &str) -> String {
    let command = raw.strip_suffix("; echo $?").unwrap_or(raw);
    command
        .strip_prefix("su -c \"")
        .and_then(|c| c.strip_suffix('"'))
        .map_or_else(|| command.to_string(), |c| c.replace('\\', ""))
}

impl DeviceTransport for FakeTransport {
    fn shell(&self, command: &str) -> Result<TransportReply> {
        self.record(TransportCall::Shell(command.to_string()));
        let unwrapped = unwrap_command(command);

        let scripted = self
            .rules
            .iter()
            .find(|(pattern, _)| *pattern == unwrapped)
            .map(|(_, reply)| reply.clone());

        match scripted {
            Some(Scripted::Exit { code, lines }) => {
                let mut output = lines.join("\n");
                if !output.is_empty() {
                    output.push('\n');
                }
                Ok(TransportReply::new(0, format!("{output}{code}\n")))
            }
            Some(Scripted::Raw(reply)) => Ok(reply),
            Some(Scripted::Unreachable) => Err(AppError::transport("error: no devices/emulators found")),
            None => Ok(TransportReply::new(0, "0\n")),
        }
    }

    fn push(&self, host_path: &str, device_path: &str) -> Result<TransportReply> {
        self.record(TransportCall::Push(host_path.into(), device_path.into()));
        Ok(TransportReply::new(self.push_status, ""))
    }

    fn pull(&self, device_path: &str, host_path: &str) -> Result<TransportReply> {
        self.record(TransportCall::Pull(device_path.into(), host_path.into()));
        Ok(TransportReply::new(self.pull_status, ""))
    }

    fn wait_for_device(&self) -> Result<()> {
        self.record(TransportCall::WaitForDevice);
        Ok(())
    }
}

/// Reporter that keeps every message for assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub messages: RefCell<Vec<String>>,
}

impl Reporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.borrow_mut().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.messages.borrow_mut().push(format!("success: {message}"));
    }

    fn failure(&self, message: &str) {
        self.messages.borrow_mut().push(format!("failure: {message}"));
    }

    fn item(&self, message: &str) {
        self.messages.borrow_mut().push(format!("item: {message}"));
    }

    fn hint(&self, message: &str) {
        self.messages.borrow_mut().push(format!("hint: {message}"));
    }
}
