//! Application layer - use cases and orchestration.
//!
//! Discovery, staging, transfers and transcoding, built on the device
//! shell executor and the SQLCipher handle.

pub mod formatter;
pub mod locator;
pub mod reporter;
pub mod staging;
pub mod transcoder;
pub mod transfer;
pub mod uin;

pub use formatter::{format_candidates_json, pull_hint, OutputFormat};
pub use locator::DatabaseLocator;
pub use reporter::{ConsoleReporter, Reporter};
pub use transcoder::{derive_key, Transcoder};
pub use transfer::TransferService;
pub use uin::read_default_uin;
