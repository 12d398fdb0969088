//! Domain layer - core types and errors.
//!
//! Pure models, configuration and the error taxonomy, with no device or
//! database I/O.

pub mod config;
pub mod error;
pub mod models;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use models::{
    CandidatePath, DerivedKey, RemoteCommandResult, StagingDirectory, TransferSummary,
    TransportReply,
};
