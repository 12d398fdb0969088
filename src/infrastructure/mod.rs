//! Infrastructure layer - external adapters (device transport, SQLCipher, files).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod cipher_db;
pub mod config;
pub mod prefs;
pub mod shell;
pub mod transport;

pub use cipher_db::CipherDatabase;
pub use config::{ensure_config_exists, load_config};
pub use prefs::read_preference;
pub use shell::ShellExecutor;
pub use transport::{AdbTransport, DeviceTransport};
