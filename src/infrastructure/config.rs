//! Configuration file management.
//!
//! Handles loading TOML configuration files and writing the commented
//! default one.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# WeChat DB Handler Configuration
# Auto-generated - edit as needed

[device]
# Path to adb (defaults to the first `adb` on PATH)
# adb_path = "/opt/android-sdk/platform-tools/adb"

# Serial of the device to use when more than one is attached
# serial = "emulator-5554"

# Block until a device is attached before running device commands
wait_for_device = true

[app]
# Directory holding the per-user (32 hex character) directories
data_dir = "/data/data/com.tencent.mm/MicroMsg"

# Database file inside each user directory
database_name = "EnMicroMsg.db"

# Shared preferences holding the default UIN
prefs_path = "/data/data/com.tencent.mm/shared_prefs/system_config_prefs.xml"
uin_attribute = "default_uin"

[staging]
# Directories writable without root, tried in order
candidates = ["/sdcard"]

# Probe file used to check writability
marker_name = ".wechat-db-handler-probe"

# Name of the staged copy of the database
working_name = "EnMicroMsg.db"

[cipher]
# Emulate the defaults of an older SQLCipher major version (1-4)
# compatibility = 1
"#;

/// Load configuration from `path`, or the default location when `None`.
///
/// A missing file yields the default configuration.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        if path.is_some() {
            return Err(AppError::Config {
                message: format!("Config file not found: {}", config_path.display()),
            });
        }
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io_at("Failed to read config file", path, e))?;

    let config = toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file {}: {e}", path.display()),
    })?;

    tracing::debug!(path = %path.display(), "Loaded configuration");

    Ok(config)
}

/// Create the default configuration file if it doesn't exist.
///
/// Returns the file path and whether it was created.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: Option<&Path>) -> Result<(PathBuf, bool)> {
    let config_path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);

    if config_path.exists() {
        return Ok((config_path, false));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io_at("Failed to create config directory", parent, e))?;
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io_at("Failed to create default config", &config_path, e))?;

    tracing::info!(path = %config_path.display(), "Created default configuration");

    Ok((config_path, true))
}
