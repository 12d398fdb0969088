//! Configuration model.
//!
//! Where things live on the device, how to reach it, and which SQLCipher
//! settings to use when transcoding.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How to reach the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Explicit path to the `adb` binary (looked up on `PATH` otherwise).
    #[serde(default)]
    pub adb_path: Option<PathBuf>,

    /// Device serial, passed as `adb -s`.
    #[serde(default)]
    pub serial: Option<String>,

    /// Block until a device is attached before touching it.
    #[serde(default = "default_wait_for_device")]
    pub wait_for_device: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: None,
            serial: None,
            wait_for_device: default_wait_for_device(),
        }
    }
}

const fn default_wait_for_device() -> bool {
    true
}

/// Application layout on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPaths {
    /// Directory holding the per-user data directories.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Database file name inside a user directory.
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Shared preference file holding the default UIN.
    #[serde(default = "default_prefs_path")]
    pub prefs_path: String,

    /// `name` attribute of the preference entry holding the UIN.
    #[serde(default = "default_uin_attribute")]
    pub uin_attribute: String,
}

impl Default for AppPaths {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_name: default_database_name(),
            prefs_path: default_prefs_path(),
            uin_attribute: default_uin_attribute(),
        }
    }
}

fn default_data_dir() -> String {
    "/data/data/com.tencent.mm/MicroMsg".into()
}

fn default_database_name() -> String {
    "EnMicroMsg.db".into()
}

fn default_prefs_path() -> String {
    "/data/data/com.tencent.mm/shared_prefs/system_config_prefs.xml".into()
}

fn default_uin_attribute() -> String {
    "default_uin".into()
}

/// Unprivileged scratch locations used as the transfer hop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Directories tried in order.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// File created and removed to prove a directory is writable.
    #[serde(default = "default_marker_name")]
    pub marker_name: String,

    /// Name of the staged database copy.
    #[serde(default = "default_working_name")]
    pub working_name: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            marker_name: default_marker_name(),
            working_name: default_working_name(),
        }
    }
}

fn default_candidates() -> Vec<String> {
    vec!["/sdcard".into()]
}

fn default_marker_name() -> String {
    ".wechat-db-handler-probe".into()
}

fn default_working_name() -> String {
    "EnMicroMsg.db".into()
}

/// SQLCipher settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CipherConfig {
    /// SQLCipher major version whose defaults should be emulated.
    #[serde(default)]
    pub compatibility: Option<u8>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub app: AppPaths,

    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub cipher: CipherConfig,
}

impl AppConfig {
    /// Get the default configuration directory.
    #[must_use]
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wechat-db-handler")
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Device path of the database inside a user directory.
    #[must_use]
    pub fn database_path_in(&self, user_dir: &str) -> String {
        format!(
            "{}/{}/{}",
            self.app.data_dir.trim_end_matches('/'),
            user_dir,
            self.app.database_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.staging.candidates, vec!["/sdcard".to_string()]);
        assert_eq!(config.app.database_name, "EnMicroMsg.db");
        assert!(config.device.wait_for_device);
        assert!(config.cipher.compatibility.is_none());
    }

    #[test]
    fn test_database_path_in() {
        let config = AppConfig::default();
        assert_eq!(
            config.database_path_in("0123456789abcdef0123456789abcdef"),
            "/data/data/com.tencent.mm/MicroMsg/0123456789abcdef0123456789abcdef/EnMicroMsg.db"
        );
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [device]
            serial = "emulator-5554"

            [staging]
            candidates = ["/data/local/tmp", "/sdcard"]
            "#,
        )
        .unwrap();

        assert_eq!(config.device.serial.as_deref(), Some("emulator-5554"));
        assert!(config.device.wait_for_device);
        assert_eq!(config.staging.candidates.len(), 2);
        assert_eq!(config.staging.working_name, "EnMicroMsg.db");
        assert_eq!(config.app.uin_attribute, "default_uin");
    }
}
