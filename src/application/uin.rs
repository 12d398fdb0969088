//! Lookup of the account's default UIN on the device.

use crate::domain::config::AppPaths;
use crate::domain::Result;
use crate::infrastructure::{read_preference, DeviceTransport, ShellExecutor};

/// Reads the default UIN from the app's shared preferences via root.
///
/// # Errors
/// Returns error if the file cannot be read or holds no single UIN entry.
pub fn read_default_uin<T: DeviceTransport>(shell: &ShellExecutor<T>, paths: &AppPaths) -> Result<String> {
    let prefs = shell.execute_as_root(&format!("cat {}", paths.prefs_path))?;
    let uin = read_preference(&prefs.output_lines.join("\n"), &paths.uin_attribute)?;

    tracing::info!(uin = %uin, "Read default UIN");
    Ok(uin)
}
