use std::path::PathBuf;
use tracing::{debug, warn};

use crate::types::ClientError;

/// Get the path to the config.json file
/// Looks for config.json in the directory holding the executable
pub(super) fn get_config_path() -> Result<PathBuf, ClientError> {
    if let Ok(exe_path) = std::env::current_exe() {
        debug!(path = %exe_path.display(), "Executable path detected");

        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.json");
            debug!(path = %config_path.display(), "Looking for config");
            return Ok(config_path);
        }
    }

    // Fallback: look in current directory
    warn!("Using fallback: looking for config.json in current directory");
    Ok(PathBuf::from("config.json"))
}
