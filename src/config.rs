//! Fixed locations and timings

use std::path::PathBuf;
use std::time::Duration;

/// Directory under the user's config dir that holds the store
pub const APP_DIR_NAME: &str = "appstore-switcher";

pub const STORE_FILE_NAME: &str = "storage.json";

/// Default location of the durable store, `<config_dir>/appstore-switcher/storage.json`
///
/// Returns `None` on platforms without a config directory.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(STORE_FILE_NAME))
}

/// Delays used by the surface controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long "Saved." stays visible
    pub save_status_clear: Duration,
    /// How long a transient overlay status stays visible
    pub overlay_status_clear: Duration,
    /// How long to wait for the page to answer a switch-region message
    pub message_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            save_status_clear: Duration::from_millis(1500),
            overlay_status_clear: Duration::from_millis(2000),
            message_timeout: Duration::from_millis(1000),
        }
    }
}

impl Timings {
    /// Same timings with every delay set to `delay`, handy for tests
    pub fn uniform(delay: Duration) -> Self {
        Self {
            save_status_clear: delay,
            overlay_status_clear: delay,
            message_timeout: delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_path_layout() {
        if let Some(path) = default_store_path() {
            assert!(path.ends_with("appstore-switcher/storage.json"));
        }
    }
}
