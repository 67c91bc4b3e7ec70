use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{default_users, User};

pub const SETTINGS_FILE: &str = "settings.json";
pub const USER_ENV: &str = "MURMUR_USER";

/// Start-up settings. Every field falls back to its default when the file
/// leaves it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub current_user: String,
    pub send_latency_ms: u64,
    pub error_display_secs: u64,
    /// Terminal width (columns) below which contacts become an overlay.
    pub narrow_breakpoint: u16,
    pub users: Vec<User>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            current_user: "User".to_string(),
            send_latency_ms: 500,
            error_display_secs: 6,
            narrow_breakpoint: 80,
            users: default_users(),
        }
    }
}

impl Settings {
    pub fn send_latency(&self) -> Duration {
        Duration::from_millis(self.send_latency_ms)
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("murmur");
    Ok(config_dir)
}

pub fn default_settings_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(SETTINGS_FILE))
}

/// Reads settings from `path`, or from the default location when `None`.
/// A missing file is not an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_settings_path()?,
    };

    if !path.exists() {
        info!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&contents)
        .with_context(|| format!("Malformed settings file {}", path.display()))?;
    info!("Loaded settings from {} ({} contacts)", path.display(), settings.users.len());

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.send_latency(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"current_user": "Ada", "users": [{{"id": 7, "name": "Eve", "status": "offline"}}]}}"#
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.current_user, "Ada");
        assert_eq!(settings.users, vec![User::new(7, "Eve", UserStatus::Offline)]);
        assert_eq!(settings.send_latency_ms, 500);
        assert_eq!(settings.error_display_secs, 6);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(load_settings(Some(file.path())).is_err());
    }
}
