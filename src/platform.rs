// Blogshelf platform paths
//
// Linux:   $XDG_CONFIG_HOME/blogshelf, $XDG_DATA_HOME/blogshelf (XDG defaults otherwise)
// macOS:   ~/Library/Application Support/Blogshelf
// Windows: %APPDATA%/Blogshelf

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
const APP_DIR: &str = "blogshelf";
#[cfg(not(target_os = "linux"))]
const APP_DIR: &str = "Blogshelf";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

#[cfg(target_os = "linux")]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => fallback.iter().fold(home_dir(), |path, part| path.join(part)),
    }
}

/// Directory holding `settings.json`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"]).join(APP_DIR)
    }
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(env::var("APPDATA").unwrap_or_else(|_| home_dir().to_string_lossy().to_string()))
            .join(APP_DIR)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        home_dir().join(".blogshelf")
    }
}

/// Directory holding the SQLite key-value store.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"]).join(APP_DIR)
    }
    #[cfg(not(target_os = "linux"))]
    {
        get_config_dir()
    }
}
