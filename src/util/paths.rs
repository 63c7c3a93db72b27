//! Config and log locations following the XDG base directory layout.

use std::env;
use std::path::{Path, PathBuf};

/// Application directory name under the XDG bases.
const APP_DIR: &str = "hierscope";

/// Determine the settings file path, searching in priority order.
///
/// Prefers `$XDG_CONFIG_HOME/hierscope/settings.conf`, then
/// `$HOME/.config/hierscope/settings.conf`. Returns the first that exists.
pub fn resolve_settings_config_path() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME")
        && !xdg.trim().is_empty()
    {
        candidates.push(Path::new(&xdg).join(APP_DIR).join("settings.conf"));
    }
    if let Ok(home) = env::var("HOME") {
        candidates.push(
            Path::new(&home)
                .join(".config")
                .join(APP_DIR)
                .join("settings.conf"),
        );
    }
    candidates.into_iter().find(|p| p.is_file())
}

/// Resolve an XDG base directory from environment or default to `$HOME` + segments.
///
/// Inputs:
/// - `var`: Environment variable to check (e.g., `XDG_STATE_HOME`).
/// - `home_default`: Fallback path segments relative to `$HOME` if `var` is unset/empty.
///
/// Output: Resolved base directory path.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Logs directory: `$XDG_STATE_HOME/hierscope/logs` (ensured to exist).
pub fn logs_dir() -> PathBuf {
    let dir = xdg_base_dir("XDG_STATE_HOME", &[".local", "state"])
        .join(APP_DIR)
        .join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}
