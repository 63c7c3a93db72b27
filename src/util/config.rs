//! Settings file parsing.
//!
//! Settings live in a plain `key = value` file (`settings.conf`). Lines
//! starting with `#`, `//` or `;` are comments, inline `#`/`//` comments are
//! stripped, keys are case-insensitive and accept `.`/`-` in place of `_`.
//! Unknown keys and unparsable values are ignored so a broken line never
//! prevents startup.

use std::fs;
use std::path::Path;

/// Default debounce window for filter input, in milliseconds.
pub const DEFAULT_FILTER_DEBOUNCE_MS: u64 = 250;

/// User-tunable settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Ruleset to open when none is given on the command line.
    pub default_ruleset: Option<String>,
    /// Match filter text with exact letter case.
    pub case_sensitive_filter: bool,
    /// Quiet period after the last keystroke before the filter is applied.
    pub filter_debounce_ms: u64,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Levels of the unfiltered tree shown expanded (`0` = all).
    pub expand_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_ruleset: None,
            case_sensitive_filter: false,
            filter_debounce_ms: DEFAULT_FILTER_DEBOUNCE_MS,
            log_level: "info".to_string(),
            expand_depth: 0,
        }
    }
}

/// What: Check if a line should be skipped (empty or comment).
///
/// Inputs:
/// - `line`: Line to check
///
/// Output:
/// - `true` if the line should be skipped, `false` otherwise
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`
#[must_use]
pub fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// What: Parse a key-value pair from a line.
///
/// Inputs:
/// - `line`: Line containing key=value format
///
/// Output:
/// - `Some((key, value))` if parsing succeeds, `None` otherwise
///
/// Details:
/// - Splits on the first `=` character
/// - Normalizes the key to lowercase with `_` separators
/// - Strips inline comments from the value
#[must_use]
pub fn parse_key_value(line: &str) -> Option<(String, String)> {
    let (raw_key, raw_val) = line.trim().split_once('=')?;
    let key = raw_key.trim().to_lowercase().replace(['.', '-', ' '], "_");
    let value = strip_inline_comment(raw_val.trim()).to_string();
    Some((key, value))
}

/// Remove a trailing `//` or `#` comment from a value.
fn strip_inline_comment(mut s: &str) -> &str {
    if let Some(i) = s.find("//") {
        s = &s[..i];
    }
    if let Some(i) = s.find('#') {
        s = &s[..i];
    }
    s.trim()
}

/// Parse a boolean the way users tend to write one.
fn parse_bool(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// What: Parse settings from file content.
///
/// Inputs:
/// - `content`: Full text of a settings file
///
/// Output:
/// - Settings with every recognized, valid key applied over the defaults
#[must_use]
pub fn parse_settings(content: &str) -> Settings {
    let mut out = Settings::default();
    for line in content.lines() {
        if skip_comment_or_empty(line) {
            continue;
        }
        let Some((key, val)) = parse_key_value(line) else {
            continue;
        };
        match key.as_str() {
            "default_ruleset" | "ruleset" => {
                out.default_ruleset = (!val.is_empty()).then(|| val.clone());
            }
            "case_sensitive_filter" | "case_sensitive" => {
                if let Some(b) = parse_bool(&val) {
                    out.case_sensitive_filter = b;
                }
            }
            "filter_debounce_ms" | "debounce_ms" => {
                if let Ok(v) = val.parse::<u64>() {
                    out.filter_debounce_ms = v;
                }
            }
            "log_level" => {
                if !val.is_empty() {
                    out.log_level = val.to_ascii_lowercase();
                }
            }
            "expand_depth" => {
                if let Ok(v) = val.parse::<usize>() {
                    out.expand_depth = v;
                }
            }
            other => tracing::debug!(key = other, "ignoring unknown settings key"),
        }
    }
    out
}

/// What: Load settings from `path`, or from the default location.
///
/// Inputs:
/// - `path`: Explicit settings file; `None` resolves `settings.conf` under the
///   config directory
///
/// Output:
/// - Parsed settings, or defaults when no readable file exists
#[must_use]
pub fn load_settings(path: Option<&Path>) -> Settings {
    let resolved = path
        .map(Path::to_path_buf)
        .or_else(super::paths::resolve_settings_config_path);
    let Some(p) = resolved else {
        return Settings::default();
    };
    match fs::read_to_string(&p) {
        Ok(content) => {
            tracing::debug!(path = %p.display(), "loaded settings");
            parse_settings(&content)
        }
        Err(e) => {
            tracing::warn!(path = %p.display(), error = %e, "failed to read settings; using defaults");
            Settings::default()
        }
    }
}
