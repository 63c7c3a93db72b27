//! Small utility helpers for text matching and time formatting.
//!
//! The functions in this module are intentionally lightweight and are used by
//! the UI and logging layers.

pub mod config;
pub mod paths;

/// What: Find byte ranges of non-overlapping occurrences of `needle` in `haystack`.
///
/// Inputs:
/// - `haystack`: Text to search
/// - `needle`: Text to find; empty yields no ranges
/// - `case_sensitive`: Compare letters exactly when `true`
///
/// Output:
/// - `(start, end)` byte ranges into `haystack`, in order
///
/// Details:
/// - Case-insensitive matching compares char by char with `to_lowercase`,
///   so ranges always fall on `haystack` char boundaries.
#[must_use]
pub fn match_ranges(haystack: &str, needle: &str, case_sensitive: bool) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    if case_sensitive {
        return haystack
            .match_indices(needle)
            .map(|(i, m)| (i, i + m.len()))
            .collect();
    }
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    let chars: Vec<(usize, char)> = haystack.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let mut lowered = Vec::with_capacity(needle.len());
        let mut j = i;
        while j < chars.len() && lowered.len() < needle.len() {
            lowered.extend(chars[j].1.to_lowercase());
            j += 1;
        }
        if lowered == needle {
            let end = chars.get(j).map_or(haystack.len(), |(b, _)| *b);
            out.push((chars[i].0, end));
            i = j;
        } else {
            i += 1;
        }
    }
    out
}

/// Local timestamp used in log lines, e.g. `2025-10-11-T 14:03:07`.
#[must_use]
pub fn log_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d-T %H:%M:%S").to_string()
}
