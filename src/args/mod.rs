//! Command-line argument parsing and handling.

pub mod definition;
pub mod dump;
pub mod utils;

// Re-export commonly used items
pub use definition::Args;
pub use utils::{determine_log_level, resolve_ruleset};
