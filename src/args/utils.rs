//! Shared utilities for argument processing.

use crate::args::Args;
use crate::sources::JsonNodeSource;
use crate::state::RulesetId;
use crate::util::config::Settings;

/// What: Determine the log level based on command-line arguments and settings.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `settings`: Loaded settings.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides `--log-level`, which overrides the settings file.
#[must_use]
pub fn determine_log_level(args: &Args, settings: &Settings) -> String {
    if args.verbose {
        "debug".to_string()
    } else {
        args.log_level
            .clone()
            .unwrap_or_else(|| settings.log_level.clone())
    }
}

/// What: Pick the ruleset to open.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `settings`: Loaded settings.
/// - `source`: Loaded node document.
///
/// Output:
/// - `--ruleset`, else the settings default, else the first ruleset in the
///   document; `None` when the document has none.
#[must_use]
pub fn resolve_ruleset(
    args: &Args,
    settings: &Settings,
    source: &JsonNodeSource,
) -> Option<RulesetId> {
    args.ruleset
        .clone()
        .or_else(|| settings.default_ruleset.clone())
        .map(RulesetId::from)
        .or_else(|| source.ruleset_ids().into_iter().next())
}
