//! Non-interactive `--dump` mode.

use std::sync::Arc;

use serde::Serialize;

use crate::logic::{FilterProps, FilteringController, HierarchyBuilder};
use crate::sources::{JsonNodeSource, NodeSource};
use crate::state::{Descriptor, NodePathElement, RulesetId};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// JSON shape printed for a filtered dump.
#[derive(Serialize)]
struct FilteredDump<'a> {
    filter: &'a str,
    matches: usize,
    paths: &'a [NodePathElement],
}

/// What: Render the hierarchy of `ruleset` as pretty JSON.
///
/// Inputs:
/// - `source`: Loaded node document
/// - `ruleset`: Ruleset to walk
/// - `filter`: Optional filter text
///
/// Output:
/// - Full hierarchy snapshot when `filter` is empty/absent; otherwise the
///   filtered paths with their match total
///
/// Details:
/// - The filtered branch goes through the same mount/load/apply cycle the
///   interactive browser uses.
///
/// # Errors
/// Fails on node source errors or serialization errors.
pub async fn handle_dump(
    source: Arc<JsonNodeSource>,
    ruleset: RulesetId,
    filter: Option<String>,
) -> Result<String> {
    let connection = source.connection().clone();
    let descriptor = Descriptor::new(connection.clone(), ruleset.clone(), filter);
    let mut controller = FilteringController::new(FilterProps::new(descriptor));
    let Some(request) = controller.did_mount() else {
        let builder = HierarchyBuilder::new(source, connection);
        let hierarchy = builder.create_hierarchy(ruleset).await?;
        return Ok(serde_json::to_string_pretty(&hierarchy)?);
    };
    let dyn_source: Arc<dyn NodeSource> = source;
    let outcome = FilteringController::load(dyn_source, request).await?;
    controller.apply_loaded(outcome);
    let plan = controller.render_plan();
    let view = plan
        .filtered
        .ok_or("filtered view was not applied")?;
    let dump = FilteredDump {
        filter: view.filter(),
        matches: view.count_matches(),
        paths: view.paths(),
    };
    Ok(serde_json::to_string_pretty(&dump)?)
}
