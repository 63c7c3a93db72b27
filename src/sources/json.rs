//! In-memory node source backed by a JSON document.
//!
//! Document shape:
//!
//! ```json
//! {
//!   "connection": "demo",
//!   "rulesets": [
//!     { "id": "items", "nodes": [ { "label": "Root", "children": [ { "label": "Leaf" } ] } ] }
//!   ]
//! }
//! ```
//!
//! Node keys are the labels along the path from the root. Siblings sharing a
//! label resolve to the first of them.
//!
//! Registering a ruleset whose id is already known shadows the existing one
//! until it is unregistered again.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};

use super::{NodeSource, Result, SourceContext};
use crate::state::{
    ConnectionId, FilteringData, Node, NodeKey, NodePathElement, NodeSpec, Ruleset, RulesetId,
};

/// Kind tag attached to every key produced by this source.
const NODE_KIND: &str = "json";

/// Serialized form of a JSON node source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Connection name the document answers for.
    pub connection: String,
    /// Rulesets available on that connection.
    #[serde(default)]
    pub rulesets: Vec<Ruleset>,
}

/// Node source serving hierarchies from parsed [`NodeDocument`]s.
#[derive(Debug)]
pub struct JsonNodeSource {
    connection: ConnectionId,
    /// Per id, registered rulesets stacked over the document's; the last one is served.
    rulesets: RwLock<HashMap<RulesetId, Vec<Ruleset>>>,
    case_sensitive: bool,
}

impl JsonNodeSource {
    /// Build a source from an already parsed document.
    #[must_use]
    pub fn from_document(doc: NodeDocument) -> Self {
        let rulesets = doc
            .rulesets
            .into_iter()
            .map(|r| (r.id.clone(), vec![r]))
            .collect();
        Self {
            connection: ConnectionId::new(doc.connection),
            rulesets: RwLock::new(rulesets),
            case_sensitive: false,
        }
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    /// Returns the `serde_json` error when the text is not a valid document.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: NodeDocument = serde_json::from_str(text)?;
        Ok(Self::from_document(doc))
    }

    /// Read and parse a document file.
    ///
    /// # Errors
    /// Fails when the file cannot be read or is not a valid document.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let source = Self::from_json(&text)?;
        tracing::debug!(
            path = %path.display(),
            connection = %source.connection,
            "loaded node document"
        );
        Ok(source)
    }

    /// Choose whether label matching respects letter case.
    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Connection this source answers for.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionId {
        &self.connection
    }

    /// Known ruleset ids, sorted.
    #[must_use]
    pub fn ruleset_ids(&self) -> Vec<RulesetId> {
        let mut ids: Vec<RulesetId> = self
            .rulesets
            .read()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Run `f` over the node specs of the ruleset addressed by `ctx`.
    ///
    /// Unknown connections and rulesets behave like empty hierarchies.
    fn with_roots<R: Default>(&self, ctx: &SourceContext, f: impl FnOnce(&[NodeSpec]) -> R) -> R {
        if ctx.connection != self.connection {
            return R::default();
        }
        let Ok(rulesets) = self.rulesets.read() else {
            tracing::warn!("ruleset registry lock poisoned");
            return R::default();
        };
        rulesets
            .get(&ctx.ruleset_id)
            .and_then(|stack| stack.last())
            .map(|r| f(&r.nodes))
            .unwrap_or_default()
    }

    /// Count non-overlapping occurrences of `needle` in `label`.
    fn count_matches(&self, label: &str, needle: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        if self.case_sensitive {
            label.matches(needle).count()
        } else {
            label.to_lowercase().matches(&needle.to_lowercase()).count()
        }
    }

    /// Collect filtered paths below `specs`, keeping only branches with matches.
    fn filter_specs(
        &self,
        specs: &[NodeSpec],
        parent_path: &[String],
        filter: &str,
    ) -> Vec<NodePathElement> {
        let mut out = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            let path = child_path(parent_path, &spec.label);
            let children = self.filter_specs(&spec.children, &path, filter);
            let matches_count = self.count_matches(&spec.label, filter);
            if matches_count == 0 && children.is_empty() {
                continue;
            }
            let child_matches_count = children
                .iter()
                .map(|c| {
                    c.filtering_data
                        .map_or(0, |d| d.matches_count + d.child_matches_count)
                })
                .sum();
            out.push(NodePathElement {
                node: node_from_spec(spec, path),
                index,
                is_marked_for_filtering: matches_count > 0,
                children,
                filtering_data: Some(FilteringData {
                    matches_count,
                    child_matches_count,
                }),
            });
        }
        out
    }
}

/// Append one segment to a key path.
fn child_path(parent: &[String], label: &str) -> Vec<String> {
    let mut path = parent.to_vec();
    path.push(label.to_string());
    path
}

/// Convert a declarative spec into a source node located at `path`.
fn node_from_spec(spec: &NodeSpec, path: Vec<String>) -> Node {
    Node {
        key: NodeKey::new(NODE_KIND, path),
        label: spec.label.clone(),
        description: spec.description.clone(),
        has_children: !spec.children.is_empty(),
    }
}

/// Walk `path` down from `roots` and return the addressed spec.
fn find_spec<'a>(roots: &'a [NodeSpec], path: &[String]) -> Option<&'a NodeSpec> {
    let (first, rest) = path.split_first()?;
    let mut current = roots.iter().find(|s| &s.label == first)?;
    for segment in rest {
        current = current.children.iter().find(|s| &s.label == segment)?;
    }
    Some(current)
}

impl NodeSource for JsonNodeSource {
    fn get_root_nodes(&self, ctx: &SourceContext) -> BoxFuture<'_, Result<Vec<Node>>> {
        let nodes = self.with_roots(ctx, |roots| {
            roots
                .iter()
                .map(|s| node_from_spec(s, vec![s.label.clone()]))
                .collect::<Vec<_>>()
        });
        Box::pin(future::ready(Ok(nodes)))
    }

    fn get_children(
        &self,
        ctx: &SourceContext,
        parent: &NodeKey,
    ) -> BoxFuture<'_, Result<Vec<Node>>> {
        let nodes = self.with_roots(ctx, |roots| {
            find_spec(roots, &parent.path_from_root)
                .map(|spec| {
                    spec.children
                        .iter()
                        .map(|c| node_from_spec(c, child_path(&parent.path_from_root, &c.label)))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        });
        Box::pin(future::ready(Ok(nodes)))
    }

    fn get_filtered_node_paths(
        &self,
        ctx: &SourceContext,
        filter: &str,
    ) -> BoxFuture<'_, Result<Vec<NodePathElement>>> {
        let paths = self.with_roots(ctx, |roots| self.filter_specs(roots, &[], filter));
        tracing::debug!(
            ruleset = %ctx.ruleset_id,
            filter,
            roots = paths.len(),
            "computed filtered node paths"
        );
        Box::pin(future::ready(Ok(paths)))
    }

    fn register_ruleset(&self, ruleset: Ruleset) -> Result<()> {
        let mut rulesets = self
            .rulesets
            .write()
            .map_err(|_| "ruleset registry lock poisoned")?;
        let stack = rulesets.entry(ruleset.id.clone()).or_default();
        tracing::debug!(
            ruleset = %ruleset.id,
            shadows = stack.len(),
            "registering ruleset"
        );
        stack.push(ruleset);
        Ok(())
    }

    fn unregister_ruleset(&self, id: &RulesetId) {
        let Ok(mut rulesets) = self.rulesets.write() else {
            tracing::warn!(ruleset = %id, "ruleset registry lock poisoned");
            return;
        };
        if let Some(stack) = rulesets.get_mut(id) {
            stack.pop();
            if stack.is_empty() {
                rulesets.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> JsonNodeSource {
        JsonNodeSource::from_json(
            r#"{
                "connection": "demo",
                "rulesets": [
                    { "id": "items", "nodes": [
                        { "label": "Root", "children": [
                            { "label": "Alpha beta", "children": [ { "label": "alpha alpha" } ] },
                            { "label": "Gamma" }
                        ] }
                    ] }
                ]
            }"#,
        )
        .expect("valid document")
    }

    fn ctx() -> SourceContext {
        SourceContext::new(ConnectionId::new("demo"), "items")
    }

    #[tokio::test]
    /// What: Root and child lookups follow label paths
    ///
    /// - Input: Sample document with one root and two children
    /// - Output: Root reports children; child keys extend the root path
    async fn roots_and_children_follow_paths() {
        let source = sample();
        let roots = source.get_root_nodes(&ctx()).await.expect("roots");
        assert_eq!(roots.len(), 1);
        assert!(roots[0].has_children);
        let children = source
            .get_children(&ctx(), &roots[0].key)
            .await
            .expect("children");
        let ids: Vec<String> = children.iter().map(|n| n.key.id()).collect();
        assert_eq!(ids, vec!["Root/Alpha beta", "Root/Gamma"]);
        assert!(children[0].has_children);
        assert!(!children[1].has_children);
    }

    #[tokio::test]
    /// What: Unknown connection or ruleset yields empty sequences
    async fn unknown_context_is_empty() {
        let source = sample();
        let other_conn = SourceContext::new(ConnectionId::new("other"), "items");
        let other_ruleset = SourceContext::new(ConnectionId::new("demo"), "missing");
        assert!(source.get_root_nodes(&other_conn).await.expect("roots").is_empty());
        assert!(source.get_root_nodes(&other_ruleset).await.expect("roots").is_empty());
    }

    #[tokio::test]
    /// What: Filtered paths keep only matching branches and count occurrences
    ///
    /// - Input: Filter "alpha" (case-insensitive)
    /// - Output: Root -> "Alpha beta" (1 match) -> "alpha alpha" (2 matches); "Gamma" dropped
    async fn filtered_paths_count_matches() {
        let source = sample();
        let paths = source
            .get_filtered_node_paths(&ctx(), "alpha")
            .await
            .expect("paths");
        assert_eq!(paths.len(), 1);
        let root = &paths[0];
        assert!(!root.is_marked_for_filtering);
        assert_eq!(
            root.filtering_data,
            Some(FilteringData {
                matches_count: 0,
                child_matches_count: 3
            })
        );
        assert_eq!(root.children.len(), 1);
        let alpha = &root.children[0];
        assert_eq!(alpha.matches_count(), 1);
        assert_eq!(alpha.children[0].matches_count(), 2);
    }

    #[tokio::test]
    /// What: Case-sensitive matching skips differently cased labels
    async fn case_sensitive_filtering() {
        let source = sample().with_case_sensitive(true);
        let paths = source
            .get_filtered_node_paths(&ctx(), "Alpha")
            .await
            .expect("paths");
        let alpha = &paths[0].children[0];
        assert_eq!(alpha.matches_count(), 1);
        assert!(alpha.children.is_empty());
    }

    #[tokio::test]
    /// What: Registered rulesets become queryable and vanish after removal
    async fn register_and_unregister_ruleset() {
        let source = sample();
        let ruleset = Ruleset {
            id: RulesetId::new("extra"),
            nodes: vec![NodeSpec {
                label: "Only".into(),
                description: None,
                children: Vec::new(),
            }],
        };
        source.register_ruleset(ruleset).expect("register");
        let extra = SourceContext::new(ConnectionId::new("demo"), "extra");
        assert_eq!(source.get_root_nodes(&extra).await.expect("roots").len(), 1);
        assert_eq!(
            source.ruleset_ids(),
            vec![RulesetId::new("extra"), RulesetId::new("items")]
        );
        source.unregister_ruleset(&RulesetId::new("extra"));
        assert!(source.get_root_nodes(&extra).await.expect("roots").is_empty());
    }

    #[tokio::test]
    /// What: A ruleset registered under a document id only shadows it
    ///
    /// - Input: Register "items" with root "Adhoc", then unregister it
    /// - Output: "Adhoc" served while registered; document root "Root" afterwards
    async fn registering_same_id_restores_document_ruleset() {
        let source = sample();
        let adhoc = Ruleset {
            id: RulesetId::new("items"),
            nodes: vec![NodeSpec {
                label: "Adhoc".into(),
                description: None,
                children: Vec::new(),
            }],
        };
        source.register_ruleset(adhoc).expect("register");
        let roots = source.get_root_nodes(&ctx()).await.expect("roots");
        assert_eq!(roots[0].label, "Adhoc");
        source.unregister_ruleset(&RulesetId::new("items"));
        let roots = source.get_root_nodes(&ctx()).await.expect("roots");
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].label, "Root");
        assert_eq!(source.ruleset_ids(), vec![RulesetId::new("items")]);
    }
}
