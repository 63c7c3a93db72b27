//! Test utilities for common test setup.
//!
//! This module provides shared test helpers used across multiple test modules.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::{self, BoxFuture};

use crate::sources::{NodeSource, Result, SourceContext};
use crate::state::{Node, NodeKey, NodePathElement, Ruleset, RulesetId};

/// What: Build a source node from its key path.
///
/// Inputs:
/// - `label`: Display label
/// - `path`: Key path segments
/// - `has_children`: Whether the node reports children
///
/// Output: Node with an empty key kind
pub fn node(label: &str, path: &[&str], has_children: bool) -> Node {
    Node {
        key: NodeKey::new("", path.iter().map(|s| (*s).to_string()).collect()),
        label: label.to_string(),
        description: None,
        has_children,
    }
}

/// Node source answering with a fixed "root -> child1, child2" hierarchy.
///
/// Counts calls and records ruleset registrations so tests can assert on
/// collaborator traffic.
#[derive(Default)]
pub struct ScriptedSource {
    /// Return no root nodes at all when set.
    pub empty: bool,
    /// Paths handed out by `get_filtered_node_paths`.
    pub filtered: Vec<NodePathElement>,
    /// Number of `get_filtered_node_paths` calls.
    pub filter_calls: AtomicUsize,
    /// Number of `get_children` calls.
    pub children_calls: AtomicUsize,
    /// Rulesets currently registered.
    pub registered: Mutex<Vec<RulesetId>>,
    /// Every ruleset id ever registered.
    pub registrations: Mutex<Vec<RulesetId>>,
}

impl NodeSource for ScriptedSource {
    fn get_root_nodes(&self, _ctx: &SourceContext) -> BoxFuture<'_, Result<Vec<Node>>> {
        let nodes = if self.empty {
            Vec::new()
        } else {
            vec![node("Root Node", &["root"], true)]
        };
        Box::pin(future::ready(Ok(nodes)))
    }

    fn get_children(
        &self,
        _ctx: &SourceContext,
        parent: &NodeKey,
    ) -> BoxFuture<'_, Result<Vec<Node>>> {
        self.children_calls.fetch_add(1, Ordering::SeqCst);
        let nodes = if parent.path_from_root == ["root"] {
            vec![
                node("Child 1", &["root", "child1"], false),
                node("Child 2", &["root", "child2"], false),
            ]
        } else {
            Vec::new()
        };
        Box::pin(future::ready(Ok(nodes)))
    }

    fn get_filtered_node_paths(
        &self,
        _ctx: &SourceContext,
        _filter: &str,
    ) -> BoxFuture<'_, Result<Vec<NodePathElement>>> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(Ok(self.filtered.clone())))
    }

    fn register_ruleset(&self, ruleset: Ruleset) -> Result<()> {
        if let Ok(mut r) = self.registered.lock() {
            r.push(ruleset.id.clone());
        }
        if let Ok(mut r) = self.registrations.lock() {
            r.push(ruleset.id);
        }
        Ok(())
    }

    fn unregister_ruleset(&self, id: &RulesetId) {
        if let Ok(mut r) = self.registered.lock() {
            r.retain(|x| x != id);
        }
    }
}
