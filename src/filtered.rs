//! Filtered projection over a node source.
//!
//! A [`FilteredView`] is built once for a specific connection, ruleset and
//! filter text, and is never mutated afterwards. It answers hierarchy queries
//! from the filtered node paths it was built with, and locates matches for
//! highlighting.

use std::fmt;
use std::sync::Arc;

use crate::sources::{NodeSource, Result, SourceContext};
use crate::state::{
    ActiveMatchInfo, ConnectionId, Descriptor, Node, NodeKey, NodePathElement, RulesetId,
};

/// Immutable filtered view of one hierarchy.
pub struct FilteredView {
    source: Arc<dyn NodeSource>,
    connection: ConnectionId,
    ruleset_id: RulesetId,
    filter: String,
    paths: Vec<NodePathElement>,
}

impl fmt::Debug for FilteredView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredView")
            .field("connection", &self.connection)
            .field("ruleset_id", &self.ruleset_id)
            .field("filter", &self.filter)
            .field("paths", &self.paths.len())
            .finish_non_exhaustive()
    }
}

impl FilteredView {
    /// Wrap already computed filtered paths.
    pub fn new(
        source: Arc<dyn NodeSource>,
        connection: ConnectionId,
        ruleset_id: RulesetId,
        filter: impl Into<String>,
        paths: Vec<NodePathElement>,
    ) -> Self {
        Self {
            source,
            connection,
            ruleset_id,
            filter: filter.into(),
            paths,
        }
    }

    /// What: Build a view by asking the source for the filtered paths of `descriptor`.
    ///
    /// Inputs:
    /// - `source`: Node source to query
    /// - `descriptor`: Connection, ruleset and filter the view is for
    ///
    /// Output:
    /// - The new view, or the source's error
    ///
    /// # Errors
    /// Propagates failures from [`NodeSource::get_filtered_node_paths`].
    pub async fn load(source: Arc<dyn NodeSource>, descriptor: &Descriptor) -> Result<Self> {
        let filter = descriptor.filter_text().unwrap_or_default().to_string();
        let ctx = SourceContext::new(descriptor.connection.clone(), descriptor.ruleset_id.clone());
        let paths = source.get_filtered_node_paths(&ctx, &filter).await?;
        Ok(Self::new(
            source,
            ctx.connection,
            ctx.ruleset_id,
            filter,
            paths,
        ))
    }

    /// Connection the view was built for.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionId {
        &self.connection
    }

    /// Ruleset the view was built for.
    #[must_use]
    pub const fn ruleset_id(&self) -> &RulesetId {
        &self.ruleset_id
    }

    /// Filter text the view was built from.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Filtered node paths backing the view.
    #[must_use]
    pub fn paths(&self) -> &[NodePathElement] {
        &self.paths
    }

    /// Whether the view still describes `descriptor`.
    ///
    /// All three of connection, ruleset and filter text must be equal.
    #[must_use]
    pub fn is_valid_for(&self, descriptor: &Descriptor) -> bool {
        self.connection == descriptor.connection
            && self.ruleset_id == descriptor.ruleset_id
            && descriptor.filter.as_deref() == Some(self.filter.as_str())
    }

    /// Ask the underlying source for the paths matching another filter text.
    ///
    /// # Errors
    /// Propagates failures from the node source.
    pub async fn find_matching_paths(&self, filter: &str) -> Result<Vec<NodePathElement>> {
        let ctx = SourceContext::new(self.connection.clone(), self.ruleset_id.clone());
        self.source.get_filtered_node_paths(&ctx, filter).await
    }

    /// Total number of matches across the view.
    #[must_use]
    pub fn count_matches(&self) -> usize {
        fn count(elements: &[NodePathElement]) -> usize {
            elements
                .iter()
                .map(|e| e.matches_count() + count(&e.children))
                .sum()
        }
        count(&self.paths)
    }

    /// What: Locate the `index`-th match in display order.
    ///
    /// Inputs:
    /// - `index`: One-based match index; `0` means no active match
    ///
    /// Output:
    /// - Node id and in-label match index, or `None` when out of range
    ///
    /// Details:
    /// - Walks the paths depth-first, parents before children, accumulating
    ///   each node's `matches_count`.
    #[must_use]
    pub fn locate_active_match(&self, index: usize) -> Option<ActiveMatchInfo> {
        fn walk(
            elements: &[NodePathElement],
            index: usize,
            seen: &mut usize,
        ) -> Option<ActiveMatchInfo> {
            for element in elements {
                let here = element.matches_count();
                if *seen + here > index {
                    return Some(ActiveMatchInfo {
                        node_id: element.node.key.id(),
                        match_index: index - *seen,
                    });
                }
                *seen += here;
                if let Some(found) = walk(&element.children, index, seen) {
                    return Some(found);
                }
            }
            None
        }
        if index == 0 {
            return None;
        }
        let mut seen = 1;
        walk(&self.paths, index, &mut seen)
    }

    /// Root nodes of the filtered hierarchy.
    #[must_use]
    pub fn root_nodes(&self) -> Vec<Node> {
        self.paths.iter().map(filtered_node).collect()
    }

    /// Filtered children of `parent`; empty when the parent is not part of
    /// the view.
    #[must_use]
    pub fn children(&self, parent: &NodeKey) -> Vec<Node> {
        find_element(&self.paths, parent)
            .map(|e| e.children.iter().map(filtered_node).collect())
            .unwrap_or_default()
    }
}

/// Node as seen through the filter: it has children only if some survived.
fn filtered_node(element: &NodePathElement) -> Node {
    Node {
        has_children: !element.children.is_empty(),
        ..element.node.clone()
    }
}

/// Find the path element whose node key equals `key`.
fn find_element<'a>(elements: &'a [NodePathElement], key: &NodeKey) -> Option<&'a NodePathElement> {
    for element in elements {
        if &element.node.key == key {
            return Some(element);
        }
        let is_ancestor = key.path_from_root.starts_with(&element.node.key.path_from_root);
        if is_ancestor && let Some(found) = find_element(&element.children, key) {
            return Some(found);
        }
    }
    None
}
