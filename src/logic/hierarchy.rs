//! Eager materialization of a hierarchy into an in-memory snapshot.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::sources::{NodeSource, Result, SourceContext};
use crate::state::{ConnectionId, HierarchyEntry, Node, NodeKey, RulesetSource};

/// Maps a source node to the identifier stored in the snapshot.
pub type NodeMapper<T> = Arc<dyn Fn(&Node) -> T + Send + Sync>;

/// Walks a [`NodeSource`] from the roots down and collects every node.
///
/// The walk assumes the source serves a finite tree; there is no cycle
/// detection.
pub struct HierarchyBuilder<T> {
    source: Arc<dyn NodeSource>,
    connection: ConnectionId,
    mapper: NodeMapper<T>,
}

impl HierarchyBuilder<Vec<String>> {
    /// Builder whose snapshot ids are node key paths.
    #[must_use]
    pub fn new(source: Arc<dyn NodeSource>, connection: ConnectionId) -> Self {
        Self::with_mapper(source, connection, |node: &Node| {
            node.key.path_from_root.clone()
        })
    }
}

impl<T: Send + 'static> HierarchyBuilder<T> {
    /// Builder with a caller-defined id mapping.
    pub fn with_mapper(
        source: Arc<dyn NodeSource>,
        connection: ConnectionId,
        mapper: impl Fn(&Node) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            connection,
            mapper: Arc::new(mapper),
        }
    }

    /// What: Materialize the whole hierarchy produced by `ruleset`.
    ///
    /// Inputs:
    /// - `ruleset`: Ruleset id, or a full ruleset definition
    ///
    /// Output:
    /// - Snapshot records in source order, children nested
    ///
    /// Details:
    /// - A full definition is registered with the source for the duration of
    ///   the walk and unregistered afterwards, also when the walk fails.
    /// - Children are requested only for nodes that report having them.
    ///
    /// # Errors
    /// Propagates the first failing source call.
    pub async fn create_hierarchy(
        &self,
        ruleset: impl Into<RulesetSource>,
    ) -> Result<Vec<HierarchyEntry<T>>> {
        let ruleset = ruleset.into();
        let ctx = SourceContext::new(self.connection.clone(), ruleset.id().clone());
        let registered = match ruleset {
            RulesetSource::Ruleset(definition) => {
                self.source.register_ruleset(definition)?;
                true
            }
            RulesetSource::Id(_) => false,
        };
        let result = self.walk(&ctx, None).await;
        if registered {
            self.source.unregister_ruleset(&ctx.ruleset_id);
        }
        match &result {
            Ok(entries) => tracing::debug!(
                ruleset = %ctx.ruleset_id,
                roots = entries.len(),
                "hierarchy materialized"
            ),
            Err(e) => tracing::warn!(ruleset = %ctx.ruleset_id, error = %e, "hierarchy walk failed"),
        }
        result
    }

    /// Fetch one level (roots when `parent` is `None`) and recurse.
    fn walk<'a>(
        &'a self,
        ctx: &'a SourceContext,
        parent: Option<&'a NodeKey>,
    ) -> BoxFuture<'a, Result<Vec<HierarchyEntry<T>>>> {
        Box::pin(async move {
            let nodes = match parent {
                None => self.source.get_root_nodes(ctx).await?,
                Some(key) => self.source.get_children(ctx, key).await?,
            };
            let mut entries = Vec::with_capacity(nodes.len());
            for node in nodes {
                let children = if node.has_children {
                    self.walk(ctx, Some(&node.key)).await?
                } else {
                    Vec::new()
                };
                entries.push(HierarchyEntry {
                    label: node.label.clone(),
                    id: (self.mapper)(&node),
                    children,
                });
            }
            Ok(entries)
        })
    }
}
