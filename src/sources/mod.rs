//! Node sources: the asynchronous collaborators that serve hierarchy data.
//!
//! Everything the filtering and hierarchy layers know about nodes comes
//! through the [`NodeSource`] trait. Calls return boxed futures so a source
//! can be shared as `Arc<dyn NodeSource>` across spawned tasks.

use futures::future::BoxFuture;

use crate::state::{ConnectionId, Node, NodeKey, NodePathElement, Ruleset, RulesetId};

pub mod json;

pub use json::JsonNodeSource;

/// Boxed error result shared by all source calls.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Connection and ruleset pair a source request is scoped to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceContext {
    /// Connection to read from.
    pub connection: ConnectionId,
    /// Ruleset producing the hierarchy.
    pub ruleset_id: RulesetId,
}

impl SourceContext {
    /// Build a request context.
    pub fn new(connection: ConnectionId, ruleset_id: impl Into<RulesetId>) -> Self {
        Self {
            connection,
            ruleset_id: ruleset_id.into(),
        }
    }
}

/// Asynchronous provider of hierarchy nodes.
///
/// Every call may legitimately return an empty sequence (unknown ruleset,
/// leaf parent, no matches).
pub trait NodeSource: Send + Sync {
    /// Root nodes of the hierarchy for `ctx`.
    fn get_root_nodes(&self, ctx: &SourceContext) -> BoxFuture<'_, Result<Vec<Node>>>;

    /// Direct children of the node identified by `parent`.
    fn get_children(
        &self,
        ctx: &SourceContext,
        parent: &NodeKey,
    ) -> BoxFuture<'_, Result<Vec<Node>>>;

    /// Paths from the roots to every node whose label matches `filter`.
    fn get_filtered_node_paths(
        &self,
        ctx: &SourceContext,
        filter: &str,
    ) -> BoxFuture<'_, Result<Vec<NodePathElement>>>;

    /// Make a ruleset definition available under its id.
    ///
    /// Sources that cannot accept ad-hoc rulesets keep the default, which
    /// accepts and ignores the definition.
    fn register_ruleset(&self, ruleset: Ruleset) -> Result<()> {
        let _ = ruleset;
        Ok(())
    }

    /// Forget a ruleset previously passed to [`NodeSource::register_ruleset`].
    fn unregister_ruleset(&self, id: &RulesetId) {
        let _ = id;
    }
}
