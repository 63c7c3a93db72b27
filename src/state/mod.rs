//! Application state and the value types shared across layers.

pub mod app_state;
pub mod types;

pub use app_state::{AppNotice, AppState};
pub use types::{
    ActiveMatchInfo, ConnectionId, Descriptor, FilteringData, HierarchyEntry, Node, NodeKey,
    NodePathElement, NodeSpec, Ruleset, RulesetId, RulesetSource,
};
