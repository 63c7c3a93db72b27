//! Core value types used by hierscope state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a data connection.
///
/// Two connections are the same only when their identities compare equal;
/// the string carries no other meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a connection identity from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a presentation ruleset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RulesetId(String);

impl RulesetId {
    /// Create a ruleset identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RulesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RulesetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RulesetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Declarative node as written in a ruleset document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Display label; also the key segment for this node.
    pub label: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Nested child nodes in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

/// Full ruleset definition: its identifier plus the hierarchy it produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Ruleset identifier.
    pub id: RulesetId,
    /// Root nodes of the hierarchy described by this ruleset.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// Either a bare ruleset identifier or a complete ruleset object.
///
/// Callers may hand over whichever they have; everything downstream works
/// with the normalized [`RulesetId`] from [`RulesetSource::id`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RulesetSource {
    /// Reference to a ruleset already known to the node source.
    Id(RulesetId),
    /// Ruleset definition that must be registered before use.
    Ruleset(Ruleset),
}

impl RulesetSource {
    /// Normalized identifier of the referenced ruleset.
    #[must_use]
    pub const fn id(&self) -> &RulesetId {
        match self {
            Self::Id(id) => id,
            Self::Ruleset(ruleset) => &ruleset.id,
        }
    }
}

impl From<&str> for RulesetSource {
    fn from(value: &str) -> Self {
        Self::Id(RulesetId::new(value))
    }
}

impl From<String> for RulesetSource {
    fn from(value: String) -> Self {
        Self::Id(RulesetId::from(value))
    }
}

impl From<RulesetId> for RulesetSource {
    fn from(value: RulesetId) -> Self {
        Self::Id(value)
    }
}

impl From<Ruleset> for RulesetSource {
    fn from(value: Ruleset) -> Self {
        Self::Ruleset(value)
    }
}

/// Key that uniquely locates a node inside one hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    /// Kind tag assigned by the node source.
    #[serde(rename = "type")]
    pub kind: String,
    /// Key segments from the root down to and including this node.
    pub path_from_root: Vec<String>,
}

impl NodeKey {
    /// Build a key from its kind and path.
    pub fn new(kind: impl Into<String>, path_from_root: Vec<String>) -> Self {
        Self {
            kind: kind.into(),
            path_from_root,
        }
    }

    /// Stable textual id for this node.
    ///
    /// Segments are joined with `/`; a `/` or `\` inside a segment is
    /// escaped with a leading `\`, so distinct paths never share an id.
    #[must_use]
    pub fn id(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.path_from_root.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            for c in segment.chars() {
                if matches!(c, '/' | '\\') {
                    out.push('\\');
                }
                out.push(c);
            }
        }
        out
    }

    /// Nesting depth, `0` for root nodes.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.path_from_root.len().saturating_sub(1)
    }
}

/// Node as returned by a node source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique key of the node.
    pub key: NodeKey,
    /// Display label.
    pub label: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the source can return children for this node.
    #[serde(default)]
    pub has_children: bool,
}

/// Match counters attached to a filtered path element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteringData {
    /// Occurrences of the filter text in this node's label.
    pub matches_count: usize,
    /// Occurrences in all descendants.
    pub child_matches_count: usize,
}

/// One node of a filtered hierarchy, with the branches leading to matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePathElement {
    /// The node itself.
    pub node: Node,
    /// Position among the unfiltered siblings.
    pub index: usize,
    /// Whether this node matched the filter (as opposed to only being on the
    /// way to a match).
    #[serde(default)]
    pub is_marked_for_filtering: bool,
    /// Filtered children.
    #[serde(default)]
    pub children: Vec<NodePathElement>,
    /// Match counters, absent when the source did not compute them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtering_data: Option<FilteringData>,
}

impl NodePathElement {
    /// Number of matches on this node itself.
    #[must_use]
    pub fn matches_count(&self) -> usize {
        self.filtering_data.map_or(0, |d| d.matches_count)
    }
}

/// Location of the currently highlighted match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMatchInfo {
    /// Id of the node holding the match (see [`NodeKey::id`]).
    pub node_id: String,
    /// Zero-based index of the match inside that node's label.
    pub match_index: usize,
}

/// Identifies the query context a filtered view is built for.
///
/// `filter` keeps the literal value supplied by the caller: `None` and
/// `Some("")` both mean "no filter" but are reported back verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Descriptor {
    /// Connection the data comes from.
    pub connection: ConnectionId,
    /// Ruleset producing the hierarchy.
    pub ruleset_id: RulesetId,
    /// Current filter text.
    pub filter: Option<String>,
}

impl Descriptor {
    /// Build a descriptor.
    pub fn new(
        connection: ConnectionId,
        ruleset_id: impl Into<RulesetId>,
        filter: Option<String>,
    ) -> Self {
        Self {
            connection,
            ruleset_id: ruleset_id.into(),
            filter,
        }
    }

    /// The filter text when it is present and non-empty.
    #[must_use]
    pub fn filter_text(&self) -> Option<&str> {
        self.filter.as_deref().filter(|f| !f.is_empty())
    }

    /// Whether filtering is requested at all.
    #[must_use]
    pub fn has_filter(&self) -> bool {
        self.filter_text().is_some()
    }

    /// Return a copy with a different filter value.
    #[must_use]
    pub fn with_filter(&self, filter: Option<String>) -> Self {
        Self {
            filter,
            ..self.clone()
        }
    }
}

/// One record of a materialized hierarchy snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry<T> {
    /// Node label.
    pub label: String,
    /// Identifier produced by the node mapper.
    pub id: T,
    /// Child records in source order.
    pub children: Vec<HierarchyEntry<T>>,
}
