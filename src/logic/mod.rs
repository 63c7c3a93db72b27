//! Core non-UI logic: filtering decisions and hierarchy materialization.

pub mod filtering;
pub mod hierarchy;

pub use filtering::{
    FilterProps, FilterState, FilteringController, HighlightingProps, LoadOutcome, LoadRequest,
    RenderPlan,
};
pub use hierarchy::{HierarchyBuilder, NodeMapper};
