//! Central `AppState` container for the interactive browser.

use std::time::Instant;

use ratatui::widgets::ListState;

use crate::logic::{FilterProps, FilteringController};
use crate::state::types::{Descriptor, HierarchyEntry, NodeKey};

/// Messages emitted by controller callbacks and drained by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppNotice {
    /// The controller reported the filter that is now in effect.
    FilterApplied(Option<String>),
    /// A freshly applied view holds this many matches.
    MatchesCounted(usize),
}

/// Global application state shared by the event and UI layers.
#[derive(Debug)]
pub struct AppState {
    /// Filter input text as typed.
    pub input: String,
    /// Timestamp of the last input edit, used for debouncing.
    pub last_input_change: Instant,
    /// Input edited since the controller last saw it.
    pub input_dirty: bool,
    /// Unfiltered hierarchy materialized at startup.
    pub hierarchy: Vec<HierarchyEntry<NodeKey>>,
    /// Filtering decisions and the held filtered view.
    pub filtering: FilteringController,
    /// Index of the highlighted row.
    pub selected: usize,
    /// List selection state for the tree pane.
    pub list_state: ListState,
    /// Levels of the unfiltered tree shown expanded (`0` = everything).
    pub expand_depth: usize,
    /// Highlight matches with exact letter case.
    pub case_sensitive: bool,
    /// Match total of the applied filtered view.
    pub match_count: Option<usize>,
    /// Filter last reported as applied.
    pub applied_filter: Option<String>,
    /// Set when the event loop should exit.
    pub should_quit: bool,
}

impl AppState {
    /// What: Create the state for a descriptor and its materialized hierarchy.
    ///
    /// Inputs:
    /// - `filtering`: Controller already configured with callbacks
    /// - `hierarchy`: Unfiltered snapshot
    ///
    /// Output: State with the input mirroring the controller's filter
    #[must_use]
    pub fn new(filtering: FilteringController, hierarchy: Vec<HierarchyEntry<NodeKey>>) -> Self {
        let input = filtering
            .props()
            .descriptor
            .filter
            .clone()
            .unwrap_or_default();
        Self {
            input,
            last_input_change: Instant::now(),
            input_dirty: false,
            hierarchy,
            filtering,
            selected: 0,
            list_state: ListState::default(),
            expand_depth: 0,
            case_sensitive: false,
            match_count: None,
            applied_filter: None,
            should_quit: false,
        }
    }

    /// Descriptor currently held by the controller.
    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor {
        &self.filtering.props().descriptor
    }

    /// Props the controller should see for the current input.
    #[must_use]
    pub fn props_from_input(&self) -> FilterProps {
        let current = self.filtering.props();
        FilterProps {
            descriptor: current.descriptor.with_filter(Some(self.input.clone())),
            active_match_index: if self.input.is_empty() {
                0
            } else if current.descriptor.filter.as_deref() == Some(self.input.as_str()) {
                current.active_match_index.max(1)
            } else {
                1
            },
        }
    }

    /// Apply a callback notice to the state.
    pub fn apply_notice(&mut self, notice: AppNotice) {
        match notice {
            AppNotice::FilterApplied(filter) => {
                if filter.as_deref().is_none_or(str::is_empty) {
                    self.match_count = None;
                }
                self.applied_filter = filter;
            }
            AppNotice::MatchesCounted(n) => self.match_count = Some(n),
        }
    }
}
