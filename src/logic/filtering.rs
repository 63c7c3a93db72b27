//! Filtering decisions for the tree view.
//!
//! [`FilteringController`] owns the currently held [`FilteredView`] and
//! decides on every lifecycle event whether to keep it, clear it, or request
//! a new one. The controller never awaits anything itself:
//!
//! 1. [`FilteringController::set_props`] swaps in new props and runs the pure
//!    [`FilteringController::derive_state`] rule first, so an emptied filter
//!    clears the view before any asynchronous work is considered.
//! 2. [`FilteringController::did_mount`] / [`FilteringController::did_update`]
//!    return an optional [`LoadRequest`] capturing the descriptor it was
//!    issued for.
//! 3. Whoever runs the request hands the [`LoadOutcome`] back through
//!    [`FilteringController::apply_loaded`], which drops it unless the
//!    captured descriptor still equals the live one.

use std::fmt;
use std::sync::Arc;

use crate::filtered::FilteredView;
use crate::sources::{NodeSource, Result};
use crate::state::{ActiveMatchInfo, Descriptor};

/// Callback told which filter text ended up applied (literal `None`/`Some("")` kept).
pub type FilterAppliedFn = Box<dyn FnMut(Option<&str>) + Send>;

/// Callback told how many matches a freshly applied view holds.
pub type MatchesCountedFn = Box<dyn FnMut(usize) + Send>;

/// Inputs supplied anew on every update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterProps {
    /// Connection, ruleset and filter text.
    pub descriptor: Descriptor,
    /// One-based index of the highlighted match; `0` for none.
    pub active_match_index: usize,
}

impl FilterProps {
    /// Props for `descriptor` with no active match.
    #[must_use]
    pub const fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            active_match_index: 0,
        }
    }

    /// Props for a freshly opened view: the first match is active whenever
    /// `descriptor` carries a filter.
    #[must_use]
    pub fn initial(descriptor: Descriptor) -> Self {
        let active_match_index = usize::from(descriptor.has_filter());
        Self {
            descriptor,
            active_match_index,
        }
    }
}

/// State owned by the controller.
#[derive(Clone, Debug, Default)]
pub struct FilterState {
    /// Currently held view, replaced wholesale.
    pub filtered_view: Option<Arc<FilteredView>>,
}

/// Request to build a view for the captured descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    /// Descriptor live at the time the request was issued.
    pub descriptor: Descriptor,
}

/// Finished load, ready to be offered to [`FilteringController::apply_loaded`].
#[derive(Debug)]
pub struct LoadOutcome {
    /// The request this outcome answers.
    pub request: LoadRequest,
    /// View built for the request's descriptor.
    pub view: FilteredView,
}

/// Highlighting data for the tree renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightingProps {
    /// Text to highlight in labels.
    pub search_text: String,
    /// Match currently selected, if any.
    pub active_match: Option<ActiveMatchInfo>,
}

/// Everything the renderer needs, derived purely from props and state.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// View to display instead of the unfiltered hierarchy; set only while
    /// it is valid for the current descriptor.
    pub filtered: Option<Arc<FilteredView>>,
    /// A filter is requested but no valid view exists yet.
    pub in_progress_overlay: bool,
    /// Present only with a valid view and a non-empty filter.
    pub highlighting: Option<HighlightingProps>,
}

/// Decides when to keep, clear, or rebuild the filtered view.
pub struct FilteringController {
    props: FilterProps,
    state: FilterState,
    on_filter_applied: Option<FilterAppliedFn>,
    on_matches_counted: Option<MatchesCountedFn>,
}

impl fmt::Debug for FilteringController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteringController")
            .field("props", &self.props)
            .field("state", &self.state)
            .field("on_filter_applied", &self.on_filter_applied.is_some())
            .field("on_matches_counted", &self.on_matches_counted.is_some())
            .finish()
    }
}

impl FilteringController {
    /// Controller with initial props, no view and no callbacks.
    #[must_use]
    pub fn new(props: FilterProps) -> Self {
        Self {
            props,
            state: FilterState::default(),
            on_filter_applied: None,
            on_matches_counted: None,
        }
    }

    /// Install the filter-applied callback.
    #[must_use]
    pub fn with_on_filter_applied(mut self, f: impl FnMut(Option<&str>) + Send + 'static) -> Self {
        self.on_filter_applied = Some(Box::new(f));
        self
    }

    /// Install the matches-counted callback.
    #[must_use]
    pub fn with_on_matches_counted(mut self, f: impl FnMut(usize) + Send + 'static) -> Self {
        self.on_matches_counted = Some(Box::new(f));
        self
    }

    /// Current props.
    #[must_use]
    pub const fn props(&self) -> &FilterProps {
        &self.props
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    /// Currently held view, valid or not.
    #[must_use]
    pub const fn filtered_view(&self) -> Option<&Arc<FilteredView>> {
        self.state.filtered_view.as_ref()
    }

    /// Replace the held view directly, bypassing the load path.
    pub fn replace_view(&mut self, view: Option<Arc<FilteredView>>) {
        self.state.filtered_view = view;
    }

    /// What: Pure state reduction run before any effect on every props change.
    ///
    /// Inputs:
    /// - `props`: Incoming props
    /// - `state`: State before the change
    ///
    /// Output:
    /// - State with the view cleared when the filter is empty or absent,
    ///   otherwise unchanged
    #[must_use]
    pub fn derive_state(props: &FilterProps, state: &FilterState) -> FilterState {
        if props.descriptor.has_filter() {
            state.clone()
        } else {
            FilterState {
                filtered_view: None,
            }
        }
    }

    /// Swap in new props, apply [`Self::derive_state`], and return the
    /// previous props for the following [`Self::did_update`] call.
    pub fn set_props(&mut self, props: FilterProps) -> FilterProps {
        self.state = Self::derive_state(&props, &self.state);
        std::mem::replace(&mut self.props, props)
    }

    /// What: React to the first render.
    ///
    /// Output:
    /// - A load request when a filter is set; otherwise `None` after the
    ///   filter-applied callback has been told about the (empty) filter
    pub fn did_mount(&mut self) -> Option<LoadRequest> {
        if self.props.descriptor.has_filter() {
            return Some(self.issue_request());
        }
        self.notify_filter_applied();
        None
    }

    /// What: React to a props or state change.
    ///
    /// Inputs:
    /// - `prev`: Props before the change (as returned by [`Self::set_props`])
    ///
    /// Output:
    /// - A load request when connection, ruleset or filter changed
    ///
    /// Details:
    /// - Empty/absent filter: view already cleared by `derive_state`; the
    ///   callback receives the literal filter value.
    /// - Nothing changed and a valid view is held: the callback receives the
    ///   current filter. Without a view, or with one still being replaced,
    ///   nothing happens.
    pub fn did_update(&mut self, prev: &FilterProps) -> Option<LoadRequest> {
        let current = &self.props.descriptor;
        if !current.has_filter() {
            self.notify_filter_applied();
            return None;
        }
        let previous = &prev.descriptor;
        if current.ruleset_id != previous.ruleset_id
            || current.connection != previous.connection
            || current.filter != previous.filter
        {
            return Some(self.issue_request());
        }
        let held_valid = self
            .state
            .filtered_view
            .as_ref()
            .is_some_and(|v| v.is_valid_for(current));
        if held_valid {
            self.notify_filter_applied();
        }
        None
    }

    /// What: Build the view for a request.
    ///
    /// Inputs:
    /// - `source`: Node source the view reads from
    /// - `request`: Request previously returned by `did_mount`/`did_update`
    ///
    /// Output:
    /// - The outcome to pass to [`Self::apply_loaded`]
    ///
    /// # Errors
    /// Propagates node source failures.
    pub async fn load(source: Arc<dyn NodeSource>, request: LoadRequest) -> Result<LoadOutcome> {
        let view = FilteredView::load(source, &request.descriptor).await?;
        Ok(LoadOutcome { request, view })
    }

    /// What: Offer a finished load to the controller.
    ///
    /// Inputs:
    /// - `outcome`: Result of [`Self::load`]
    ///
    /// Output:
    /// - `true` when the view was stored; `false` when it was stale
    ///
    /// Details:
    /// - Stale means the descriptor captured by the request no longer equals
    ///   the live descriptor.
    /// - On success the matches-counted callback receives the view's total
    ///   match count. Callers then run `did_update` with unchanged props to
    ///   report the applied filter.
    pub fn apply_loaded(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.request.descriptor != self.props.descriptor {
            tracing::debug!(
                requested = ?outcome.request.descriptor.filter,
                current = ?self.props.descriptor.filter,
                "discarding stale filtered view"
            );
            return false;
        }
        let count = outcome.view.count_matches();
        if let Some(cb) = self.on_matches_counted.as_mut() {
            cb(count);
        }
        tracing::debug!(
            filter = outcome.view.filter(),
            matches = count,
            "filtered view applied"
        );
        self.state.filtered_view = Some(Arc::new(outcome.view));
        true
    }

    /// What: Decide what the tree should show.
    ///
    /// Output:
    /// - [`RenderPlan`] computed from props and state only
    #[must_use]
    pub fn render_plan(&self) -> RenderPlan {
        let descriptor = &self.props.descriptor;
        let valid = self
            .state
            .filtered_view
            .as_ref()
            .filter(|v| v.is_valid_for(descriptor))
            .cloned();
        let highlighting = match (&valid, descriptor.filter_text()) {
            (Some(view), Some(text)) => Some(HighlightingProps {
                search_text: text.to_string(),
                active_match: view.locate_active_match(self.props.active_match_index),
            }),
            _ => None,
        };
        RenderPlan {
            in_progress_overlay: descriptor.has_filter() && valid.is_none(),
            filtered: valid,
            highlighting,
        }
    }

    /// Capture the live descriptor into a request.
    fn issue_request(&self) -> LoadRequest {
        tracing::debug!(
            ruleset = %self.props.descriptor.ruleset_id,
            filter = ?self.props.descriptor.filter,
            "requesting filtered view"
        );
        LoadRequest {
            descriptor: self.props.descriptor.clone(),
        }
    }

    /// Invoke the filter-applied callback, if any, with the literal filter.
    fn notify_filter_applied(&mut self) {
        if let Some(cb) = self.on_filter_applied.as_mut() {
            cb(self.props.descriptor.filter.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::state::{ConnectionId, FilteringData, NodePathElement, RulesetId};
    use crate::test_utils::{ScriptedSource, node};

    /// Recorded filter-applied calls.
    type Calls = Arc<Mutex<Vec<Option<String>>>>;

    fn desc(conn: &str, ruleset: &str, filter: Option<&str>) -> Descriptor {
        Descriptor::new(
            ConnectionId::new(conn),
            ruleset,
            filter.map(ToString::to_string),
        )
    }

    fn props(conn: &str, ruleset: &str, filter: Option<&str>) -> FilterProps {
        FilterProps::new(desc(conn, ruleset, filter))
    }

    fn controller(initial: FilterProps) -> (FilteringController, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let c = FilteringController::new(initial).with_on_filter_applied(move |f| {
            if let Ok(mut v) = sink.lock() {
                v.push(f.map(ToString::to_string));
            }
        });
        (c, calls)
    }

    fn recorded(calls: &Calls) -> Vec<Option<String>> {
        calls.lock().expect("calls lock").clone()
    }

    fn view_for(source: Arc<ScriptedSource>, d: &Descriptor) -> Arc<FilteredView> {
        Arc::new(FilteredView::new(
            source,
            d.connection.clone(),
            d.ruleset_id.clone(),
            d.filter.clone().unwrap_or_default(),
            Vec::new(),
        ))
    }

    fn matched(path: &[&str], matches: usize) -> NodePathElement {
        NodePathElement {
            node: node(path.last().copied().unwrap_or_default(), path, false),
            index: 0,
            is_marked_for_filtering: true,
            children: Vec::new(),
            filtering_data: Some(FilteringData {
                matches_count: matches,
                child_matches_count: 0,
            }),
        }
    }

    #[test]
    /// What: Filter change requests a new view without notifying
    ///
    /// - Input: Previous filter "previous filter", current "filter"
    /// - Output: Load request for the current descriptor; no callback
    fn did_update_requests_view_when_filter_changed() {
        let (mut c, calls) = controller(props("a", "1", Some("previous filter")));
        let prev = c.set_props(props("a", "1", Some("filter")));
        let req = c.did_update(&prev).expect("load requested");
        assert_eq!(req.descriptor, desc("a", "1", Some("filter")));
        assert!(recorded(&calls).is_empty());
    }

    #[test]
    /// What: Ruleset or connection change requests a new view without notifying
    fn did_update_requests_view_when_identity_changed() {
        let (mut c, calls) = controller(props("a", "other", Some("filter")));
        let prev = c.set_props(props("a", "1", Some("filter")));
        assert!(c.did_update(&prev).is_some());

        let prev = c.set_props(props("b", "1", Some("filter")));
        assert!(c.did_update(&prev).is_some());
        assert!(recorded(&calls).is_empty());
    }

    #[test]
    /// What: Empty filter clears the view and reports the literal empty string
    ///
    /// - Input: Identity changed and filter becomes ""
    /// - Output: No request, no view, callback once with Some("")
    fn did_update_empty_filter_clears_and_notifies() {
        let source = Arc::new(ScriptedSource::default());
        let (mut c, calls) = controller(props("a", "1", Some("filter")));
        c.replace_view(Some(view_for(source, &desc("a", "1", Some("filter")))));
        let prev = c.set_props(props("b", "2", Some("")));
        assert!(c.filtered_view().is_none());
        assert!(c.did_update(&prev).is_none());
        assert!(c.filtered_view().is_none());
        assert_eq!(recorded(&calls), vec![Some(String::new())]);
    }

    #[test]
    /// What: Absent filter is reported as `None`, not as an empty string
    fn did_update_absent_filter_reports_none() {
        let (mut c, calls) = controller(props("a", "1", Some("filter")));
        let prev = c.set_props(props("b", "2", None));
        assert!(c.did_update(&prev).is_none());
        assert_eq!(recorded(&calls), vec![None]);
    }

    #[test]
    /// What: Nothing changed and no view held does nothing
    fn did_update_unchanged_without_view_is_noop() {
        let (mut c, calls) = controller(props("a", "1", Some("filter")));
        let prev = c.set_props(props("a", "1", Some("filter")));
        assert!(c.did_update(&prev).is_none());
        assert!(c.filtered_view().is_none());
        assert!(recorded(&calls).is_empty());
    }

    #[test]
    /// What: Unchanged props with a valid view keep it and notify once per cycle
    ///
    /// - Input: Three identical update cycles
    /// - Output: Same view retained, three callbacks, never a request
    fn did_update_unchanged_with_valid_view_notifies_each_cycle() {
        let source = Arc::new(ScriptedSource::default());
        let d = desc("a", "1", Some("filter"));
        let (mut c, calls) = controller(FilterProps::new(d.clone()));
        let held = view_for(source, &d);
        c.replace_view(Some(held.clone()));
        for _ in 0..3 {
            let prev = c.set_props(FilterProps::new(d.clone()));
            assert!(c.did_update(&prev).is_none());
        }
        assert!(Arc::ptr_eq(c.filtered_view().expect("view held"), &held));
        assert_eq!(recorded(&calls).len(), 3);
        assert!(
            recorded(&calls)
                .iter()
                .all(|f| f.as_deref() == Some("filter"))
        );
    }

    #[test]
    /// What: Unchanged props with an outdated view wait silently for the rebuild
    fn did_update_unchanged_with_invalid_view_is_noop() {
        let source = Arc::new(ScriptedSource::default());
        let (mut c, calls) = controller(props("a", "1", Some("filter")));
        c.replace_view(Some(view_for(source, &desc("a", "1", Some("old")))));
        let prev = c.set_props(props("a", "1", Some("filter")));
        assert!(c.did_update(&prev).is_none());
        assert!(recorded(&calls).is_empty());
    }

    #[tokio::test]
    /// What: Mount with a filter loads a view and counts matches without notifying
    ///
    /// - Input: Filter "filter", source with two matching nodes (3 matches)
    /// - Output: View applied, matches callback receives 3, filter callback untouched
    async fn did_mount_with_filter_loads_view() {
        let source = Arc::new(ScriptedSource {
            filtered: vec![matched(&["x"], 1), matched(&["y"], 2)],
            ..Default::default()
        });
        let counted = Arc::new(Mutex::new(Vec::new()));
        let sink = counted.clone();
        let (c, calls) = controller(props("a", "1", Some("filter")));
        let mut c = c.with_on_matches_counted(move |n| {
            if let Ok(mut v) = sink.lock() {
                v.push(n);
            }
        });
        let req = c.did_mount().expect("load requested");
        let outcome = FilteringController::load(source.clone(), req)
            .await
            .expect("load");
        assert!(c.apply_loaded(outcome));
        assert!(c.filtered_view().is_some());
        assert_eq!(*counted.lock().expect("lock"), vec![3]);
        assert_eq!(source.filter_calls.load(Ordering::SeqCst), 1);
        assert!(recorded(&calls).is_empty());
    }

    #[test]
    /// What: Mount without a filter reports the literal value and requests nothing
    fn did_mount_without_filter_notifies() {
        let (mut c, calls) = controller(props("a", "1", Some("")));
        assert!(c.did_mount().is_none());
        assert_eq!(recorded(&calls), vec![Some(String::new())]);

        let (mut c, calls) = controller(props("a", "1", None));
        assert!(c.did_mount().is_none());
        assert_eq!(recorded(&calls), vec![None]);
    }

    #[test]
    /// What: Missing callback is simply skipped
    fn did_mount_without_callback_is_silent() {
        let mut c = FilteringController::new(props("a", "1", None));
        assert!(c.did_mount().is_none());
        assert!(c.filtered_view().is_none());
    }

    #[test]
    /// What: Derived state keeps the view for non-empty filters and clears it otherwise
    fn derive_state_clears_only_for_empty_filter() {
        let source = Arc::new(ScriptedSource::default());
        let state = FilterState {
            filtered_view: Some(view_for(source, &desc("a", "1", Some("filter")))),
        };
        let kept = FilteringController::derive_state(&props("a", "1", Some("filter")), &state);
        assert!(kept.filtered_view.is_some());
        let cleared = FilteringController::derive_state(&props("a", "1", Some("")), &state);
        assert!(cleared.filtered_view.is_none());
        let cleared = FilteringController::derive_state(&props("a", "1", None), &state);
        assert!(cleared.filtered_view.is_none());
    }

    #[tokio::test]
    /// What: Result of a superseded request is discarded on arrival
    ///
    /// - Input: Load issued for "filter", props change to "different filter" before applying
    /// - Output: `apply_loaded` refuses the outcome; no view held
    async fn stale_load_is_discarded() {
        let source = Arc::new(ScriptedSource::default());
        let mut c = FilteringController::new(props("a", "1", Some("filter")));
        let req = c.did_mount().expect("load requested");
        let pending = FilteringController::load(source, req);
        let prev = c.set_props(props("a", "1", Some("different filter")));
        let newer = c.did_update(&prev);
        assert!(newer.is_some());
        let outcome = pending.await.expect("load");
        assert!(!c.apply_loaded(outcome));
        assert!(c.filtered_view().is_none());
    }

    #[tokio::test]
    /// What: Filter emptied while a rebuild is pending
    ///
    /// - Input: Valid view for "previous"; update to "current" (request issued);
    ///   then "" before the request resolves
    /// - Output: No callback for the first transition; view cleared and callback
    ///   with "" for the second; the late result is discarded
    async fn emptied_filter_wins_over_pending_rebuild() {
        let source = Arc::new(ScriptedSource::default());
        let (mut c, calls) = controller(props("A", "1", Some("previous")));
        c.replace_view(Some(view_for(source.clone(), &desc("A", "1", Some("previous")))));

        let prev = c.set_props(props("A", "1", Some("current")));
        let req = c.did_update(&prev).expect("load requested");
        assert!(recorded(&calls).is_empty());
        let pending = FilteringController::load(source, req);

        let prev = c.set_props(props("A", "1", Some("")));
        assert!(c.filtered_view().is_none());
        assert!(c.did_update(&prev).is_none());
        assert_eq!(recorded(&calls), vec![Some(String::new())]);

        let outcome = pending.await.expect("load");
        assert!(!c.apply_loaded(outcome));
        assert!(c.filtered_view().is_none());
    }

    #[test]
    /// What: Overlay appears while the held view does not match the props
    ///
    /// - Input: Views differing in filter, ruleset, connection; and a matching one
    /// - Output: Overlay for each mismatch, filtered view exposed only when matching
    fn render_plan_overlay_tracks_validity() {
        let source = Arc::new(ScriptedSource::default());
        let current = props("a", "1", Some("filter"));
        for stale in [
            desc("a", "1", Some("different filter")),
            desc("a", "2", Some("filter")),
            desc("b", "1", Some("filter")),
        ] {
            let mut c = FilteringController::new(current.clone());
            c.replace_view(Some(view_for(source.clone(), &stale)));
            let plan = c.render_plan();
            assert!(plan.in_progress_overlay);
            assert!(plan.filtered.is_none());
            assert!(plan.highlighting.is_none());
        }
        let mut c = FilteringController::new(current.clone());
        c.replace_view(Some(view_for(source, &current.descriptor)));
        let plan = c.render_plan();
        assert!(!plan.in_progress_overlay);
        assert!(plan.filtered.is_some());
    }

    #[test]
    /// What: No overlay and no highlighting without a filter
    fn render_plan_without_filter() {
        for filter in [None, Some("")] {
            let c = FilteringController::new(props("a", "1", filter));
            let plan = c.render_plan();
            assert!(!plan.in_progress_overlay);
            assert!(plan.filtered.is_none());
            assert!(plan.highlighting.is_none());
        }
    }

    #[test]
    /// What: Highlighting carries the search text and the located active match
    ///
    /// - Input: Valid view with matches on "x" (1) and "y" (2), active index 2
    /// - Output: search_text "filter", active match on "y" at position 0
    fn render_plan_full_highlighting() {
        let source: Arc<dyn NodeSource> = Arc::new(ScriptedSource::default());
        let d = desc("a", "1", Some("filter"));
        let mut c = FilteringController::new(FilterProps {
            descriptor: d.clone(),
            active_match_index: 2,
        });
        c.replace_view(Some(Arc::new(FilteredView::new(
            source,
            d.connection.clone(),
            RulesetId::new("1"),
            "filter",
            vec![matched(&["x"], 1), matched(&["y"], 2)],
        ))));
        let plan = c.render_plan();
        assert_eq!(
            plan.highlighting,
            Some(HighlightingProps {
                search_text: "filter".into(),
                active_match: Some(ActiveMatchInfo {
                    node_id: "y".into(),
                    match_index: 0,
                }),
            })
        );
    }

    #[test]
    /// What: Initial props activate the first match only when a filter is given
    fn initial_props_activate_first_match() {
        let d = |f: Option<&str>| Descriptor::new(ConnectionId::new("a"), "1", f.map(str::to_string));
        assert_eq!(FilterProps::initial(d(Some("x"))).active_match_index, 1);
        assert_eq!(FilterProps::initial(d(Some(""))).active_match_index, 0);
        assert_eq!(FilterProps::initial(d(None)).active_match_index, 0);
    }
}
