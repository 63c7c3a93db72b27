//! Event handlers mutating `AppState` on behalf of the event loop.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::logic::{FilterProps, LoadOutcome, LoadRequest};
use crate::state::AppState;

/// What: Push new props into the controller and forward any load request.
///
/// Inputs:
/// - `app`: Application state
/// - `props`: Props for the next update cycle
/// - `load_req_tx`: Channel to the load worker
///
/// Details:
/// - `set_props` runs the derived-state rule before `did_update` decides on
///   effects, so clearing the filter drops the view immediately.
pub fn update_props(
    app: &mut AppState,
    props: FilterProps,
    load_req_tx: &mpsc::UnboundedSender<LoadRequest>,
) {
    let prev = app.filtering.set_props(props);
    if let Some(request) = app.filtering.did_update(&prev) {
        let _ = load_req_tx.send(request);
    }
}

/// Apply the typed filter text right away.
pub fn commit_input(app: &mut AppState, load_req_tx: &mpsc::UnboundedSender<LoadRequest>) {
    app.input_dirty = false;
    let props = app.props_from_input();
    update_props(app, props, load_req_tx);
}

/// What: Commit the input once it has been quiet for `debounce`.
///
/// Inputs:
/// - `app`: Application state
/// - `now`: Current instant
/// - `debounce`: Quiet period after the last keystroke
/// - `load_req_tx`: Channel to the load worker
pub fn handle_tick(
    app: &mut AppState,
    now: Instant,
    debounce: Duration,
    load_req_tx: &mpsc::UnboundedSender<LoadRequest>,
) {
    if app.input_dirty && now.duration_since(app.last_input_change) >= debounce {
        commit_input(app, load_req_tx);
    }
}

/// What: Offer a finished load to the controller.
///
/// Inputs:
/// - `app`: Application state
/// - `outcome`: Result from the load worker
///
/// Details:
/// - Stale outcomes are dropped by the controller.
/// - An applied view triggers one more update cycle with unchanged props,
///   which reports the applied filter through the callback.
pub fn handle_load_outcome(app: &mut AppState, outcome: LoadOutcome) {
    if app.filtering.apply_loaded(outcome) {
        app.selected = 0;
        let same = app.filtering.props().clone();
        let request = app.filtering.did_update(&same);
        debug_assert!(request.is_none());
    }
}

/// Move the active match by `delta`, wrapping around the known match count.
fn step_active_match(
    app: &mut AppState,
    delta: isize,
    load_req_tx: &mpsc::UnboundedSender<LoadRequest>,
) {
    let Some(total) = app.match_count.filter(|n| *n > 0) else {
        return;
    };
    let mut props = app.filtering.props().clone();
    let current = props.active_match_index.clamp(1, total);
    props.active_match_index = if delta >= 0 {
        if current >= total { 1 } else { current + 1 }
    } else if current <= 1 {
        total
    } else {
        current - 1
    };
    update_props(app, props, load_req_tx);
}

/// What: Handle one key press.
///
/// Inputs:
/// - `app`: Application state
/// - `key`: Key event from crossterm
/// - `load_req_tx`: Channel to the load worker
///
/// Details:
/// - Printable characters and Backspace edit the filter (debounced).
/// - Enter commits immediately, Esc clears the filter immediately.
/// - Ctrl-N / Ctrl-P step through matches, Up/Down move the selection.
/// - Ctrl-C and Ctrl-Q quit.
pub fn handle_key(
    app: &mut AppState,
    key: KeyEvent,
    load_req_tx: &mpsc::UnboundedSender<LoadRequest>,
) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => app.should_quit = true,
        KeyCode::Char('n') if ctrl => step_active_match(app, 1, load_req_tx),
        KeyCode::Char('p') if ctrl => step_active_match(app, -1, load_req_tx),
        KeyCode::Char(c) if !ctrl => {
            app.input.push(c);
            app.input_dirty = true;
            app.last_input_change = Instant::now();
        }
        KeyCode::Backspace => {
            if app.input.pop().is_some() {
                app.input_dirty = true;
                app.last_input_change = Instant::now();
            }
        }
        KeyCode::Enter => commit_input(app, load_req_tx),
        KeyCode::Esc => {
            app.input.clear();
            commit_input(app, load_req_tx);
        }
        KeyCode::Up => app.selected = app.selected.saturating_sub(1),
        KeyCode::Down => app.selected = app.selected.saturating_add(1),
        _ => {}
    }
}
