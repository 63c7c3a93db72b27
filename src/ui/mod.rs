//! Terminal rendering of the browser.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::state::AppState;

pub mod tree;

/// Draw the whole screen: tree pane on top, filter input below.
pub fn ui(f: &mut Frame, app: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(f.area());
    tree::render_tree(f, app, chunks[0]);
    tree::render_filter_input(f, app, chunks[1]);
}
