use ratatui::{
    Frame,
    prelude::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph},
};

use unicode_width::UnicodeWidthChar;

use crate::filtered::FilteredView;
use crate::logic::{HighlightingProps, RenderPlan};
use crate::state::{AppState, HierarchyEntry, Node, NodeKey};
use crate::util::match_ranges;

/// One visible line of the tree pane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeRow {
    /// Key of the node shown on this row.
    pub key: NodeKey,
    /// Node label.
    pub label: String,
    /// Nesting depth, `0` for roots.
    pub depth: usize,
    /// Whether the node has children (shown or not).
    pub has_children: bool,
}

/// What: Flatten whatever the tree should show into rows.
///
/// Inputs:
/// - `app`: Application state (unfiltered hierarchy, expand depth)
/// - `plan`: Render plan from the filtering controller
///
/// Output:
/// - Rows of the filtered view when the plan carries one, otherwise of the
///   unfiltered hierarchy limited to `app.expand_depth` levels
#[must_use]
pub fn visible_rows(app: &AppState, plan: &RenderPlan) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    if let Some(view) = &plan.filtered {
        for root in view.root_nodes() {
            push_view_rows(view, root, &mut rows);
        }
    } else {
        push_entry_rows(&app.hierarchy, 0, app.expand_depth, &mut rows);
    }
    rows
}

/// Append `node` and its filtered descendants, fully expanded.
fn push_view_rows(view: &FilteredView, node: Node, rows: &mut Vec<TreeRow>) {
    let children = if node.has_children {
        view.children(&node.key)
    } else {
        Vec::new()
    };
    rows.push(TreeRow {
        depth: node.key.depth(),
        has_children: node.has_children,
        label: node.label,
        key: node.key,
    });
    for child in children {
        push_view_rows(view, child, rows);
    }
}

/// Append rows for snapshot entries down to `max_depth` levels (`0` = all).
fn push_entry_rows(
    entries: &[HierarchyEntry<NodeKey>],
    depth: usize,
    max_depth: usize,
    rows: &mut Vec<TreeRow>,
) {
    for e in entries {
        rows.push(TreeRow {
            key: e.id.clone(),
            label: e.label.clone(),
            depth,
            has_children: !e.children.is_empty(),
        });
        if max_depth == 0 || depth + 1 < max_depth {
            push_entry_rows(&e.children, depth + 1, max_depth, rows);
        }
    }
}

/// What: Split a label into spans with matches emphasized.
///
/// Inputs:
/// - `row`: Row being drawn
/// - `highlighting`: Search text and active match, if any
/// - `case_sensitive`: Match letter case exactly
///
/// Output:
/// - Spans covering the whole label; the active match is reversed, other
///   matches are bold and underlined
#[must_use]
pub fn label_spans(
    row: &TreeRow,
    highlighting: Option<&HighlightingProps>,
    case_sensitive: bool,
) -> Vec<Span<'static>> {
    let Some(hl) = highlighting else {
        return vec![Span::raw(row.label.clone())];
    };
    let active_here = hl
        .active_match
        .as_ref()
        .filter(|m| m.node_id == row.key.id())
        .map(|m| m.match_index);
    let match_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let active_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    let mut cursor = 0;
    for (i, (start, end)) in match_ranges(&row.label, &hl.search_text, case_sensitive)
        .into_iter()
        .enumerate()
    {
        if start > cursor {
            spans.push(Span::raw(row.label[cursor..start].to_string()));
        }
        let style = if active_here == Some(i) {
            active_style
        } else {
            match_style
        };
        spans.push(Span::styled(row.label[start..end].to_string(), style));
        cursor = end;
    }
    if cursor < row.label.len() {
        spans.push(Span::raw(row.label[cursor..].to_string()));
    }
    spans
}

/// What: Clip styled spans to at most `max_width` terminal columns.
///
/// Inputs:
/// - `spans`: Spans of one label, in order
/// - `max_width`: Available columns
///
/// Output:
/// - Spans that fit, keeping their styles; an ellipsis in the style of the
///   cut span takes the last column when clipped
#[must_use]
pub fn clip_spans(spans: Vec<Span<'static>>, max_width: usize) -> Vec<Span<'static>> {
    let total: usize = spans.iter().map(Span::width).sum();
    if total <= max_width {
        return spans;
    }
    if max_width == 0 {
        return Vec::new();
    }
    let budget = max_width - 1;
    let mut used = 0;
    let mut out = Vec::new();
    for span in spans {
        let mut kept = String::new();
        let mut cut = false;
        for c in span.content.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > budget {
                cut = true;
                break;
            }
            used += w;
            kept.push(c);
        }
        if !kept.is_empty() {
            out.push(Span::styled(kept, span.style));
        }
        if cut {
            out.push(Span::styled("…", span.style));
            break;
        }
    }
    out
}

/// Render the tree pane, plus the progress overlay while filtering.
///
/// Keeps the selection inside the visible rows and titles the pane with the
/// ruleset and, once known, the match total.
pub fn render_tree(f: &mut Frame, app: &mut AppState, area: Rect) {
    let plan = app.filtering.render_plan();
    let rows = visible_rows(app, &plan);

    if rows.is_empty() {
        app.selected = 0;
        app.list_state.select(None);
    } else {
        app.selected = app.selected.min(rows.len() - 1);
        app.list_state.select(Some(app.selected));
    }

    let label_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let marker = if row.has_children { "▾ " } else { "  " };
            let indent = "  ".repeat(row.depth);
            let mut spans = vec![Span::styled(
                format!("{indent}{marker}"),
                Style::default().fg(Color::DarkGray),
            )];
            let room = label_width.saturating_sub(indent.len() + 2);
            spans.extend(clip_spans(
                label_spans(row, plan.highlighting.as_ref(), app.case_sensitive),
                room,
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let descriptor = app.descriptor();
    let mut title = format!(" {} · {} ", descriptor.connection, descriptor.ruleset_id);
    if plan.filtered.is_some()
        && let Some(n) = app.match_count
    {
        title.push_str(&format!("· {n} matches "));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.list_state);

    if plan.in_progress_overlay {
        render_overlay(f, area);
    }
}

/// Small centered box telling the user the filter is still being applied.
fn render_overlay(f: &mut Frame, area: Rect) {
    let width = 16.min(area.width);
    let height = 3.min(area.height);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    f.render_widget(Clear, rect);
    let overlay = Paragraph::new(Line::from(Span::styled(
        "Filtering…",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(overlay, rect);
}

/// Render the single-line filter input with key hints.
pub fn render_filter_input(f: &mut Frame, app: &AppState, area: Rect) {
    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(app.input.clone()),
    ]))
    .block(
        Block::default()
            .title(" Filter (Esc clear · Ctrl-N/Ctrl-P match · Ctrl-C quit) ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(input, area);
}
