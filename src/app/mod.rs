//! Interactive runtime: terminal setup, background workers and the event loop.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crossterm::event::Event as CEvent;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::select;

use crate::logic::{FilterProps, FilteringController, HierarchyBuilder};
use crate::sources::{JsonNodeSource, NodeSource};
use crate::state::{AppNotice, AppState, Descriptor, Node, RulesetId};
use crate::ui::ui;
use crate::util::config::Settings;

mod channels;
pub mod handlers;
mod terminal;
mod workers;

use channels::Channels;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Interval of the debounce tick.
const TICK_MS: u64 = 50;

/// What: Run the interactive browser until the user quits.
///
/// Inputs:
/// - `settings`: Loaded settings (debounce, case sensitivity, expand depth)
/// - `source`: Loaded node document
/// - `ruleset`: Ruleset to browse
/// - `initial_filter`: Filter applied on mount
///
/// Output:
/// - `Ok(())` on normal exit
///
/// Details:
/// - Materializes the unfiltered hierarchy once up front.
/// - The terminal is restored even when the loop fails.
///
/// # Errors
/// Fails when the hierarchy cannot be built or the terminal cannot be driven.
pub async fn run(
    settings: &Settings,
    source: Arc<JsonNodeSource>,
    ruleset: RulesetId,
    initial_filter: Option<String>,
) -> Result<()> {
    let connection = source.connection().clone();
    let hierarchy = HierarchyBuilder::with_mapper(source.clone(), connection.clone(), |n: &Node| {
        n.key.clone()
    })
    .create_hierarchy(ruleset.clone())
    .await?;
    tracing::info!(
        connection = %connection,
        ruleset = %ruleset,
        roots = hierarchy.len(),
        "hierarchy loaded"
    );

    let mut channels = Channels::new();
    let applied_tx = channels.notice_tx.clone();
    let counted_tx = channels.notice_tx.clone();
    let controller = FilteringController::new(FilterProps::initial(Descriptor::new(
        connection,
        ruleset,
        initial_filter,
    )))
    .with_on_filter_applied(move |f| {
        let _ = applied_tx.send(AppNotice::FilterApplied(f.map(str::to_string)));
    })
    .with_on_matches_counted(move |n| {
        let _ = counted_tx.send(AppNotice::MatchesCounted(n));
    });
    let mut app = AppState::new(controller, hierarchy);
    app.expand_depth = settings.expand_depth;
    app.case_sensitive = settings.case_sensitive_filter;

    let dyn_source: Arc<dyn NodeSource> = source;
    if let Some(req_rx) = channels.load_req_rx.take() {
        workers::spawn_load_worker(dyn_source, req_rx, channels.load_res_tx.clone());
    }
    workers::spawn_tick_worker(channels.tick_tx.clone(), Duration::from_millis(TICK_MS));
    workers::spawn_event_thread(
        channels.event_tx.clone(),
        channels.event_thread_cancelled.clone(),
    );

    if let Some(request) = app.filtering.did_mount() {
        let _ = channels.load_req_tx.send(request);
    }

    terminal::setup_terminal()?;
    let result = event_loop(&mut app, &mut channels, settings).await;
    channels.event_thread_cancelled.store(true, Ordering::Relaxed);
    if let Err(e) = terminal::restore_terminal() {
        tracing::warn!(error = %e, "failed to restore terminal");
    }
    result
}

/// Draw, then wait for the next event from any channel, until quit.
async fn event_loop(app: &mut AppState, channels: &mut Channels, settings: &Settings) -> Result<()> {
    let mut term = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
    term.clear()?;
    let debounce = Duration::from_millis(settings.filter_debounce_ms);
    loop {
        while let Ok(notice) = channels.notice_rx.try_recv() {
            app.apply_notice(notice);
        }
        term.draw(|f| ui(f, app))?;
        if app.should_quit {
            break;
        }
        select! {
            Some(ev) = channels.event_rx.recv() => {
                if let CEvent::Key(key) = ev {
                    handlers::handle_key(app, key, &channels.load_req_tx);
                }
            }
            Some(outcome) = channels.load_res_rx.recv() => {
                handlers::handle_load_outcome(app, outcome);
            }
            Some(()) = channels.tick_rx.recv() => {
                handlers::handle_tick(app, Instant::now(), debounce, &channels.load_req_tx);
            }
            else => break,
        }
    }
    tracing::info!("event loop finished");
    Ok(())
}
