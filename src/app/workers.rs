use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::Event as CEvent;
use tokio::sync::mpsc;

use crate::logic::{FilteringController, LoadOutcome, LoadRequest};
use crate::sources::NodeSource;

/// What: Spawn the worker that builds filtered views.
///
/// Inputs:
/// - `source`: Node source the views read from
/// - `req_rx`: Load requests issued by the controller
/// - `res_tx`: Finished loads, handed back to the event loop
///
/// Details:
/// - Each request runs in its own task, so a slow load never delays a newer
///   one; the event loop discards whichever outcome is stale.
/// - Failed loads are logged and dropped.
pub fn spawn_load_worker(
    source: Arc<dyn NodeSource>,
    mut req_rx: mpsc::UnboundedReceiver<LoadRequest>,
    res_tx: mpsc::UnboundedSender<LoadOutcome>,
) {
    tokio::spawn(async move {
        while let Some(request) = req_rx.recv().await {
            let source = source.clone();
            let tx = res_tx.clone();
            tokio::spawn(async move {
                let filter = request.descriptor.filter.clone();
                match FilteringController::load(source, request).await {
                    Ok(outcome) => {
                        let _ = tx.send(outcome);
                    }
                    Err(e) => {
                        tracing::warn!(filter = ?filter, error = %e, "filtered view load failed");
                    }
                }
            });
        }
        tracing::debug!("load worker stopped");
    });
}

/// What: Spawn the periodic tick used for input debouncing.
///
/// Inputs:
/// - `tick_tx`: Channel receiving one `()` per tick
/// - `every`: Tick interval
pub fn spawn_tick_worker(tick_tx: mpsc::UnboundedSender<()>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if tick_tx.send(()).is_err() {
                break;
            }
        }
    });
}

/// What: Forward terminal events from a blocking thread into the event loop.
///
/// Inputs:
/// - `event_tx`: Channel receiving crossterm events
/// - `cancelled`: Flag checked between polls to stop the thread
///
/// Details:
/// - Polls with a short timeout so the thread notices cancellation promptly.
pub fn spawn_event_thread(event_tx: mpsc::UnboundedSender<CEvent>, cancelled: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        loop {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            match crossterm::event::poll(Duration::from_millis(50)) {
                Ok(true) => match crossterm::event::read() {
                    Ok(ev) => {
                        if cancelled.load(Ordering::Relaxed) || event_tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "terminal read failed"),
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "terminal poll failed; stopping event thread");
                    break;
                }
            }
        }
    });
}
