use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crossterm::event::Event as CEvent;
use tokio::sync::mpsc;

use crate::logic::{LoadOutcome, LoadRequest};
use crate::state::AppNotice;

/// What: Channel definitions for runtime communication.
///
/// Details:
/// - Contains all channel senders and receivers used for communication
///   between the main event loop and background workers
pub struct Channels {
    pub event_tx: mpsc::UnboundedSender<CEvent>,
    pub event_rx: mpsc::UnboundedReceiver<CEvent>,
    pub event_thread_cancelled: Arc<AtomicBool>,
    pub load_req_tx: mpsc::UnboundedSender<LoadRequest>,
    pub load_req_rx: Option<mpsc::UnboundedReceiver<LoadRequest>>,
    pub load_res_tx: mpsc::UnboundedSender<LoadOutcome>,
    pub load_res_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    pub notice_tx: mpsc::UnboundedSender<AppNotice>,
    pub notice_rx: mpsc::UnboundedReceiver<AppNotice>,
    pub tick_tx: mpsc::UnboundedSender<()>,
    pub tick_rx: mpsc::UnboundedReceiver<()>,
}

impl Channels {
    /// Create every channel pair; the load request receiver is taken by the
    /// load worker when it is spawned.
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (load_req_tx, load_req_rx) = mpsc::unbounded_channel();
        let (load_res_tx, load_res_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        Self {
            event_tx,
            event_rx,
            event_thread_cancelled: Arc::new(AtomicBool::new(false)),
            load_req_tx,
            load_req_rx: Some(load_req_rx),
            load_res_tx,
            load_res_rx,
            notice_tx,
            notice_rx,
            tick_tx,
            tick_rx,
        }
    }
}
