//! `Scheduler` backed by the tokio timer wheel.
//!
//! Each armed timer is a spawned task that sleeps and then sends its
//! `TimerId` on a channel. The host loop receives ids from that channel and
//! passes them to `EditorSession::on_timer`. `arm` must be called from within
//! a tokio runtime.

use crate::autosave::{Scheduler, TimerId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct TokioScheduler {
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
    fired: UnboundedSender<TimerId>,
}

impl TokioScheduler {
    /// Create a scheduler and the receiver its timers fire into.
    pub fn new() -> (Self, UnboundedReceiver<TimerId>) {
        let (fired, rx) = unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            tasks: HashMap::new(),
            fired,
        };
        (scheduler, rx)
    }

    /// Timers armed and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn arm(&mut self, delay: Duration) -> TimerId {
        self.tasks.retain(|_, handle| !handle.is_finished());

        let timer = TimerId(self.next_id);
        self.next_id += 1;
        let fired = self.fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone once the host loop has shut down.
            let _ = fired.send(timer);
        });
        self.tasks.insert(timer, handle);
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(handle) = self.tasks.remove(&timer) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}
