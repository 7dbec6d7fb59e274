//! Debounced persistence of the editor's diagram.
//!
//! Every canonical-state change re-arms a single debounce timer; only the
//! last one in a burst fires. A firing timer asks the controller for a
//! `SaveRequest`, which is a create until the store has assigned an id and
//! an update of that id afterwards.
//!
//! At most one save is in flight. A request made while saving is dropped,
//! not queued: the next edit re-arms the timer, and that save carries the
//! latest state. Failures are logged and picked up the same way.

use crate::store::{DiagramStore, StoreError};
use flow_core::{DiagramId, FlowGraph, GraphData};
use std::time::Duration;

/// Handle of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Arms and cancels one-shot timers. When a timer expires the host hands
/// its id back to the editor (`EditorSession::on_timer`).
pub trait Scheduler {
    fn arm(&mut self, delay: Duration) -> TimerId;
    fn cancel(&mut self, timer: TimerId);
}

/// Scheduler driven by an explicit virtual clock.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    /// Armed timers and their deadlines.
    armed: Vec<(TimerId, Duration)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn armed(&self) -> usize {
        self.armed.len()
    }

    pub fn is_armed(&self, timer: TimerId) -> bool {
        self.armed.iter().any(|(t, _)| *t == timer)
    }

    /// Move the clock forward and return the timers that expired, earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerId> {
        self.now += by;
        let now = self.now;
        let mut due: Vec<(TimerId, Duration)> = Vec::new();
        self.armed.retain(|&(timer, deadline)| {
            if deadline <= now {
                due.push((timer, deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(timer, deadline)| (deadline, timer));
        due.into_iter().map(|(timer, _)| timer).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&mut self, delay: Duration) -> TimerId {
        let timer = TimerId(self.next_id);
        self.next_id += 1;
        self.armed.push((timer, self.now + delay));
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        self.armed.retain(|(t, _)| *t != timer);
    }
}

/// A persistence call the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create { name: String, graph: GraphData },
    Update { id: DiagramId, name: String, graph: GraphData },
}

impl SaveRequest {
    /// Issue this request against `store`, returning the diagram's id.
    pub fn execute(&self, store: &mut dyn DiagramStore) -> Result<DiagramId, StoreError> {
        match self {
            SaveRequest::Create { name, graph } => store.create(name, graph),
            SaveRequest::Update { id, name, graph } => {
                store.update(*id, Some(name), Some(graph))?;
                Ok(*id)
            }
        }
    }
}

/// Result of a save attempt, for the presentation layer to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Created(DiagramId),
    Updated(DiagramId),
    /// Another save was in flight.
    Skipped,
    Failed(String),
}

/// Autosave controller state.
#[derive(Debug)]
pub struct Autosave {
    delay: Duration,
    pending: Option<TimerId>,
    resource_id: Option<DiagramId>,
    saving: bool,
}

impl Autosave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            resource_id: None,
            saving: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn resource_id(&self) -> Option<DiagramId> {
        self.resource_id
    }

    /// Adopt the id of a diagram loaded from the store.
    pub fn set_resource_id(&mut self, id: Option<DiagramId>) {
        self.resource_id = id;
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    /// Cancel any pending timer and arm a fresh one.
    pub fn schedule(&mut self, scheduler: &mut dyn Scheduler) {
        self.cancel_pending(scheduler);
        let timer = scheduler.arm(self.delay);
        log::trace!("autosave armed {timer:?} for {:?}", self.delay);
        self.pending = Some(timer);
    }

    pub fn cancel_pending(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(timer) = self.pending.take() {
            scheduler.cancel(timer);
        }
    }

    /// A timer expired. Returns whether a save is due now: stale timers
    /// are ignored, and an expiry during an in-flight save is dropped.
    pub fn fire(&mut self, timer: TimerId) -> bool {
        if self.pending != Some(timer) {
            log::trace!("ignoring stale autosave timer {timer:?}");
            return false;
        }
        self.pending = None;
        if self.saving {
            log::debug!("autosave due while a save is in flight, dropping");
            return false;
        }
        true
    }

    /// Start a save of `graph` under `name`. `None` while another save is
    /// in flight.
    pub fn begin(&mut self, name: &str, graph: &FlowGraph) -> Option<SaveRequest> {
        if self.saving {
            log::debug!("save requested while saving, dropping");
            return None;
        }
        self.saving = true;
        let graph = graph.to_data();
        let name = name.to_string();
        Some(match self.resource_id {
            Some(id) => SaveRequest::Update { id, name, graph },
            None => SaveRequest::Create { name, graph },
        })
    }

    /// Complete the in-flight save. Always clears the saving flag; a
    /// successful create pins the returned id for later updates.
    pub fn finish(&mut self, request: &SaveRequest, result: Result<DiagramId, StoreError>) -> SaveStatus {
        self.saving = false;
        match (request, result) {
            (SaveRequest::Create { name, .. }, Ok(id)) => {
                log::info!("created diagram {id} ({name})");
                self.resource_id = Some(id);
                SaveStatus::Created(id)
            }
            (SaveRequest::Update { .. }, Ok(id)) => {
                log::info!("saved diagram {id}");
                SaveStatus::Updated(id)
            }
            (_, Err(err)) => {
                log::warn!("autosave failed, will retry on next change: {err}");
                SaveStatus::Failed(err.to_string())
            }
        }
    }

    /// Begin, execute against `store`, and finish in one step.
    pub fn perform(&mut self, name: &str, graph: &FlowGraph, store: &mut dyn DiagramStore) -> SaveStatus {
        let Some(request) = self.begin(name, graph) else {
            return SaveStatus::Skipped;
        };
        let result = request.execute(store);
        self.finish(&request, result)
    }
}
