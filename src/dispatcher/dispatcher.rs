/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, Error, FloorEvent, Request, RequestId, WorkerId};
use crate::status::StatusSink;

/**
 * Shared work queue between request sources and elevator workers.
 *
 * All mutable state sits behind one mutex. Two condition variables hang off it:
 * `work_available` wakes workers blocked in `take_next`, and `progress` wakes
 * anyone waiting for completions. Every wait re-checks its predicate in a loop.
 *
 * # Fields
 * - `state`:               Pending queue, in-flight table and counters.
 * - `work_available`:      Signalled on submit, and on completion (the run may have finished).
 * - `progress`:            Signalled on completion.
 * - `total_configured`:    Completions after which the run is finished. Fixed at construction.
 * - `top_floor`:           Highest floor a request may name, when known.
 * - `sink`:                Observer told about every completed request.
 * - `completion_tx`:       Feed of completed requests for the scheduler's NotifyFloor phase.
 *                          Owned by the caller; once its receiver is gone completions are only counted.
 */
pub struct Dispatcher {
    state: Mutex<DispatcherState>,
    work_available: Condvar,
    progress: Condvar,
    total_configured: u64,
    top_floor: Option<i32>,
    sink: Arc<dyn StatusSink>,
    completion_tx: cbc::Sender<Request>,
}

struct DispatcherState {
    pending: VecDeque<Request>,
    // One entry per busy worker: its current request followed by pickups claimed en route.
    in_flight: HashMap<WorkerId, VecDeque<Request>>,
    next_id: RequestId,
    total_submitted: u64,
    total_completed: u64,
}

/// Point-in-time copy of the dispatcher's bookkeeping.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DispatcherSnapshot {
    pub pending: Vec<RequestId>,
    pub in_flight: BTreeMap<WorkerId, Vec<RequestId>>,
    pub total_submitted: u64,
    pub total_completed: u64,
}

impl DispatcherState {
    fn is_finished(&self, total_configured: u64) -> bool {
        self.total_completed >= total_configured
    }
}

/***************************************/
/*             Public API              */
/***************************************/
impl Dispatcher {
    pub fn new(
        total_configured: u64,
        sink: Arc<dyn StatusSink>,
        completion_tx: cbc::Sender<Request>,
    ) -> Dispatcher {
        Dispatcher {
            state: Mutex::new(DispatcherState {
                pending: VecDeque::new(),
                in_flight: HashMap::new(),
                next_id: 1,
                total_submitted: 0,
                total_completed: 0,
            }),
            work_available: Condvar::new(),
            progress: Condvar::new(),
            total_configured,
            top_floor: None,
            sink,
            completion_tx,
        }
    }

    pub fn with_top_floor(mut self, top_floor: i32) -> Dispatcher {
        self.top_floor = Some(top_floor);
        self
    }

    /// Queues a request and wakes a waiting worker. Never blocks on anything but the lock.
    pub fn submit(&self, event: FloorEvent) -> Result<RequestId, Error> {
        event.validate(self.top_floor)?;

        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.pending.push_back(Request::from_event(id, event));
        state.total_submitted += 1;

        if state.total_submitted > self.total_configured {
            warn!(
                "Request {} is beyond the configured total of {}; it may never be served",
                id, self.total_configured
            );
        }
        debug!(
            "Submitted request {} ({} pending)",
            id,
            state.pending.len()
        );
        drop(state);

        self.work_available.notify_all();
        Ok(id)
    }

    /**
     * Blocks until there is a request for `worker` or the run is finished.
     *
     * Returns `None` once the configured number of requests has completed; the
     * worker loop exits on it.
     */
    pub fn take_next(&self, worker: WorkerId) -> Option<Request> {
        let mut state = self.lock();
        loop {
            if state.is_finished(self.total_configured) {
                debug!("Elevator {}: run finished, no more requests", worker);
                return None;
            }

            if let Some(mut request) = state.pending.pop_front() {
                debug_assert!(!state.in_flight.contains_key(&worker));
                request.assigned_worker = Some(worker);
                state
                    .in_flight
                    .entry(worker)
                    .or_default()
                    .push_back(request.clone());
                debug!("Elevator {}: took request {}", worker, request.id);
                return Some(request);
            }

            state = self
                .work_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /**
     * Lets a busy worker pick up the head of the queue when it originates on the
     * floor the worker is passing and travels the same way. Only the head is ever
     * offered, so hand-out order stays FIFO.
     */
    pub fn claim_pickup(
        &self,
        worker: WorkerId,
        floor: i32,
        direction: Direction,
    ) -> Option<Request> {
        let mut state = self.lock();
        if state.is_finished(self.total_configured) || !state.in_flight.contains_key(&worker) {
            return None;
        }

        match state.pending.front() {
            Some(head) if head.origin_floor == floor && head.direction == direction => {}
            _ => return None,
        }

        let mut request = state.pending.pop_front()?;
        request.assigned_worker = Some(worker);
        state
            .in_flight
            .entry(worker)
            .or_default()
            .push_back(request.clone());
        debug!(
            "Elevator {}: picked up request {} at floor {}",
            worker, request.id, floor
        );
        Some(request)
    }

    /// Finishes the request at the front of `worker`'s in-flight entry.
    pub fn complete(&self, worker: WorkerId) -> Result<Request, Error> {
        let mut state = self.lock();

        let stops = state
            .in_flight
            .get_mut(&worker)
            .ok_or(Error::NoRequestInFlight(worker))?;
        let mut request = stops.pop_front().ok_or(Error::NoRequestInFlight(worker))?;
        let more_floor_events = !stops.is_empty();
        if !more_floor_events {
            state.in_flight.remove(&worker);
        }

        request.arrived = true;
        state.total_completed += 1;
        debug!(
            "Elevator {}: completed request {} ({}/{})",
            worker, request.id, state.total_completed, state.total_submitted
        );
        // Published under the lock, so the feed is never behind the counter.
        if self.completion_tx.send(request.clone()).is_err() {
            debug!("No completion listener, request {} not fed", request.id);
        }
        drop(state);

        // Workers parked in take_next must re-check the finished condition too.
        self.work_available.notify_all();
        self.progress.notify_all();

        self.sink.on_request_complete(worker, &request, more_floor_events);
        Ok(request)
    }

    /// Waits until at least `target` requests have completed. Returns whether that happened in time.
    pub fn wait_for_completed(&self, target: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.total_completed < target {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .progress
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn completed_count(&self) -> u64 {
        self.lock().total_completed
    }

    pub fn submitted_count(&self) -> u64 {
        self.lock().total_submitted
    }

    pub fn total_configured(&self) -> u64 {
        self.total_configured
    }

    pub fn is_finished(&self) -> bool {
        self.lock().is_finished(self.total_configured)
    }

    pub fn snapshot(&self) -> DispatcherSnapshot {
        let state = self.lock();
        DispatcherSnapshot {
            pending: state.pending.iter().map(|r| r.id).collect(),
            in_flight: state
                .in_flight
                .iter()
                .map(|(worker, stops)| (*worker, stops.iter().map(|r| r.id).collect()))
                .collect(),
            total_submitted: state.total_submitted,
            total_completed: state.total_completed,
        }
    }

    pub fn sink(&self) -> Arc<dyn StatusSink> {
        Arc::clone(&self.sink)
    }

    fn lock(&self) -> MutexGuard<'_, DispatcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
