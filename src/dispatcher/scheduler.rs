/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::dispatcher::Dispatcher;
use crate::shared::{FloorEvent, Request, RequestId};

/***************************************/
/*               Enums                 */
/***************************************/

/// What the scheduler tells the floor side about its requests.
#[derive(Debug, Clone, PartialEq)]
pub enum FloorNotice {
    Accepted(RequestId, FloorEvent),
    Rejected(FloorEvent, String),
    Completed(Request),
}

#[derive(Debug, Clone, PartialEq)]
enum SchedulerState {
    WaitingForFloorEvent,
    NotifyElevator(FloorEvent),
    NotifyFloor,
    Finished,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub accepted: u64,
    pub rejected: u64,
    pub completed: u64,
}

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Drives the hand-off between floors and elevators.
 *
 * Cycle: `WaitingForFloorEvent -> NotifyElevator -> NotifyFloor -> WaitingForFloorEvent`.
 * A floor event is submitted to the dispatcher in `NotifyElevator`, which wakes a
 * worker. Completions published by the dispatcher are forwarded back to the
 * floor side in `NotifyFloor`, which is also where a finished run is noticed.
 * A single thread runs the machine, so at most one hand-off is in progress at a
 * time.
 *
 * # Fields
 * - `dispatcher`:          Shared queue the requests are handed to.
 * - `floor_event_rx`:      Receives floor events from the request sources.
 * - `floor_notice_tx`:     Sends acceptance, rejection and completion notices back.
 * - `completion_rx`:       Completed requests published by the dispatcher.
 * - `terminate_rx`:        Stops the scheduler early.
 */
pub struct Scheduler {
    dispatcher: Arc<Dispatcher>,
    floor_event_rx: cbc::Receiver<FloorEvent>,
    floor_notice_tx: cbc::Sender<FloorNotice>,
    completion_rx: cbc::Receiver<Request>,
    terminate_rx: cbc::Receiver<()>,

    outbox: Vec<FloorNotice>,
    sources_closed: bool,
    summary: SchedulerSummary,
}

impl Scheduler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        floor_event_rx: cbc::Receiver<FloorEvent>,
        floor_notice_tx: cbc::Sender<FloorNotice>,
        completion_rx: cbc::Receiver<Request>,
        terminate_rx: cbc::Receiver<()>,
    ) -> Scheduler {
        Scheduler {
            dispatcher,
            floor_event_rx,
            floor_notice_tx,
            completion_rx,
            terminate_rx,
            outbox: Vec::new(),
            sources_closed: false,
            summary: SchedulerSummary::default(),
        }
    }

    pub fn run(mut self) -> SchedulerSummary {
        // A run configured for zero requests is finished before anything arrives
        let mut state = SchedulerState::NotifyFloor;
        while state != SchedulerState::Finished {
            state = self.step(state);
        }
        info!(
            "Scheduler finished: {} accepted, {} rejected, {} completed",
            self.summary.accepted, self.summary.rejected, self.summary.completed
        );
        self.summary
    }

    fn step(&mut self, state: SchedulerState) -> SchedulerState {
        match state {
            SchedulerState::WaitingForFloorEvent => self.wait_for_floor_event(),
            SchedulerState::NotifyElevator(event) => self.notify_elevator(event),
            SchedulerState::NotifyFloor => self.notify_floor(),
            SchedulerState::Finished => SchedulerState::Finished,
        }
    }

    fn wait_for_floor_event(&mut self) -> SchedulerState {
        // A closed source channel would otherwise be selected forever.
        let never = cbc::never();
        let floor_event_rx = if self.sources_closed {
            &never
        } else {
            &self.floor_event_rx
        };

        cbc::select! {
            recv(floor_event_rx) -> event => match event {
                Ok(event) => SchedulerState::NotifyElevator(event),
                Err(_) => {
                    debug!("All request sources closed");
                    self.sources_closed = true;
                    SchedulerState::NotifyFloor
                }
            },
            recv(self.completion_rx) -> request => match request {
                Ok(request) => {
                    self.outbox.push(FloorNotice::Completed(request));
                    SchedulerState::NotifyFloor
                }
                Err(_) => SchedulerState::Finished,
            },
            recv(self.terminate_rx) -> _ => SchedulerState::Finished,
        }
    }

    fn notify_elevator(&mut self, event: FloorEvent) -> SchedulerState {
        match self.dispatcher.submit(event.clone()) {
            Ok(id) => {
                self.summary.accepted += 1;
                self.outbox.push(FloorNotice::Accepted(id, event));
            }
            Err(e) => {
                warn!("Floor event rejected: {}", e);
                self.summary.rejected += 1;
                self.outbox.push(FloorNotice::Rejected(event, e.to_string()));
            }
        }
        SchedulerState::NotifyFloor
    }

    fn notify_floor(&mut self) -> SchedulerState {
        for request in self.completion_rx.try_iter() {
            self.outbox.push(FloorNotice::Completed(request));
        }

        for notice in self.outbox.drain(..) {
            if let FloorNotice::Completed(_) = notice {
                self.summary.completed += 1;
            }
            if self.floor_notice_tx.send(notice).is_err() {
                debug!("Floor side no longer listening");
            }
        }

        if self.dispatcher.is_finished() && self.completion_rx.is_empty() {
            SchedulerState::Finished
        } else {
            SchedulerState::WaitingForFloorEvent
        }
    }
}
