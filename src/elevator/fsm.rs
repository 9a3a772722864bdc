/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, error, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ElevatorConfig;
use crate::dispatcher::Dispatcher;
use crate::elevator::door::{DoorOutcome, DoorTimers};
use crate::shared::{Direction, DoorState, Error, Fault, MachineState, Request, WorkerId};
use crate::status::{StatusEvent, StatusSink};

/**
 * One elevator car, run on its own thread.
 *
 * The worker blocks on `Dispatcher::take_next`, walks the request through the
 * state machine and reports it with `Dispatcher::complete`. All fields are
 * owned by the worker thread; only the dispatcher is shared.
 *
 * # Fields
 * - `id`:                  Worker id used in the dispatcher's in-flight table.
 * - `dispatcher`:          Shared queue requests are taken from and completed to.
 * - `sink`:                Observer told about every state transition.
 * - `door_timers`:         Close/fault timer pair raced while the doors are open.
 * - `floor_travel`:        Time to travel one floor.
 * - `en_route_pickups`:    Whether to claim matching requests at floors passed.
 * - `current_floor`:       Floor the car is at, or last passed.
 * - `direction`:           Direction of travel, `None` when idle.
 * - `door_state`:          Door position.
 * - `fault_state`:         Fault still to be met while serving the current request.
 * - `machine_state`:       Current state of the machine.
 * - `stops`:               Current request at the front, pickups claimed en route behind it.
 * - `picked_up`:           Whether the front request's passengers are on board.
 */
pub struct ElevatorWorker {
    id: WorkerId,
    dispatcher: Arc<Dispatcher>,
    sink: Arc<dyn StatusSink>,
    door_timers: DoorTimers,
    floor_travel: Duration,
    en_route_pickups: bool,

    current_floor: i32,
    direction: Option<Direction>,
    door_state: DoorState,
    fault_state: Fault,
    machine_state: MachineState,
    stops: VecDeque<Request>,
    picked_up: bool,
    completed: u64,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker: WorkerId,
    pub completed: u64,
    pub final_floor: i32,
}

impl ElevatorWorker {
    pub fn new(id: WorkerId, config: &ElevatorConfig, dispatcher: Arc<Dispatcher>) -> ElevatorWorker {
        let sink = dispatcher.sink();
        ElevatorWorker {
            id,
            dispatcher,
            sink,
            door_timers: DoorTimers::from_config(config),
            floor_travel: config.floor_travel(),
            en_route_pickups: config.en_route_pickups,
            current_floor: config.initial_floor,
            direction: None,
            door_state: DoorState::Closed,
            fault_state: Fault::NoFault,
            machine_state: MachineState::WaitingForRequest,
            stops: VecDeque::new(),
            picked_up: false,
            completed: 0,
        }
    }

    /// Serves requests until the dispatcher reports the run finished.
    pub fn run(mut self) -> Result<WorkerSummary, Error> {
        self.publish();

        loop {
            let next = match self.machine_state {
                MachineState::WaitingForRequest => match self.dispatcher.take_next(self.id) {
                    Some(request) => self.accept(request),
                    None => break,
                },
                MachineState::MovingBetweenFloors => self.travel()?,
                MachineState::DoorsOpening => self.open_doors()?,
                MachineState::DoorsNotClosing => self.force_close(),
                MachineState::DoorsClosing => self.close_doors(),
                MachineState::ReachedDestination => self.reach_destination(),
                MachineState::NotifyScheduler => self.notify_scheduler()?,
            };
            self.enter(next);
        }

        debug!("Elevator {}: stopping after {} requests", self.id, self.completed);
        Ok(WorkerSummary {
            worker: self.id,
            completed: self.completed,
            final_floor: self.current_floor,
        })
    }

    fn enter(&mut self, next: MachineState) {
        match next {
            MachineState::DoorsOpening => self.door_state = DoorState::Opening,
            MachineState::DoorsNotClosing => self.door_state = DoorState::Open,
            MachineState::DoorsClosing => self.door_state = DoorState::Closing,
            MachineState::MovingBetweenFloors => debug_assert_eq!(self.door_state, DoorState::Closed),
            _ => {}
        }
        self.machine_state = next;
        self.publish();
    }

    fn publish(&self) {
        self.sink.on_transition(&StatusEvent {
            worker: self.id,
            state: self.machine_state,
            floor: self.current_floor,
            direction: self.direction,
            door: self.door_state,
            request: self.stops.front().map(|r| r.id),
            more_stops: self.has_more_stops(),
        });
    }

    fn has_more_stops(&self) -> bool {
        self.stops.len() > 1
    }

    // Floor the car is heading for: the origin until the passengers are picked
    // up, then the destination.
    fn target_floor(&self) -> Option<i32> {
        let request = self.stops.front()?;
        if self.picked_up {
            Some(request.destination_floor)
        } else {
            Some(request.origin_floor)
        }
    }

    fn accept(&mut self, request: Request) -> MachineState {
        debug!(
            "Elevator {}: request {} from floor {} to {}",
            self.id, request.id, request.origin_floor, request.destination_floor
        );
        let origin = request.origin_floor;
        self.start_request(request);

        if self.current_floor == origin {
            MachineState::DoorsOpening
        } else {
            MachineState::MovingBetweenFloors
        }
    }

    fn start_request(&mut self, request: Request) {
        self.fault_state = request.fault;
        self.picked_up = false;
        self.stops.push_back(request);
    }

    fn halt(&self, fault: Fault) -> Error {
        let request = self.stops.front().map_or(0, |r| r.id);
        error!(
            "Elevator {}: {} while serving request {}, halting",
            self.id, fault, request
        );
        Error::UnrecoverableFault {
            worker: self.id,
            request,
            fault,
        }
    }

    fn travel(&mut self) -> Result<MachineState, Error> {
        if self.fault_state == Fault::ElevatorStuck {
            return Err(self.halt(Fault::ElevatorStuck));
        }

        let target = match self.target_floor() {
            Some(target) => target,
            None => return Ok(MachineState::WaitingForRequest),
        };
        if let Some(direction) = Direction::between(self.current_floor, target) {
            self.direction = Some(direction);
        }

        // Minimum one tick, even when already at the target floor
        sleep(self.floor_travel);
        while self.current_floor != target {
            self.current_floor += if target > self.current_floor { 1 } else { -1 };
            debug!("Elevator {}: passing floor {}", self.id, self.current_floor);

            if self.current_floor != target {
                self.try_pickup();
                sleep(self.floor_travel);
            }
        }

        if self.fault_state == Fault::ArrivalSensorFailed {
            return Err(self.halt(Fault::ArrivalSensorFailed));
        }

        if self.picked_up {
            Ok(MachineState::ReachedDestination)
        } else {
            Ok(MachineState::DoorsOpening)
        }
    }

    fn try_pickup(&mut self) {
        if !self.en_route_pickups {
            return;
        }
        let direction = match self.direction {
            Some(direction) => direction,
            None => return,
        };
        if let Some(request) = self
            .dispatcher
            .claim_pickup(self.id, self.current_floor, direction)
        {
            debug!(
                "Elevator {}: queued pickup of request {} behind {} stop(s)",
                self.id,
                request.id,
                self.stops.len()
            );
            self.stops.push_back(request);
        }
    }

    fn open_doors(&mut self) -> Result<MachineState, Error> {
        if self.fault_state == Fault::DoorNotOpening {
            return Err(self.halt(Fault::DoorNotOpening));
        }
        self.door_state = DoorState::Open;

        match self.door_timers.race(self.fault_state) {
            DoorOutcome::Closed => Ok(MachineState::DoorsClosing),
            DoorOutcome::NotClosing => Ok(MachineState::DoorsNotClosing),
        }
    }

    fn force_close(&mut self) -> MachineState {
        warn!(
            "Elevator {}: doors not closing at floor {}, forcing them closed",
            self.id, self.current_floor
        );
        // The jam is cleared by the forced close
        self.fault_state = Fault::NoFault;
        MachineState::DoorsClosing
    }

    fn close_doors(&mut self) -> MachineState {
        self.door_state = DoorState::Closed;

        let arrived = self.stops.front().map_or(true, |r| r.arrived);
        if arrived {
            MachineState::NotifyScheduler
        } else {
            // Passengers boarded, continue toward the destination
            self.picked_up = true;
            MachineState::MovingBetweenFloors
        }
    }

    fn reach_destination(&mut self) -> MachineState {
        if let Some(request) = self.stops.front_mut() {
            request.arrived = true;
        }

        if self.has_more_stops() {
            MachineState::NotifyScheduler
        } else {
            MachineState::DoorsOpening
        }
    }

    fn notify_scheduler(&mut self) -> Result<MachineState, Error> {
        let request = self.dispatcher.complete(self.id)?;
        self.stops.pop_front();
        self.completed += 1;
        debug!("Elevator {}: reported request {} complete", self.id, request.id);

        match self.stops.front() {
            Some(next) => {
                self.fault_state = next.fault;
                self.picked_up = false;
                Ok(MachineState::MovingBetweenFloors)
            }
            None => {
                self.direction = None;
                Ok(MachineState::WaitingForRequest)
            }
        }
    }
}
