/***************************************/
/*        3rd party libraries          */
/***************************************/
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::Error;

pub type WorkerId = usize;
pub type RequestId = u64;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Direction of travel from `from` to `to`, `None` when they are the same floor.
    pub fn between(from: i32, to: i32) -> Option<Direction> {
        if to > from {
            Some(Direction::Up)
        } else if to < from {
            Some(Direction::Down)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            _ => Err(format!("unknown direction '{}'", s)),
        }
    }
}

/**
 * Simulated hardware malfunction carried by a request.
 *
 * Only `DoorNotClosing` has a recovery path. The remaining faults halt the
 * worker that meets them.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    NoFault,
    ElevatorStuck,
    ArrivalSensorFailed,
    DoorNotOpening,
    DoorNotClosing,
}

impl Fault {
    pub fn description(&self) -> &'static str {
        match *self {
            Fault::NoFault => "No Fault",
            Fault::ElevatorStuck => "Elevator Stuck",
            Fault::ArrivalSensorFailed => "Arrival Sensor Failed",
            Fault::DoorNotOpening => "Door Not Opening",
            Fault::DoorNotClosing => "Door Not Closing",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Fault::NoFault | Fault::DoorNotClosing)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

// Accepts both the identifier ("DoorNotClosing") and the description ("Door Not Closing")
impl FromStr for Fault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "nofault" => Ok(Fault::NoFault),
            "elevatorstuck" => Ok(Fault::ElevatorStuck),
            "arrivalsensorfailed" => Ok(Fault::ArrivalSensorFailed),
            "doornotopening" => Ok(Fault::DoorNotOpening),
            "doornotclosing" => Ok(Fault::DoorNotClosing),
            _ => Err(format!("unknown fault '{}'", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Closed,
    Opening,
    Open,
    Closing,
}

impl DoorState {
    pub fn is_moving(&self) -> bool {
        matches!(self, DoorState::Opening | DoorState::Closing)
    }
}

/// States of the per-worker elevator machine.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    WaitingForRequest,
    MovingBetweenFloors,
    DoorsOpening,
    DoorsNotClosing,
    DoorsClosing,
    ReachedDestination,
    NotifyScheduler,
}

/**
 * A floor request as produced by a request source, before the dispatcher has
 * accepted it.
 *
 * # Fields
 * - `time`:                When the button was pressed.
 * - `origin_floor`:        Floor the passengers are waiting on.
 * - `direction`:           Requested direction of travel.
 * - `destination_floor`:   Car button pressed once inside.
 * - `passengers`:          Number of passengers boarding.
 * - `fault`:               Simulated malfunction to inject while serving it.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FloorEvent {
    pub time: NaiveTime,
    pub origin_floor: i32,
    pub direction: Direction,
    pub destination_floor: i32,
    pub passengers: u32,
    pub fault: Fault,
}

impl FloorEvent {
    pub fn new(
        time: NaiveTime,
        origin_floor: i32,
        direction: Direction,
        destination_floor: i32,
    ) -> FloorEvent {
        FloorEvent {
            time,
            origin_floor,
            direction,
            destination_floor,
            passengers: 0,
            fault: Fault::NoFault,
        }
    }

    pub fn with_passengers(mut self, passengers: u32) -> FloorEvent {
        self.passengers = passengers;
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> FloorEvent {
        self.fault = fault;
        self
    }

    /// Rejects requests no elevator could serve. `top_floor` is checked when given.
    pub fn validate(&self, top_floor: Option<i32>) -> Result<(), Error> {
        let reject = |reason: &str| Error::InvalidRequest {
            origin: self.origin_floor,
            destination: self.destination_floor,
            reason: reason.to_string(),
        };

        if self.origin_floor < 1 || self.destination_floor < 1 {
            return Err(reject("floors must be positive"));
        }
        if let Some(top) = top_floor {
            if self.origin_floor > top || self.destination_floor > top {
                return Err(reject("floor above the top floor"));
            }
        }
        match Direction::between(self.origin_floor, self.destination_floor) {
            None => Err(reject("origin and destination are the same floor")),
            Some(d) if d != self.direction => Err(reject("direction does not lead to destination")),
            Some(_) => Ok(()),
        }
    }
}

/**
 * A request accepted by the dispatcher.
 *
 * Everything except `arrived` and `assigned_worker` is fixed at creation.
 * Those two are written only by the dispatcher or by the worker holding it.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub created_at: NaiveTime,
    pub origin_floor: i32,
    pub direction: Direction,
    pub destination_floor: i32,
    pub passenger_count: u32,
    pub fault: Fault,
    pub arrived: bool,
    pub assigned_worker: Option<WorkerId>,
}

impl Request {
    pub fn from_event(id: RequestId, event: FloorEvent) -> Request {
        Request {
            id,
            created_at: event.time,
            origin_floor: event.origin_floor,
            direction: event.direction,
            destination_floor: event.destination_floor,
            passenger_count: event.passengers,
            fault: event.fault,
            arrived: false,
            assigned_worker: None,
        }
    }
}
