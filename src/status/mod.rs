pub mod sinks;

pub use sinks::{ChannelSink, FanOutSink, LogSink, NullSink, StatusNotice};

use serde::Serialize;

use crate::shared::{Direction, DoorState, MachineState, Request, RequestId, WorkerId};

/**
 * One elevator state transition as seen from outside.
 *
 * # Fields
 * - `worker`:      Elevator that made the transition.
 * - `state`:       State it just entered.
 * - `floor`:       Floor it is at (or last passed).
 * - `direction`:   Current direction of travel.
 * - `door`:        Door position at the time of the transition.
 * - `request`:     Request being served, if any.
 * - `more_stops`:  Whether further pickups are queued behind the current request.
 */
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub worker: WorkerId,
    pub state: MachineState,
    pub floor: i32,
    pub direction: Option<Direction>,
    pub door: DoorState,
    pub request: Option<RequestId>,
    pub more_stops: bool,
}

/// Receives notifications from the dispatcher and the elevators. Must never block.
pub trait StatusSink: Send + Sync {
    fn on_transition(&self, event: &StatusEvent);

    /// `more_floor_events` tells whether the worker still holds queued pickups.
    fn on_request_complete(&self, worker: WorkerId, request: &Request, more_floor_events: bool);
}
