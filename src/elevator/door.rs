use crossbeam_channel as cbc;
use std::time::{Duration, Instant};

use crate::config::ElevatorConfig;
use crate::shared::Fault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorOutcome {
    /// The close timer fired first; doors close normally.
    Closed,
    /// The fault window expired with the doors still open.
    NotClosing,
}

/**
 * The two delayed actions raced while the doors are open.
 *
 * - close timer: fires after the normal dwell, unless the door is jammed
 *   (`Fault::DoorNotClosing`), in which case the close is never confirmed.
 * - fault timer: armed only for `Fault::DoorNotClosing`, fires after the
 *   detection window.
 *
 * Both are crossbeam `after` channels joined by one `select!`. Exactly one arm
 * runs, and the other timer is dropped together with its receiver when `race`
 * returns.
 */
#[derive(Debug, Clone, Copy)]
pub struct DoorTimers {
    close_after: Duration,
    fault_after: Duration,
}

impl DoorTimers {
    pub fn new(close_after: Duration, fault_after: Duration) -> DoorTimers {
        DoorTimers {
            close_after,
            fault_after,
        }
    }

    pub fn from_config(config: &ElevatorConfig) -> DoorTimers {
        DoorTimers::new(config.door_close(), config.door_fault())
    }

    pub fn race(&self, fault: Fault) -> DoorOutcome {
        let jammed = fault == Fault::DoorNotClosing;

        let close_timer: cbc::Receiver<Instant> = if jammed {
            cbc::never()
        } else {
            cbc::after(self.close_after)
        };
        let fault_timer: cbc::Receiver<Instant> = if jammed {
            cbc::after(self.fault_after)
        } else {
            cbc::never()
        };

        cbc::select! {
            recv(close_timer) -> _ => DoorOutcome::Closed,
            recv(fault_timer) -> _ => DoorOutcome::NotClosing,
        }
    }
}
