/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::Path;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::codec::parse_request_line;
use crate::dispatcher::FloorNotice;
use crate::shared::{Error, FloorEvent};

/**
 * Reads request records from `text`, one per line.
 *
 * Blank lines and lines starting with `#` are skipped. Lines that fail to parse
 * or name an impossible request are dropped with a warning and never reach the
 * dispatcher.
 */
pub fn parse_requests(text: &str, top_floor: Option<i32>) -> Vec<FloorEvent> {
    let mut events = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_request_line(line).and_then(|e| e.validate(top_floor).map(|_| e)) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Line {}: dropped: {}", number + 1, e),
        }
    }
    events
}

pub fn read_requests<P: AsRef<Path>>(path: P, top_floor: Option<i32>) -> Result<Vec<FloorEvent>, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    let events = parse_requests(&text, top_floor);
    info!("Loaded {} requests from {}", events.len(), path.display());
    Ok(events)
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub sent: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub completed: u64,
}

/**
 * Floor side of the bank: feeds floor events to the scheduler and listens for
 * what became of them.
 *
 * # Fields
 * - `events`:              Floor events still to be sent, in order.
 * - `floor_event_tx`:      Sends floor events to the scheduler. Dropped once all are sent.
 * - `floor_notice_rx`:     Acceptance, rejection and completion notices from the scheduler.
 */
pub struct RequestSource {
    events: Vec<FloorEvent>,
    floor_event_tx: cbc::Sender<FloorEvent>,
    floor_notice_rx: cbc::Receiver<FloorNotice>,
}

impl RequestSource {
    pub fn new(
        events: Vec<FloorEvent>,
        floor_event_tx: cbc::Sender<FloorEvent>,
        floor_notice_rx: cbc::Receiver<FloorNotice>,
    ) -> RequestSource {
        RequestSource {
            events,
            floor_event_tx,
            floor_notice_rx,
        }
    }

    /// Sends every event, then consumes notices until the scheduler hangs up.
    pub fn run(self) -> SourceSummary {
        let mut summary = SourceSummary::default();

        for event in self.events {
            if self.floor_event_tx.send(event).is_err() {
                warn!("Scheduler stopped before all floor events were sent");
                break;
            }
            summary.sent += 1;
        }
        drop(self.floor_event_tx);

        for notice in self.floor_notice_rx.iter() {
            match notice {
                FloorNotice::Accepted(id, event) => {
                    debug!(
                        "Request {} accepted: floor {} {} to {}",
                        id, event.origin_floor, event.direction, event.destination_floor
                    );
                    summary.accepted += 1;
                }
                FloorNotice::Rejected(event, reason) => {
                    warn!(
                        "Request from floor {} to {} rejected: {}",
                        event.origin_floor, event.destination_floor, reason
                    );
                    summary.rejected += 1;
                }
                FloorNotice::Completed(request) => {
                    info!(
                        "Request {} arrived at floor {} (elevator {:?})",
                        request.id, request.destination_floor, request.assigned_worker
                    );
                    summary.completed += 1;
                }
            }
        }

        summary
    }
}
