use crossbeam_channel as cbc;
use log::{debug, info};
use std::sync::Arc;

use super::{StatusEvent, StatusSink};
use crate::shared::{Request, RequestId, WorkerId};

/// Writes every notification to the log.
pub struct LogSink;

impl StatusSink for LogSink {
    fn on_transition(&self, event: &StatusEvent) {
        info!(
            "Elevator {}: {:?} at floor {} ({}, door {:?})",
            event.worker,
            event.state,
            event.floor,
            event.direction.map_or("IDLE", |d| d.as_str()),
            event.door
        );
    }

    fn on_request_complete(&self, worker: WorkerId, request: &Request, _more_floor_events: bool) {
        info!(
            "Elevator {}: request {} complete ({} -> {}, {} passengers)",
            worker, request.id, request.origin_floor, request.destination_floor, request.passenger_count
        );
    }
}

pub struct NullSink;

impl StatusSink for NullSink {
    fn on_transition(&self, _event: &StatusEvent) {}

    fn on_request_complete(&self, _worker: WorkerId, _request: &Request, _more: bool) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusNotice {
    Transition(StatusEvent),
    RequestComplete(WorkerId, RequestId),
}

/**
 * Forwards notifications over a crossbeam channel, for a UI thread or a test.
 *
 * Sending never blocks: with a bounded channel a full buffer drops the notice,
 * and a disconnected receiver is ignored.
 */
pub struct ChannelSink {
    tx: cbc::Sender<StatusNotice>,
}

impl ChannelSink {
    pub fn new(tx: cbc::Sender<StatusNotice>) -> ChannelSink {
        ChannelSink { tx }
    }

    fn forward(&self, notice: StatusNotice) {
        if let Err(e) = self.tx.try_send(notice) {
            debug!("Status notice dropped: {}", e);
        }
    }
}

impl StatusSink for ChannelSink {
    fn on_transition(&self, event: &StatusEvent) {
        self.forward(StatusNotice::Transition(event.clone()));
    }

    fn on_request_complete(&self, worker: WorkerId, request: &Request, _more: bool) {
        self.forward(StatusNotice::RequestComplete(worker, request.id));
    }
}

/// Hands every notification to each inner sink in order.
pub struct FanOutSink {
    sinks: Vec<Arc<dyn StatusSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Arc<dyn StatusSink>>) -> FanOutSink {
        FanOutSink { sinks }
    }
}

impl StatusSink for FanOutSink {
    fn on_transition(&self, event: &StatusEvent) {
        for sink in &self.sinks {
            sink.on_transition(event);
        }
    }

    fn on_request_complete(&self, worker: WorkerId, request: &Request, more_floor_events: bool) {
        for sink in &self.sinks {
            sink.on_request_complete(worker, request, more_floor_events);
        }
    }
}
