use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crossbeam_channel as cbc;
use log::{debug, info};

use crate::codec::StatusMessage;
use crate::shared::{Error, Request, WorkerId};
use crate::status::{StatusEvent, StatusSink};

/// Byte transport at the edge of the system. Any failure is fatal to its owner.
pub trait Transport: Send {
    fn send(&self, bytes: &[u8]) -> Result<(), Error>;

    fn receive(&self) -> Result<Vec<u8>, Error>;
}

/**
 * Datagram transport: one status record per UDP packet.
 *
 * # Fields
 * - `socket`:  Locally bound socket.
 * - `peer`:    Where `send` delivers to.
 */
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

const MAX_DATAGRAM: usize = 1024;

impl UdpTransport {
    pub fn new<A: ToSocketAddrs, P: ToSocketAddrs>(bind: A, peer: P) -> Result<UdpTransport, Error> {
        let socket = UdpSocket::bind(bind)?;
        let peer = peer.to_socket_addrs()?.next().ok_or_else(|| {
            Error::Transport(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "peer address resolved to nothing",
            ))
        })?;
        Ok(UdpTransport { socket, peer })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn send(&self, bytes: &[u8]) -> Result<(), Error> {
        self.socket.send_to(bytes, self.peer)?;
        Ok(())
    }

    fn receive(&self) -> Result<Vec<u8>, Error> {
        let mut buf = [0u8; MAX_DATAGRAM];
        let (n, from) = self.socket.recv_from(&mut buf)?;
        debug!("Received {} bytes from {}", n, from);
        Ok(buf[..n].to_vec())
    }
}

/// Status sink that queues a `StatusMessage` for the relay thread on every completion.
pub struct RelaySink {
    tx: cbc::Sender<StatusMessage>,
}

impl RelaySink {
    pub fn new(tx: cbc::Sender<StatusMessage>) -> RelaySink {
        RelaySink { tx }
    }
}

impl StatusSink for RelaySink {
    fn on_transition(&self, _event: &StatusEvent) {}

    fn on_request_complete(&self, worker: WorkerId, request: &Request, more_floor_events: bool) {
        let message = StatusMessage::from_request(worker, request, more_floor_events);
        if let Err(e) = self.tx.try_send(message) {
            debug!("Status message for request {} dropped: {}", request.id, e);
        }
    }
}

/// Sends every queued message until the sinks hang up. Returns the number sent.
pub fn run_status_relay<T: Transport>(
    transport: T,
    rx: cbc::Receiver<StatusMessage>,
) -> Result<u64, Error> {
    let mut sent = 0;
    for message in rx {
        transport.send(&message.to_bytes())?;
        sent += 1;
    }
    info!("Status relay closed after {} messages", sent);
    Ok(sent)
}
