use std::fmt;
use std::io;

use crate::shared::structs::{Fault, RequestId, WorkerId};

#[derive(Debug)]
pub enum Error {
    /// Semantically impossible request, rejected before it reaches the queue.
    InvalidRequest {
        origin: i32,
        destination: i32,
        reason: String,
    },
    /// A line or status message that does not follow the wire format.
    MalformedEncoding { input: String, reason: String },
    Transport(io::Error),
    Config(String),
    NoRequestInFlight(WorkerId),
    /// An elevator thread could not be started or went away without reporting.
    Worker(String),
    /// A fault without a recovery path. The worker that met it has halted.
    UnrecoverableFault {
        worker: WorkerId,
        request: RequestId,
        fault: Fault,
    },
}

impl Error {
    pub fn malformed(input: &str, reason: impl Into<String>) -> Error {
        Error::MalformedEncoding {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRequest {
                origin,
                destination,
                reason,
            } => write!(
                f,
                "invalid request from floor {} to floor {}: {}",
                origin, destination, reason
            ),
            Error::MalformedEncoding { input, reason } => {
                write!(f, "malformed encoding '{}': {}", input, reason)
            }
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::NoRequestInFlight(worker) => {
                write!(f, "elevator {} has no request in flight", worker)
            }
            Error::Worker(msg) => write!(f, "elevator thread error: {}", msg),
            Error::UnrecoverableFault {
                worker,
                request,
                fault,
            } => write!(
                f,
                "elevator {} halted on request {}: {}",
                worker, request, fault
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Transport(e)
    }
}
