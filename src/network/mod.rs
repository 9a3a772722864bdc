pub mod network;
pub mod network_tests;

pub use network::{run_status_relay, RelaySink, Transport, UdpTransport};
