/*
 * Unit tests for the network module
 *
 * Tests:
 * - test_status_relay_over_loopback
 * - test_status_relay_reports_transport_error
 * - test_relay_sink_never_blocks
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod network_tests {
    use crate::codec::StatusMessage;
    use crate::network::{run_status_relay, RelaySink, Transport, UdpTransport};
    use crate::shared::{Direction, Error, Fault, FloorEvent, Request};
    use crate::status::StatusSink;
    use chrono::NaiveTime;
    use crossbeam_channel::{bounded, unbounded};
    use std::io;
    use std::thread::spawn;

    struct BrokenTransport;

    impl Transport for BrokenTransport {
        fn send(&self, _bytes: &[u8]) -> Result<(), Error> {
            Err(Error::Transport(io::Error::new(io::ErrorKind::BrokenPipe, "link down")))
        }

        fn receive(&self) -> Result<Vec<u8>, Error> {
            Err(Error::Transport(io::Error::new(io::ErrorKind::BrokenPipe, "link down")))
        }
    }

    fn request() -> Request {
        let event = FloorEvent::new(NaiveTime::from_hms_milli_opt(13, 2, 56, 0).unwrap(), 4, Direction::Up, 6)
            .with_passengers(2)
            .with_fault(Fault::DoorNotClosing);
        let mut request = Request::from_event(1, event);
        request.arrived = true;
        request
    }

    #[test]
    fn test_status_relay_over_loopback() {
        // Arrange
        let receiver = UdpTransport::new("127.0.0.1:0", "127.0.0.1:9").unwrap();
        let receiver_addr = receiver.local_addr().unwrap();
        let sender = UdpTransport::new("127.0.0.1:0", receiver_addr).unwrap();

        let (tx, rx) = unbounded::<StatusMessage>();
        let sink = RelaySink::new(tx);
        let relay = spawn(move || run_status_relay(sender, rx));

        // Act
        sink.on_request_complete(2, &request(), true);
        drop(sink);

        // Assert
        let bytes = receiver.receive().unwrap();
        let message = StatusMessage::from_bytes(&bytes).unwrap();
        assert_eq!(message, StatusMessage::from_request(2, &request(), true));
        assert!(message.arrived);
        assert_eq!(relay.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_status_relay_reports_transport_error() {
        let (tx, rx) = unbounded::<StatusMessage>();
        tx.send(StatusMessage::from_request(0, &request(), false)).unwrap();
        drop(tx);

        assert!(matches!(run_status_relay(BrokenTransport, rx), Err(Error::Transport(_))));
    }

    #[test]
    fn test_relay_sink_never_blocks() {
        // Arrange: room for one message
        let (tx, rx) = bounded::<StatusMessage>(1);
        let sink = RelaySink::new(tx);

        // Act: the second message does not fit, the third finds the relay gone
        sink.on_request_complete(0, &request(), false);
        sink.on_request_complete(1, &request(), false);
        let queued: Vec<_> = rx.try_iter().collect();
        drop(rx);
        sink.on_request_complete(2, &request(), false);

        // Assert
        assert_eq!(queued, vec![StatusMessage::from_request(0, &request(), false)]);
    }
}
