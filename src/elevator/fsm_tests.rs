/*
 * Unit tests for the elevator state machine
 *
 * The unit tests follows the Arrange, Act, Assert pattern. Door and travel
 * times are shrunk to a few milliseconds.
 *
 * Tests:
 * - test_fsm_request_at_current_floor
 * - test_fsm_request_from_other_floor
 * - test_fsm_door_fault_is_recovered
 * - test_fsm_no_fault_never_visits_doors_not_closing
 * - test_fsm_doors_never_moving_while_travelling
 * - test_fsm_single_worker_completes_in_order
 * - test_fsm_pickup_en_route
 * - test_fsm_unrecoverable_faults_halt
 * - test_fsm_worker_pool_drains_queue
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod fsm_tests {
    use crate::config::ElevatorConfig;
    use crate::dispatcher::Dispatcher;
    use crate::elevator::ElevatorWorker;
    use crate::shared::MachineState::{
        DoorsClosing, DoorsNotClosing, DoorsOpening, MovingBetweenFloors, NotifyScheduler,
        ReachedDestination, WaitingForRequest,
    };
    use crate::shared::{Direction, DoorState, Error, Fault, FloorEvent, MachineState, Request};
    use crate::status::{ChannelSink, StatusEvent, StatusNotice};
    use chrono::NaiveTime;
    use crossbeam_channel::{unbounded, Receiver};
    use std::sync::Arc;
    use std::thread::spawn;

    fn test_config() -> ElevatorConfig {
        ElevatorConfig {
            n_elevators: 1,
            n_floors: 10,
            initial_floor: 1,
            floor_travel_time: 1,
            door_close_time: 5,
            door_fault_time: 15,
            en_route_pickups: false,
        }
    }

    fn event(origin: i32, destination: i32) -> FloorEvent {
        let direction = Direction::between(origin, destination).unwrap();
        FloorEvent::new(NaiveTime::from_hms_opt(13, 2, 56).unwrap(), origin, direction, destination)
    }

    fn setup_dispatcher(total: u64) -> (Arc<Dispatcher>, Receiver<StatusNotice>) {
        let (dispatcher, notice_rx, _) = setup_dispatcher_with_feed(total);
        (dispatcher, notice_rx)
    }

    fn setup_dispatcher_with_feed(
        total: u64,
    ) -> (Arc<Dispatcher>, Receiver<StatusNotice>, Receiver<Request>) {
        let (notice_tx, notice_rx) = unbounded::<StatusNotice>();
        let (completion_tx, completion_rx) = unbounded::<Request>();
        let dispatcher = Dispatcher::new(total, Arc::new(ChannelSink::new(notice_tx)), completion_tx)
            .with_top_floor(10);
        (Arc::new(dispatcher), notice_rx, completion_rx)
    }

    fn transitions(rx: &Receiver<StatusNotice>) -> Vec<StatusEvent> {
        rx.try_iter()
            .filter_map(|n| match n {
                StatusNotice::Transition(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn states(events: &[StatusEvent]) -> Vec<MachineState> {
        events.iter().map(|e| e.state).collect()
    }

    fn completions(rx: &Receiver<StatusNotice>) -> Vec<u64> {
        rx.try_iter()
            .filter_map(|n| match n {
                StatusNotice::RequestComplete(_, id) => Some(id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_fsm_request_at_current_floor() {
        // Arrange
        let (dispatcher, notice_rx) = setup_dispatcher(1);
        dispatcher.submit(event(1, 4)).unwrap();
        let worker = ElevatorWorker::new(0, &test_config(), Arc::clone(&dispatcher));

        // Act
        let summary = worker.run().unwrap();

        // Assert
        let events = transitions(&notice_rx);
        assert_eq!(
            states(&events),
            vec![
                WaitingForRequest,
                DoorsOpening,
                DoorsClosing,
                MovingBetweenFloors,
                ReachedDestination,
                DoorsOpening,
                DoorsClosing,
                NotifyScheduler,
                WaitingForRequest,
            ]
        );
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.final_floor, 4);
        assert_eq!(dispatcher.completed_count(), 1);

        let reached = events.iter().find(|e| e.state == ReachedDestination).unwrap();
        assert_eq!(reached.floor, 4);
        assert_eq!(reached.direction, Some(Direction::Up));
        assert_eq!(reached.request, Some(1));
    }

    #[test]
    fn test_fsm_request_from_other_floor() {
        // Arrange
        let (dispatcher, notice_rx) = setup_dispatcher(1);
        dispatcher.submit(event(6, 2)).unwrap();
        let worker = ElevatorWorker::new(0, &test_config(), Arc::clone(&dispatcher));

        // Act
        let summary = worker.run().unwrap();

        // Assert
        let events = transitions(&notice_rx);
        assert_eq!(
            states(&events)[..4],
            [WaitingForRequest, MovingBetweenFloors, DoorsOpening, DoorsClosing]
        );
        let opened_at: Vec<i32> = events
            .iter()
            .filter(|e| e.state == DoorsOpening)
            .map(|e| e.floor)
            .collect();
        assert_eq!(opened_at, vec![6, 2]);
        assert_eq!(summary.final_floor, 2);
    }

    #[test]
    fn test_fsm_door_fault_is_recovered() {
        // Arrange
        let (dispatcher, notice_rx) = setup_dispatcher(1);
        dispatcher
            .submit(event(1, 3).with_fault(Fault::DoorNotClosing))
            .unwrap();
        let worker = ElevatorWorker::new(0, &test_config(), Arc::clone(&dispatcher));

        // Act
        let summary = worker.run().unwrap();

        // Assert
        let visited = states(&transitions(&notice_rx));
        assert_eq!(
            visited[..4],
            [WaitingForRequest, DoorsOpening, DoorsNotClosing, DoorsClosing]
        );
        // The forced close clears the jam for the rest of the request
        assert_eq!(visited.iter().filter(|s| **s == DoorsNotClosing).count(), 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(dispatcher.completed_count(), 1);
    }

    #[test]
    fn test_fsm_no_fault_never_visits_doors_not_closing() {
        // Arrange: the fault window is shorter than the dwell, but is not armed
        let (dispatcher, notice_rx) = setup_dispatcher(2);
        dispatcher.submit(event(1, 2)).unwrap();
        dispatcher.submit(event(2, 1)).unwrap();
        let mut config = test_config();
        config.door_fault_time = 1;
        config.door_close_time = 10;
        let worker = ElevatorWorker::new(0, &config, Arc::clone(&dispatcher));

        // Act
        worker.run().unwrap();

        // Assert
        let visited = states(&transitions(&notice_rx));
        assert!(!visited.contains(&DoorsNotClosing));
        for pair in visited.windows(2) {
            if pair[0] == DoorsOpening {
                assert_eq!(pair[1], DoorsClosing);
            }
        }
    }

    #[test]
    fn test_fsm_doors_never_moving_while_travelling() {
        let (dispatcher, notice_rx) = setup_dispatcher(3);
        dispatcher.submit(event(5, 2).with_fault(Fault::DoorNotClosing)).unwrap();
        dispatcher.submit(event(7, 9)).unwrap();
        dispatcher.submit(event(3, 1)).unwrap();
        let worker = ElevatorWorker::new(0, &test_config(), Arc::clone(&dispatcher));

        worker.run().unwrap();

        for e in transitions(&notice_rx) {
            if e.state == MovingBetweenFloors {
                assert_eq!(e.door, DoorState::Closed, "moving with doors {:?}", e.door);
            }
            if e.door.is_moving() {
                assert_ne!(e.state, MovingBetweenFloors);
            }
        }
    }

    #[test]
    fn test_fsm_single_worker_completes_in_order() {
        // Arrange
        let (dispatcher, notice_rx, completed_rx) = setup_dispatcher_with_feed(3);
        for (o, d) in [(4, 6), (9, 2), (1, 8)].iter() {
            dispatcher.submit(event(*o, *d)).unwrap();
        }
        let worker = ElevatorWorker::new(0, &test_config(), Arc::clone(&dispatcher));

        // Act
        worker.run().unwrap();

        // Assert
        let completed: Vec<_> = completed_rx.try_iter().map(|r| r.id).collect();
        assert_eq!(completed, vec![1, 2, 3]);
        assert_eq!(completions(&notice_rx), vec![1, 2, 3]);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_fsm_pickup_en_route() {
        // Arrange: the car passes floor 4 going up while request 2 waits there
        let (dispatcher, notice_rx, completed_rx) = setup_dispatcher_with_feed(2);
        dispatcher.submit(event(1, 9)).unwrap();
        dispatcher.submit(event(4, 6)).unwrap();
        let mut config = test_config();
        config.en_route_pickups = true;
        let worker = ElevatorWorker::new(0, &config, Arc::clone(&dispatcher));

        // Act
        let summary = worker.run().unwrap();

        // Assert
        let events = transitions(&notice_rx);
        let reached = events
            .iter()
            .find(|e| e.state == ReachedDestination && e.request == Some(1))
            .unwrap();
        assert!(reached.more_stops);
        assert_eq!(reached.floor, 9);

        // With more stops queued the first request is reported without reopening
        let after_reached: Vec<MachineState> = events
            .iter()
            .skip_while(|e| !(e.state == ReachedDestination && e.request == Some(1)))
            .take(3)
            .map(|e| e.state)
            .collect();
        assert_eq!(after_reached, vec![ReachedDestination, NotifyScheduler, MovingBetweenFloors]);

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.final_floor, 6);
        let completed: Vec<_> = completed_rx.try_iter().map(|r| r.id).collect();
        assert_eq!(completed, vec![1, 2]);
    }

    #[test]
    fn test_fsm_unrecoverable_faults_halt() {
        let cases = [
            (Fault::ElevatorStuck, event(3, 5)),
            (Fault::ArrivalSensorFailed, event(3, 5)),
            (Fault::DoorNotOpening, event(1, 5)),
        ];

        for (fault, floor_event) in cases.iter() {
            // Arrange
            let (dispatcher, _notice_rx) = setup_dispatcher(1);
            dispatcher.submit(floor_event.clone().with_fault(*fault)).unwrap();
            let worker = ElevatorWorker::new(7, &test_config(), Arc::clone(&dispatcher));

            // Act
            let result = worker.run();

            // Assert
            match result {
                Err(Error::UnrecoverableFault { worker, request, fault: f }) => {
                    assert_eq!(worker, 7);
                    assert_eq!(request, 1);
                    assert_eq!(f, *fault);
                }
                other => panic!("{:?} should halt the worker, got {:?}", fault, other),
            }
            // The request stays with the halted worker
            assert_eq!(dispatcher.snapshot().in_flight.get(&7), Some(&vec![1]));
            assert_eq!(dispatcher.completed_count(), 0);
        }
    }

    #[test]
    fn test_fsm_worker_pool_drains_queue() {
        // Arrange
        const N: u64 = 24;
        let (dispatcher, notice_rx) = setup_dispatcher(N);
        let mut config = test_config();
        config.en_route_pickups = true;

        let workers: Vec<_> = (0..3)
            .map(|id| {
                let worker = ElevatorWorker::new(id, &config, Arc::clone(&dispatcher));
                spawn(move || worker.run())
            })
            .collect();

        // Act
        for i in 0..N {
            let origin = 1 + (i as i32 * 3) % 10;
            let destination = if origin == 10 { 1 } else { origin + 1 };
            dispatcher.submit(event(origin, destination)).unwrap();
        }

        // Assert
        let total: u64 = workers
            .into_iter()
            .map(|w| w.join().unwrap().unwrap().completed)
            .sum();
        assert_eq!(total, N);
        assert_eq!(dispatcher.completed_count(), N);
        assert_eq!(dispatcher.pending_count(), 0);
        assert!(dispatcher.snapshot().in_flight.is_empty());

        let mut done = completions(&notice_rx);
        done.sort_unstable();
        assert_eq!(done, (1..=N).collect::<Vec<_>>());
    }
}
