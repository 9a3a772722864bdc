pub mod door;
pub mod fsm;
pub mod fsm_tests;
pub mod pool;

pub use door::{DoorOutcome, DoorTimers};
pub use fsm::{ElevatorWorker, WorkerSummary};
pub use pool::ElevatorPool;
