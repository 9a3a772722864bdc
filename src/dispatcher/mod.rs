pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::Dispatcher;
pub use dispatcher::DispatcherSnapshot;
pub use scheduler::FloorNotice;
pub use scheduler::Scheduler;
pub use scheduler::SchedulerSummary;
