pub mod error;
pub mod macros;
pub mod structs;

pub use error::Error;
pub use structs::Direction;
pub use structs::DoorState;
pub use structs::Fault;
pub use structs::FloorEvent;
pub use structs::MachineState;
pub use structs::Request;
pub use structs::RequestId;
pub use structs::WorkerId;
