pub mod request_line;
pub mod status_message;

pub use request_line::encode_request_line;
pub use request_line::parse_request_line;
pub use status_message::StatusMessage;
