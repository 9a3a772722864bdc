pub mod request_source;

pub use request_source::{parse_requests, read_requests, RequestSource, SourceSummary};
