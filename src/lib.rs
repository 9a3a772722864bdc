pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod elevator;
pub mod network;
pub mod shared;
pub mod source;
pub mod status;
