pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod message;
pub mod poll;
pub mod session;
pub mod status;
pub mod transport;
