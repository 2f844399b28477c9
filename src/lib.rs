pub mod aggregate;
pub mod config;
pub mod error;
pub mod key;
pub mod protocol;
pub mod record;
pub mod resolve;
pub mod server;
pub mod store;
pub mod transport;
pub mod types;
