pub mod client;
pub mod connection;
pub mod server;

pub use client::{RelayClient, RelayClientConfig};
pub use connection::{RelayError, WaitingPeer};
pub use server::RelayServer;
