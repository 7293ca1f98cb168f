pub mod client;
pub mod protocol;
pub mod server;

pub use client::{RESPONSE_TIMEOUT, RelayClient};
pub use protocol::ServerMessage;
pub use server::{serve, start_websocket_server};
