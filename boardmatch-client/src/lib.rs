pub mod client;
pub mod error;
pub mod infrastructure;

pub use client::{SessionClient, SessionNotification};
pub use error::{ClientError, Result};
pub use infrastructure::connection::{Connection, ConnectionEvent};
pub use infrastructure::loopback::{LoopbackConnection, LoopbackServer};
pub use infrastructure::message::{ClientRequest, ServerEvent};
