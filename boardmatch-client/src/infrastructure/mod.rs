pub mod connection;
pub mod loopback;
pub mod message;
