use crate::error::Result;
use boardmatch_core::PlayerId;

/// Raw transport events, drained in order by [`Connection::poll_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The logical connection was established.
    Connected,

    /// The logical connection dropped.
    Disconnected,

    /// An inbound frame, in per-connection FIFO order.
    Message(Vec<u8>),
}

/// One logical connection to a matchmaking/game server (allows mocking in
/// tests).
///
/// Contract the session layer relies on:
/// - `connect` is idempotent and reports failure as `false` rather than
///   panicking into the caller; it may be retried.
/// - Frames are FIFO per connection, in both directions: the transport
///   never reorders this client's outbound sequence relative to its own
///   inbound stream, and a session's broadcasts arrive in server commit
///   order. There is no sequence-number fencing above this layer.
/// - All inbound events surface through `poll_events` on one logical
///   sequence, so the state machine needs no locking.
pub trait Connection {
    /// Establish the logical connection. `true` if connected (including
    /// already connected), `false` on refusal or timeout.
    fn connect(&mut self) -> bool;

    fn is_connected(&self) -> bool;

    /// Drop the logical connection. Safe when already disconnected.
    fn disconnect(&mut self);

    /// The connection-scoped identifier the server knows this client by.
    /// `None` until connected.
    fn local_id(&self) -> Option<PlayerId>;

    /// Queue one outbound frame.
    fn send(&mut self, data: Vec<u8>) -> Result<()>;

    /// Drain pending inbound events, oldest first.
    fn poll_events(&mut self) -> Vec<ConnectionEvent>;
}
