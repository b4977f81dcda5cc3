use crate::domain::QueueTicket;

/// Tracks this client's enqueue/dequeue lifecycle for one requested game
/// kind, surfacing position updates until a match or a cancel.
///
/// Cancellation is a local fencing operation: once the ticket is gone the
/// state machine drops any in-flight match notification instead of
/// applying it.
#[derive(Debug, Clone, Default)]
pub struct QueueCoordinator {
    ticket: Option<QueueTicket>,
}

impl QueueCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly issued ticket.
    pub fn joined(&mut self, ticket: QueueTicket) {
        self.ticket = Some(ticket);
    }

    /// Apply a position broadcast. Returns the effective position, or
    /// `None` when no join is outstanding.
    pub fn update_position(&mut self, position: u32) -> Option<u32> {
        let ticket = self.ticket.as_mut()?;
        ticket.update_position(position);
        ticket.position()
    }

    /// Drop the outstanding ticket. Safe to call with no join outstanding
    /// (a no-op, not an error); returns the discarded ticket if there was
    /// one.
    pub fn cancel(&mut self) -> Option<QueueTicket> {
        self.ticket.take()
    }

    pub fn ticket(&self) -> Option<&QueueTicket> {
        self.ticket.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.ticket.is_some()
    }
}
