use crate::domain::{GameSession, Move, PlayerId};

/// Inbound transitions the session state machine consumes.
///
/// The transport layer decodes wire messages into these; the machine never
/// sees raw bytes. All events for one session arrive on a single logical
/// sequence, so no locking is needed to apply them.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Advisory queue position broadcast while waiting for a match.
    QueueUpdate { position: u32 },

    /// The server refused the join request (unsupported kind, queue full).
    /// Retryable with a fresh join.
    QueueRejected { reason: String },

    /// A match was made; carries the full opening snapshot.
    MatchFound { snapshot: GameSession },

    /// A committed move, broadcast identically to both participants.
    MoveApplied {
        mv: Move,
        snapshot: GameSession,
        next_player: PlayerId,
    },

    /// The relay explicitly refused the outstanding move submission.
    MoveRejected { reason: String },

    /// The session ended (server signal or local disconnect).
    SessionClosed,
}
