pub mod application;
pub mod domain;

pub use application::{
    Applied, DropReason, MoveSubmission, PendingMove, QueueCoordinator, Selection, SessionError,
    SessionEvent, SessionMachine, SessionPhase,
};
pub use domain::{
    Board, BoardError, Cell, Color, GameError, GameKind, GameSession, HardwareLog,
    HardwareLogEntry, Move, Player, PlayerId, Position, PositionError, QueueTicket, Timestamp,
};
