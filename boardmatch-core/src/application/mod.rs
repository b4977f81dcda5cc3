pub mod events;
pub mod machine;
pub mod queue_coordinator;

pub use events::SessionEvent;
pub use machine::{
    Applied, DropReason, MoveSubmission, PendingMove, Selection, SessionError, SessionMachine,
    SessionPhase,
};
pub use queue_coordinator::QueueCoordinator;
