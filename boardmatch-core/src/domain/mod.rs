pub mod board;
pub mod game;
pub mod hardware;
pub mod moves;
pub mod player;
pub mod position;
pub mod queue;

pub use board::{Board, BoardError, Cell};
pub use game::{GameError, GameSession};
pub use hardware::{HardwareLog, HardwareLogEntry, Timestamp};
pub use moves::Move;
pub use player::{Color, Player, PlayerId};
pub use position::{Position, PositionError};
pub use queue::{GameKind, QueueTicket, UnknownGameKind};
