use crate::domain::Board;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game variants the matchmaking queue accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    Chess,
    Checkers,
    TicTacToe,
}

/// Raised when a queue request names a game kind the server does not offer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown game kind: {0:?}")]
pub struct UnknownGameKind(pub String);

impl GameKind {
    /// Board dimensions (width, height) for this kind.
    pub fn board_size(self) -> (u8, u8) {
        match self {
            GameKind::Chess | GameKind::Checkers => (8, 8),
            GameKind::TicTacToe => (3, 3),
        }
    }

    /// The starting layout the server deals out on match.
    pub fn initial_board(self) -> Board {
        match self {
            GameKind::Chess => Board::standard_chess(),
            GameKind::Checkers => Board::standard_checkers(),
            GameKind::TicTacToe => Board::empty(3, 3),
        }
    }

    /// The wire code (`"chess"`, `"checkers"`, `"tic-tac-toe"`).
    pub fn code(self) -> &'static str {
        match self {
            GameKind::Chess => "chess",
            GameKind::Checkers => "checkers",
            GameKind::TicTacToe => "tic-tac-toe",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for GameKind {
    type Err = UnknownGameKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chess" => Ok(GameKind::Chess),
            "checkers" => Ok(GameKind::Checkers),
            "tic-tac-toe" => Ok(GameKind::TicTacToe),
            other => Err(UnknownGameKind(other.to_string())),
        }
    }
}

/// The client's view of an outstanding queue entry.
///
/// The position is 1-based and purely advisory: it only ever moves toward
/// the front, and a match may arrive at any position, including before the
/// position ever reaches zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueueTicket {
    game_kind: GameKind,
    position: Option<u32>,
}

impl QueueTicket {
    /// A fresh ticket; the position is unknown until the first broadcast.
    pub fn new(game_kind: GameKind) -> Self {
        QueueTicket {
            game_kind,
            position: None,
        }
    }

    pub fn game_kind(&self) -> GameKind {
        self.game_kind
    }

    pub fn position(&self) -> Option<u32> {
        self.position
    }

    /// Record a position broadcast. Positions only move toward the front of
    /// the queue; a regression is ignored and reported as `false`.
    pub fn update_position(&mut self, position: u32) -> bool {
        match self.position {
            Some(current) if position > current => {
                tracing::debug!(current, position, "ignoring queue position regression");
                false
            }
            _ => {
                self.position = Some(position);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_codes() {
        assert_eq!(GameKind::Chess.to_string(), "chess");
        assert_eq!(GameKind::TicTacToe.to_string(), "tic-tac-toe");
        assert_eq!("checkers".parse::<GameKind>().unwrap(), GameKind::Checkers);
        assert_eq!(
            "ludo".parse::<GameKind>(),
            Err(UnknownGameKind("ludo".to_string()))
        );
    }

    #[test]
    fn test_game_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&GameKind::TicTacToe).unwrap(),
            "\"tic-tac-toe\""
        );
        let kind: GameKind = serde_json::from_str("\"chess\"").unwrap();
        assert_eq!(kind, GameKind::Chess);
    }

    #[test]
    fn test_initial_boards() {
        assert_eq!(GameKind::Chess.initial_board().height(), 8);
        assert_eq!(GameKind::TicTacToe.initial_board().width(), 3);

        let checkers = GameKind::Checkers.initial_board();
        // 12 men per side.
        let codes: Vec<char> = checkers
            .rows()
            .iter()
            .flatten()
            .map(|c| c.code())
            .collect();
        assert_eq!(codes.iter().filter(|c| **c == 'm').count(), 12);
        assert_eq!(codes.iter().filter(|c| **c == 'M').count(), 12);
    }

    #[test]
    fn test_ticket_position_is_monotone() {
        let mut ticket = QueueTicket::new(GameKind::Chess);
        assert_eq!(ticket.position(), None);

        assert!(ticket.update_position(3));
        assert_eq!(ticket.position(), Some(3));

        assert!(ticket.update_position(1));
        assert_eq!(ticket.position(), Some(1));

        // Regressions are advisory noise and get dropped.
        assert!(!ticket.update_position(5));
        assert_eq!(ticket.position(), Some(1));

        // Same position is fine (idempotent broadcast).
        assert!(ticket.update_position(1));
        assert_eq!(ticket.position(), Some(1));
    }
}
