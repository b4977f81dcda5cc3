use crate::domain::{Board, Player, PlayerId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authoritative snapshot of one two-player session, as relayed by the
/// server.
///
/// Each client holds its own replica, kept convergent purely by applying
/// relayed snapshots wholesale. Exactly one of the two players is
/// `current_player` at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GameSession {
    id: Uuid,
    players: [Player; 2],
    board: Board,
    #[serde(rename = "currentPlayer")]
    current_player: PlayerId,
}

/// Session-level invariant violations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GameError {
    #[error("session requires two distinct players, got duplicate {0}")]
    DuplicatePlayers(PlayerId),

    #[error("current player {0} is not seated in the session")]
    CurrentPlayerNotSeated(PlayerId),

    #[error("session board must not be empty")]
    EmptyBoard,
}

impl GameSession {
    pub fn new(
        id: Uuid,
        players: [Player; 2],
        board: Board,
        current_player: PlayerId,
    ) -> Result<Self, GameError> {
        let session = GameSession {
            id,
            players,
            board,
            current_player,
        };
        session.validate()?;
        Ok(session)
    }

    /// Check the snapshot invariants. Deserialized snapshots must pass this
    /// before being applied; a failing snapshot is discarded wholesale so
    /// the last known-good state is preserved.
    pub fn validate(&self) -> Result<(), GameError> {
        let [a, b] = &self.players;
        if a.id() == b.id() {
            return Err(GameError::DuplicatePlayers(a.id().clone()));
        }
        if !self.is_seated(&self.current_player) {
            return Err(GameError::CurrentPlayerNotSeated(
                self.current_player.clone(),
            ));
        }
        if self.board.width() == 0 || self.board.height() == 0 {
            return Err(GameError::EmptyBoard);
        }
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> &PlayerId {
        &self.current_player
    }

    pub fn is_seated(&self, id: &PlayerId) -> bool {
        self.players.iter().any(|p| p.id() == id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn opponent_of(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() != id)
    }

    pub fn is_turn_of(&self, id: &PlayerId) -> bool {
        &self.current_player == id
    }
}
