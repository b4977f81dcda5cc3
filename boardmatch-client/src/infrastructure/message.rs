use crate::error::Result;
use boardmatch_core::{GameKind, GameSession, Move, PlayerId, SessionEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Requests this client sends to the matchmaking/game server.
///
/// Field names match the original socket protocol (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientRequest {
    /// Enter the matchmaking queue for a game kind.
    #[serde(rename = "joinQueue")]
    JoinQueue {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "gameKind")]
        game_kind: GameKind,
    },

    /// Leave the queue before a match is made.
    #[serde(rename = "cancelQueue")]
    CancelQueue,

    /// Submit a move for the active session. No legality check beyond turn
    /// ownership happens client-side; rule validation is the server's job.
    #[serde(rename = "submitMove")]
    SubmitMove {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        #[serde(rename = "move")]
        mv: Move,
    },
}

/// Events the server delivers to this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// Advisory queue position (1-based) while waiting.
    #[serde(rename = "queueUpdate")]
    QueueUpdate { position: u32 },

    /// The join request was refused (unsupported kind, queue full).
    #[serde(rename = "queueRejected")]
    QueueRejected { reason: String },

    /// A match was made; the full opening snapshot.
    #[serde(rename = "matchFound")]
    MatchFound {
        #[serde(rename = "gameState")]
        game_state: GameSession,
    },

    /// A committed move. Broadcast identically to both participants, who
    /// apply it identically: same input, same resulting replica.
    #[serde(rename = "moveApplied")]
    MoveApplied {
        #[serde(rename = "move")]
        mv: Move,
        #[serde(rename = "gameState")]
        game_state: GameSession,
        #[serde(rename = "nextPlayer")]
        next_player: PlayerId,
    },

    /// The outstanding move submission was refused.
    #[serde(rename = "moveRejected")]
    MoveRejected { reason: String },

    /// The session ended.
    #[serde(rename = "sessionClosed")]
    SessionClosed { reason: String },
}

impl ClientRequest {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Into::into)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Into::into)
    }
}

impl ServerEvent {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Into::into)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Into::into)
    }
}

impl From<ServerEvent> for SessionEvent {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::QueueUpdate { position } => SessionEvent::QueueUpdate { position },
            ServerEvent::QueueRejected { reason } => SessionEvent::QueueRejected { reason },
            ServerEvent::MatchFound { game_state } => SessionEvent::MatchFound {
                snapshot: game_state,
            },
            ServerEvent::MoveApplied {
                mv,
                game_state,
                next_player,
            } => SessionEvent::MoveApplied {
                mv,
                snapshot: game_state,
                next_player,
            },
            ServerEvent::MoveRejected { reason } => SessionEvent::MoveRejected { reason },
            ServerEvent::SessionClosed { .. } => SessionEvent::SessionClosed,
        }
    }
}
