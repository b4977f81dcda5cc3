#![allow(dead_code)]

pub mod mock_connection;

pub use mock_connection::MockConnection;

use boardmatch_client::ServerEvent;
use boardmatch_core::{Board, Cell, Color, GameSession, Move, Player, PlayerId, Position};
use uuid::Uuid;

/// A fresh chess session snapshot, as the server would announce it.
pub fn chess_session(id: Uuid, white: &str, black: &str, current: &str) -> GameSession {
    GameSession::new(
        id,
        [
            Player::new(PlayerId::new(white), "Alice", Color::White),
            Player::new(PlayerId::new(black), "Bob", Color::Black),
        ],
        Board::standard_chess(),
        PlayerId::new(current),
    )
    .unwrap()
}

pub fn pos(s: &str) -> Position {
    Position::decode(s).unwrap()
}

/// The broadcast the relay emits after committing `from → to` on the given
/// prior snapshot.
pub fn move_applied_event(prior: &GameSession, from: &str, to: &str, next: &str) -> ServerEvent {
    let mut board = prior.board().clone();
    let piece = board.get(pos(from)).unwrap();
    board.set(pos(from), Cell::Empty);
    board.set(pos(to), piece);

    let updated = GameSession::new(
        prior.id(),
        prior.players().clone(),
        board,
        PlayerId::new(next),
    )
    .unwrap();

    ServerEvent::MoveApplied {
        mv: Move::new(pos(from), pos(to), piece),
        game_state: updated,
        next_player: PlayerId::new(next),
    }
}
