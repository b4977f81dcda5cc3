use crate::error::{ClientError, Result};
use crate::infrastructure::connection::{Connection, ConnectionEvent};
use crate::infrastructure::message::{ClientRequest, ServerEvent};
use boardmatch_core::{Cell, Color, GameKind, GameSession, Move, Player, PlayerId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// In-process matchmaker and move relay.
///
/// A stand-in for the real server, shared by integration tests and the demo
/// binary: it pairs the first two waiting clients per game kind, relays
/// moves without any rule validation (that is the real server's job), and
/// broadcasts identical `moveApplied` events to both ends in commit order.
/// Each connection's inbox is FIFO, which is the ordering contract the
/// session layer assumes of any transport.
pub struct LoopbackServer {
    state: Arc<Mutex<ServerState>>,
}

/// Client endpoint registered with a [`LoopbackServer`].
pub struct LoopbackConnection {
    id: PlayerId,
    state: Arc<Mutex<ServerState>>,
}

#[derive(Default)]
struct ServerState {
    next_client: u32,
    slots: HashMap<PlayerId, Slot>,
    queues: HashMap<GameKind, VecDeque<Waiting>>,
    sessions: HashMap<Uuid, GameSession>,
    seats: HashMap<PlayerId, Uuid>,
}

struct Slot {
    connected: bool,
    inbox: VecDeque<ConnectionEvent>,
}

struct Waiting {
    id: PlayerId,
    name: String,
}

impl LoopbackServer {
    pub fn new() -> Self {
        LoopbackServer {
            state: Arc::new(Mutex::new(ServerState::default())),
        }
    }

    /// Register a new client endpoint. The connection starts disconnected;
    /// the caller drives `connect()`.
    pub fn connect(&self) -> LoopbackConnection {
        let mut state = self.lock();
        state.next_client += 1;
        let id = PlayerId::new(format!("client-{}", state.next_client));
        state.slots.insert(
            id.clone(),
            Slot {
                connected: false,
                inbox: VecDeque::new(),
            },
        );
        tracing::debug!(client = %id, "loopback endpoint registered");
        LoopbackConnection {
            id,
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().expect("loopback state lock poisoned")
    }
}

impl Default for LoopbackServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    fn deliver(&mut self, to: &PlayerId, event: ServerEvent) {
        let Some(slot) = self.slots.get_mut(to) else {
            return;
        };
        match event.to_bytes() {
            Ok(bytes) => slot.inbox.push_back(ConnectionEvent::Message(bytes)),
            Err(e) => tracing::error!(error = %e, "loopback failed to encode event"),
        }
    }

    fn handle_request(&mut self, from: &PlayerId, request: ClientRequest) {
        match request {
            ClientRequest::JoinQueue {
                player_name,
                game_kind,
            } => self.handle_join(from, player_name, game_kind),
            ClientRequest::CancelQueue => self.remove_from_queues(from),
            ClientRequest::SubmitMove { session_id, mv } => {
                self.handle_move(from, session_id, mv)
            }
        }
    }

    fn handle_join(&mut self, from: &PlayerId, name: String, kind: GameKind) {
        let queue = self.queues.entry(kind).or_default();
        if queue.iter().any(|w| &w.id == from) {
            return;
        }
        queue.push_back(Waiting {
            id: from.clone(),
            name,
        });
        tracing::info!(client = %from, %kind, "queued for matchmaking");

        self.broadcast_positions(kind);
        self.try_match(kind);
    }

    fn broadcast_positions(&mut self, kind: GameKind) {
        let waiting: Vec<(PlayerId, u32)> = self
            .queues
            .get(&kind)
            .map(|queue| {
                queue
                    .iter()
                    .enumerate()
                    .map(|(i, w)| (w.id.clone(), i as u32 + 1))
                    .collect()
            })
            .unwrap_or_default();

        for (id, position) in waiting {
            self.deliver(&id, ServerEvent::QueueUpdate { position });
        }
    }

    fn try_match(&mut self, kind: GameKind) {
        loop {
            let queue = self.queues.entry(kind).or_default();
            if queue.len() < 2 {
                return;
            }
            let (Some(first), Some(second)) = (queue.pop_front(), queue.pop_front()) else {
                return;
            };

            // First queued moves first, as white.
            let players = [
                Player::new(first.id.clone(), first.name, Color::White),
                Player::new(second.id.clone(), second.name, Color::Black),
            ];
            let session = match GameSession::new(
                Uuid::new_v4(),
                players,
                kind.initial_board(),
                first.id.clone(),
            ) {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(error = %e, "loopback produced an invalid session");
                    continue;
                }
            };

            tracing::info!(
                session = %session.id(),
                white = %first.id,
                black = %second.id,
                %kind,
                "match made"
            );
            self.sessions.insert(session.id(), session.clone());
            self.seats.insert(first.id.clone(), session.id());
            self.seats.insert(second.id.clone(), session.id());

            self.deliver(
                &first.id,
                ServerEvent::MatchFound {
                    game_state: session.clone(),
                },
            );
            self.deliver(
                &second.id,
                ServerEvent::MatchFound {
                    game_state: session,
                },
            );
        }
    }

    fn handle_move(&mut self, from: &PlayerId, session_id: Uuid, mv: Move) {
        let Some(session) = self.sessions.get(&session_id).cloned() else {
            self.deliver(
                from,
                ServerEvent::MoveRejected {
                    reason: "unknown session".to_string(),
                },
            );
            return;
        };
        if !session.is_turn_of(from) {
            self.deliver(
                from,
                ServerEvent::MoveRejected {
                    reason: "not your turn".to_string(),
                },
            );
            return;
        }

        // The server board is authoritative: the piece comes from it, not
        // from the client's claim. No game-rule validation beyond that.
        let mut board = session.board().clone();
        let piece = match board.get(mv.from) {
            Some(cell) if !cell.is_empty() => cell,
            _ => {
                self.deliver(
                    from,
                    ServerEvent::MoveRejected {
                        reason: format!("no piece at {}", mv.from),
                    },
                );
                return;
            }
        };
        if board.get(mv.to).is_none() {
            self.deliver(
                from,
                ServerEvent::MoveRejected {
                    reason: format!("destination {} is off the board", mv.to),
                },
            );
            return;
        }
        board.set(mv.from, Cell::Empty);
        board.set(mv.to, piece);

        let next_player = match session.opponent_of(from) {
            Some(opponent) => opponent.id().clone(),
            None => {
                tracing::error!(session = %session_id, "mover has no opponent");
                return;
            }
        };
        let updated = match GameSession::new(
            session_id,
            session.players().clone(),
            board,
            next_player.clone(),
        ) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "loopback produced an invalid move snapshot");
                return;
            }
        };

        let committed = Move::new(mv.from, mv.to, piece);
        let participants: Vec<PlayerId> =
            updated.players().iter().map(|p| p.id().clone()).collect();
        self.sessions.insert(session_id, updated.clone());

        for id in participants {
            self.deliver(
                &id,
                ServerEvent::MoveApplied {
                    mv: committed.clone(),
                    game_state: updated.clone(),
                    next_player: next_player.clone(),
                },
            );
        }
    }

    fn remove_from_queues(&mut self, id: &PlayerId) {
        let affected: Vec<GameKind> = self
            .queues
            .iter_mut()
            .filter_map(|(kind, queue)| {
                let before = queue.len();
                queue.retain(|w| &w.id != id);
                (queue.len() != before).then_some(*kind)
            })
            .collect();
        for kind in affected {
            self.broadcast_positions(kind);
        }
    }

    fn drop_client(&mut self, id: &PlayerId) {
        self.remove_from_queues(id);

        if let Some(session_id) = self.seats.remove(id) {
            if let Some(session) = self.sessions.remove(&session_id) {
                if let Some(opponent) = session.opponent_of(id) {
                    let opponent_id = opponent.id().clone();
                    self.seats.remove(&opponent_id);
                    self.deliver(
                        &opponent_id,
                        ServerEvent::SessionClosed {
                            reason: "opponent disconnected".to_string(),
                        },
                    );
                }
            }
        }
    }
}

impl LoopbackConnection {
    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().expect("loopback state lock poisoned")
    }
}

impl Connection for LoopbackConnection {
    fn connect(&mut self) -> bool {
        let mut state = self.lock();
        let Some(slot) = state.slots.get_mut(&self.id) else {
            return false;
        };
        if !slot.connected {
            slot.connected = true;
            slot.inbox.push_back(ConnectionEvent::Connected);
        }
        true
    }

    fn is_connected(&self) -> bool {
        self.lock()
            .slots
            .get(&self.id)
            .map(|slot| slot.connected)
            .unwrap_or(false)
    }

    fn disconnect(&mut self) {
        let mut state = self.lock();
        let was_connected = state
            .slots
            .get_mut(&self.id)
            .map(|slot| std::mem::replace(&mut slot.connected, false))
            .unwrap_or(false);
        if was_connected {
            state.drop_client(&self.id);
        }
    }

    fn local_id(&self) -> Option<PlayerId> {
        self.is_connected().then(|| self.id.clone())
    }

    fn send(&mut self, data: Vec<u8>) -> Result<()> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let request = ClientRequest::from_bytes(&data)?;
        self.lock().handle_request(&self.id, request);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<ConnectionEvent> {
        let mut state = self.lock();
        match state.slots.get_mut(&self.id) {
            Some(slot) => slot.inbox.drain(..).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardmatch_core::Position;

    fn drain_messages(conn: &mut LoopbackConnection) -> Vec<ServerEvent> {
        conn.poll_events()
            .into_iter()
            .filter_map(|event| match event {
                ConnectionEvent::Message(data) => Some(ServerEvent::from_bytes(&data).unwrap()),
                _ => None,
            })
            .collect()
    }

    fn join(conn: &mut LoopbackConnection, name: &str) {
        let request = ClientRequest::JoinQueue {
            player_name: name.to_string(),
            game_kind: GameKind::Chess,
        };
        conn.send(request.to_bytes().unwrap()).unwrap();
    }

    #[test]
    fn test_two_joins_make_a_match() {
        let server = LoopbackServer::new();
        let mut a = server.connect();
        let mut b = server.connect();
        assert!(a.connect());
        assert!(b.connect());

        join(&mut a, "Alice");
        join(&mut b, "Bob");

        let events_a = drain_messages(&mut a);
        let events_b = drain_messages(&mut b);

        // Queue position, then the match.
        assert!(matches!(
            events_a.first(),
            Some(ServerEvent::QueueUpdate { position: 1 })
        ));
        let Some(ServerEvent::MatchFound { game_state: sa }) = events_a.last() else {
            panic!("first client should be matched");
        };
        let Some(ServerEvent::MatchFound { game_state: sb }) = events_b.last() else {
            panic!("second client should be matched");
        };

        assert_eq!(sa, sb);
        assert_eq!(sa.current_player(), &a.local_id().unwrap());
    }

    #[test]
    fn test_send_requires_connect() {
        let server = LoopbackServer::new();
        let mut a = server.connect();

        let request = ClientRequest::CancelQueue;
        let result = a.send(request.to_bytes().unwrap());
        assert!(matches!(result, Err(ClientError::NotConnected)));
    }

    #[test]
    fn test_out_of_turn_move_is_rejected() {
        let server = LoopbackServer::new();
        let mut a = server.connect();
        let mut b = server.connect();
        a.connect();
        b.connect();
        join(&mut a, "Alice");
        join(&mut b, "Bob");

        let Some(ServerEvent::MatchFound { game_state }) = drain_messages(&mut b).pop() else {
            panic!("expected a match");
        };
        drain_messages(&mut a);

        // Black shoves a move in while it is white's turn.
        let request = ClientRequest::SubmitMove {
            session_id: game_state.id(),
            mv: Move::new(
                Position::decode("e7").unwrap(),
                Position::decode("e5").unwrap(),
                Cell::Piece('p'),
            ),
        };
        b.send(request.to_bytes().unwrap()).unwrap();

        let events = drain_messages(&mut b);
        assert!(matches!(
            events.as_slice(),
            [ServerEvent::MoveRejected { .. }]
        ));
    }

    #[test]
    fn test_relay_broadcasts_identically() {
        let server = LoopbackServer::new();
        let mut a = server.connect();
        let mut b = server.connect();
        a.connect();
        b.connect();
        join(&mut a, "Alice");
        join(&mut b, "Bob");

        let Some(ServerEvent::MatchFound { game_state }) = drain_messages(&mut a).pop() else {
            panic!("expected a match");
        };
        drain_messages(&mut b);

        let request = ClientRequest::SubmitMove {
            session_id: game_state.id(),
            mv: Move::new(
                Position::decode("d2").unwrap(),
                Position::decode("d4").unwrap(),
                Cell::Piece('P'),
            ),
        };
        a.send(request.to_bytes().unwrap()).unwrap();

        let to_a = drain_messages(&mut a);
        let to_b = drain_messages(&mut b);
        assert_eq!(to_a, to_b);

        let Some(ServerEvent::MoveApplied {
            game_state: updated,
            next_player,
            ..
        }) = to_a.first()
        else {
            panic!("expected a move broadcast");
        };
        assert_eq!(next_player, &b.local_id().unwrap());
        assert_eq!(
            updated.board().get(Position::decode("d4").unwrap()),
            Some(Cell::Piece('P'))
        );
    }

    #[test]
    fn test_disconnect_closes_session_for_opponent() {
        let server = LoopbackServer::new();
        let mut a = server.connect();
        let mut b = server.connect();
        a.connect();
        b.connect();
        join(&mut a, "Alice");
        join(&mut b, "Bob");
        drain_messages(&mut a);
        drain_messages(&mut b);

        a.disconnect();
        assert!(!a.is_connected());

        let events = drain_messages(&mut b);
        assert!(matches!(
            events.as_slice(),
            [ServerEvent::SessionClosed { .. }]
        ));
    }
}
