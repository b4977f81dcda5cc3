use crate::application::{QueueCoordinator, SessionEvent};
use crate::domain::{
    Cell, GameError, GameSession, Move, PlayerId, Position, QueueTicket, Timestamp,
};
use uuid::Uuid;

/// Lifecycle phase of the local session replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Queued,
    Active,
    Terminated,
}

/// Errors from local operations on the machine.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("a queue search is already in progress")]
    AlreadyQueued,

    #[error("a session is already active")]
    AlreadyActive,

    #[error("resume requires an idle session")]
    NotIdle,

    #[error("local player {0} is not seated in the session")]
    NotSeated(PlayerId),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Outcome of feeding one inbound event to the machine.
///
/// Invalid or late events are never applied partially; they surface as
/// `Dropped` so tests can observe the no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Effective queue position after the monotone filter.
    QueuePosition(u32),

    /// The search was refused by the server; back to `Idle`, retryable.
    SearchRejected,

    /// Entered `Active` from a match notification.
    MatchStarted,

    /// Board replaced wholesale, turn ownership recomputed.
    MoveCommitted { next_player: PlayerId },

    /// Outstanding move was refused; the turn lock is released.
    PendingReleased,

    /// Session ended; the machine is now `Terminated`.
    Closed,

    /// The event was discarded without touching state.
    Dropped(DropReason),
}

/// Why an inbound event was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Match/queue traffic while not queued (cancel fencing).
    NotQueued,

    /// Move traffic while no session is active.
    NotActive,

    /// The local player is not seated in the offered session.
    NotSeated,

    /// Snapshot for a different session than the active one.
    StaleSession,

    /// Snapshot failed invariant validation; last known-good state kept.
    MalformedSnapshot,

    /// Rejection arrived with no move outstanding.
    NoPendingMove,

    /// The machine is already terminated.
    AlreadyTerminated,
}

/// Outcome of a square selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Not active, not our turn, empty pick, or opponent piece pick.
    Ignored,

    /// A piece was picked up; awaiting a destination.
    Picked(Position),

    /// A different own piece replaced the pending selection.
    Replaced(Position),

    /// Selection plus destination produced a move to propose.
    Proposal(Move),
}

/// A move accepted for submission to the relay.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSubmission {
    pub session_id: Uuid,
    pub mv: Move,
    /// Local monotonically increasing sequence number, used to correlate a
    /// late or duplicate acknowledgment with the submission it answers.
    pub seq: u64,
}

/// The optimistic turn lock engaged for one in-flight submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    seq: u64,
    since: Timestamp,
}

impl PendingMove {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn since(&self) -> Timestamp {
        self.since
    }
}

#[derive(Debug, Clone)]
struct ActiveGame {
    local: PlayerId,
    session: GameSession,
    my_turn: bool,
    selection: Option<Position>,
    pending: Option<PendingMove>,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Queued {
        local: PlayerId,
        queue: QueueCoordinator,
    },
    Active(ActiveGame),
    Terminated,
}

/// The local session state machine: `Idle → Queued → Active → Terminated`.
///
/// Owns this client's replica of the game session exclusively; transport
/// and UI layers only invoke operations or read the latest snapshot. All
/// inbound events arrive on one logical sequence, so there is no internal
/// locking.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: State,
    next_move_seq: u64,
}

impl SessionMachine {
    pub fn new() -> Self {
        SessionMachine {
            state: State::Idle,
            next_move_seq: 1,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            State::Idle => SessionPhase::Idle,
            State::Queued { .. } => SessionPhase::Queued,
            State::Active(_) => SessionPhase::Active,
            State::Terminated => SessionPhase::Terminated,
        }
    }

    pub fn local_id(&self) -> Option<&PlayerId> {
        match &self.state {
            State::Queued { local, .. } => Some(local),
            State::Active(active) => Some(&active.local),
            _ => None,
        }
    }

    /// Enter `Queued` with a fresh ticket. Valid from `Idle` and from
    /// `Terminated` (a finished session requires a fresh search).
    pub fn begin_search(
        &mut self,
        local: PlayerId,
        ticket: QueueTicket,
    ) -> Result<(), SessionError> {
        match self.state {
            State::Idle | State::Terminated => {
                tracing::info!(player = %local, kind = %ticket.game_kind(), "joining matchmaking queue");
                let mut queue = QueueCoordinator::new();
                queue.joined(ticket);
                self.state = State::Queued { local, queue };
                Ok(())
            }
            State::Queued { .. } => Err(SessionError::AlreadyQueued),
            State::Active(_) => Err(SessionError::AlreadyActive),
        }
    }

    /// Leave `Queued` for `Idle`. A no-op (returning `false`) when no
    /// search is outstanding. This is the local fence: a match notification
    /// arriving after cancellation is dropped, not applied.
    pub fn cancel_search(&mut self) -> bool {
        if let State::Queued { queue, .. } = &mut self.state {
            queue.cancel();
            self.state = State::Idle;
            tracing::info!("queue search cancelled");
            true
        } else {
            false
        }
    }

    /// Reconnect into a resumed session. Deliberately a separate operation
    /// from the `MatchFound` event path so cancel fencing cannot be
    /// bypassed by a late match notification.
    pub fn resume(&mut self, snapshot: GameSession, local: PlayerId) -> Result<(), SessionError> {
        if !matches!(self.state, State::Idle) {
            return Err(SessionError::NotIdle);
        }
        snapshot.validate()?;
        if !snapshot.is_seated(&local) {
            return Err(SessionError::NotSeated(local));
        }

        let my_turn = snapshot.is_turn_of(&local);
        self.state = State::Active(ActiveGame {
            local,
            session: snapshot,
            my_turn,
            selection: None,
            pending: None,
        });
        Ok(())
    }

    /// Feed one inbound event through the machine.
    pub fn apply_event(&mut self, event: SessionEvent) -> Applied {
        match event {
            SessionEvent::QueueUpdate { position } => self.apply_queue_update(position),
            SessionEvent::QueueRejected { reason } => self.apply_queue_rejected(&reason),
            SessionEvent::MatchFound { snapshot } => self.apply_match(snapshot),
            SessionEvent::MoveApplied {
                mv,
                snapshot,
                next_player,
            } => self.apply_move_result(mv, snapshot, next_player),
            SessionEvent::MoveRejected { reason } => self.apply_move_rejected(&reason),
            SessionEvent::SessionClosed => self.apply_closed(),
        }
    }

    fn apply_queue_update(&mut self, position: u32) -> Applied {
        let State::Queued { queue, .. } = &mut self.state else {
            tracing::debug!(position, "queue update outside a search, dropping");
            return Applied::Dropped(DropReason::NotQueued);
        };
        match queue.update_position(position) {
            Some(effective) => Applied::QueuePosition(effective),
            None => Applied::Dropped(DropReason::NotQueued),
        }
    }

    fn apply_queue_rejected(&mut self, reason: &str) -> Applied {
        if !matches!(self.state, State::Queued { .. }) {
            return Applied::Dropped(DropReason::NotQueued);
        }
        tracing::warn!(reason, "server refused the queue join");
        self.state = State::Idle;
        Applied::SearchRejected
    }

    fn apply_match(&mut self, snapshot: GameSession) -> Applied {
        let State::Queued { local, .. } = &self.state else {
            tracing::debug!("match notification outside a search, dropping (fenced)");
            return Applied::Dropped(DropReason::NotQueued);
        };

        if let Err(e) = snapshot.validate() {
            tracing::warn!(error = %e, "discarding malformed match snapshot");
            return Applied::Dropped(DropReason::MalformedSnapshot);
        }
        if !snapshot.is_seated(local) {
            tracing::warn!(player = %local, "match snapshot does not seat the local player");
            return Applied::Dropped(DropReason::NotSeated);
        }

        let local = local.clone();
        let my_turn = snapshot.is_turn_of(&local);
        tracing::info!(session = %snapshot.id(), my_turn, "match found, session active");
        self.state = State::Active(ActiveGame {
            local,
            session: snapshot,
            my_turn,
            selection: None,
            pending: None,
        });
        Applied::MatchStarted
    }

    fn apply_move_result(
        &mut self,
        mv: Move,
        snapshot: GameSession,
        next_player: PlayerId,
    ) -> Applied {
        let State::Active(active) = &mut self.state else {
            tracing::debug!("move broadcast outside an active session, dropping");
            return Applied::Dropped(DropReason::NotActive);
        };

        if snapshot.id() != active.session.id() {
            tracing::warn!(
                got = %snapshot.id(),
                expected = %active.session.id(),
                "discarding move broadcast for a different session"
            );
            return Applied::Dropped(DropReason::StaleSession);
        }

        // Board is replaced wholesale and the turn owner comes from the
        // relay's nextPlayer, never inferred locally. Rebuilding through the
        // validating constructor keeps a malformed snapshot from being
        // half-applied.
        let merged = match GameSession::new(
            snapshot.id(),
            snapshot.players().clone(),
            snapshot.board().clone(),
            next_player.clone(),
        ) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed move snapshot");
                return Applied::Dropped(DropReason::MalformedSnapshot);
            }
        };

        active.session = merged;
        active.my_turn = active.session.is_turn_of(&active.local);
        active.selection = None;
        active.pending = None;
        tracing::debug!(%mv, next = %next_player, my_turn = active.my_turn, "applied relayed move");
        Applied::MoveCommitted { next_player }
    }

    fn apply_move_rejected(&mut self, reason: &str) -> Applied {
        let State::Active(active) = &mut self.state else {
            return Applied::Dropped(DropReason::NotActive);
        };
        if active.pending.take().is_some() {
            active.my_turn = true;
            tracing::warn!(reason, "relay rejected the outstanding move, turn lock released");
            Applied::PendingReleased
        } else {
            Applied::Dropped(DropReason::NoPendingMove)
        }
    }

    fn apply_closed(&mut self) -> Applied {
        if matches!(self.state, State::Terminated) {
            return Applied::Dropped(DropReason::AlreadyTerminated);
        }
        tracing::info!("session closed");
        self.state = State::Terminated;
        Applied::Closed
    }

    /// The transport dropped. Forces `Terminated` immediately, releasing
    /// the optimistic turn lock and any queue ticket without waiting for a
    /// server-side signal.
    pub fn disconnected(&mut self) {
        if !matches!(self.state, State::Terminated) {
            tracing::info!("transport disconnected, terminating session state");
            self.state = State::Terminated;
        }
    }

    /// Drive the piece-selection sub-state. Only meaningful in `Active`
    /// while holding the turn; anything else is ignored.
    pub fn select_square(&mut self, pos: Position) -> Selection {
        let State::Active(active) = &mut self.state else {
            return Selection::Ignored;
        };
        if !active.my_turn {
            return Selection::Ignored;
        }
        let Some(cell) = active.session.board().get(pos) else {
            return Selection::Ignored;
        };
        let local_color = match active.session.player(&active.local) {
            Some(player) => player.color(),
            None => return Selection::Ignored,
        };
        let own_piece = cell.side() == Some(local_color);

        match active.selection {
            None => {
                if own_piece {
                    active.selection = Some(pos);
                    Selection::Picked(pos)
                } else {
                    Selection::Ignored
                }
            }
            Some(from) => {
                if own_piece {
                    // Another own piece replaces the pending selection.
                    active.selection = Some(pos);
                    Selection::Replaced(pos)
                } else {
                    let piece = match active.session.board().get(from) {
                        Some(piece) => piece,
                        None => {
                            active.selection = None;
                            return Selection::Ignored;
                        }
                    };
                    active.selection = None;
                    Selection::Proposal(Move::new(from, pos, piece))
                }
            }
        }
    }

    /// Accept a move for relay submission. Valid only in `Active` while
    /// holding the turn; otherwise a silent no-op that never reaches the
    /// transport. On acceptance the turn lock engages immediately, before
    /// any acknowledgment, so a double-submit race is impossible.
    pub fn propose_move(&mut self, mv: Move) -> Option<MoveSubmission> {
        let State::Active(active) = &mut self.state else {
            tracing::debug!(%mv, "move proposed outside an active session, suppressing");
            return None;
        };
        if !active.my_turn {
            tracing::debug!(%mv, "move proposed out of turn, suppressing");
            return None;
        }

        let seq = self.next_move_seq;
        self.next_move_seq += 1;

        active.my_turn = false;
        active.selection = None;
        active.pending = Some(PendingMove {
            seq,
            since: Timestamp::now(),
        });
        tracing::debug!(%mv, seq, "move accepted, turn lock engaged");
        Some(MoveSubmission {
            session_id: active.session.id(),
            mv,
            seq,
        })
    }

    /// Release the turn lock if the outstanding submission is older than
    /// `max_age_millis`. The caller chooses the timeout policy; a late
    /// acknowledgment after an abort still applies cleanly because the
    /// board is replaced wholesale.
    pub fn abort_pending(&mut self, max_age_millis: u64) -> bool {
        let State::Active(active) = &mut self.state else {
            return false;
        };
        match active.pending {
            Some(pending) if pending.since.elapsed_millis() >= max_age_millis => {
                tracing::warn!(
                    seq = pending.seq,
                    "aborting stalled move submission, releasing turn lock"
                );
                active.pending = None;
                active.my_turn = true;
                true
            }
            _ => false,
        }
    }

    // ===== Accessors =====

    pub fn session(&self) -> Option<&GameSession> {
        match &self.state {
            State::Active(active) => Some(&active.session),
            _ => None,
        }
    }

    pub fn my_turn(&self) -> bool {
        matches!(&self.state, State::Active(active) if active.my_turn)
    }

    pub fn selection(&self) -> Option<Position> {
        match &self.state {
            State::Active(active) => active.selection,
            _ => None,
        }
    }

    pub fn pending_move(&self) -> Option<PendingMove> {
        match &self.state {
            State::Active(active) => active.pending,
            _ => None,
        }
    }

    pub fn ticket(&self) -> Option<&QueueTicket> {
        match &self.state {
            State::Queued { queue, .. } => queue.ticket(),
            _ => None,
        }
    }

    pub fn queue_position(&self) -> Option<u32> {
        self.ticket().and_then(|t| t.position())
    }

    /// The cell a pending selection points at, if any.
    pub fn selected_cell(&self) -> Option<Cell> {
        let State::Active(active) = &self.state else {
            return None;
        };
        let from = active.selection?;
        active.session.board().get(from)
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}
