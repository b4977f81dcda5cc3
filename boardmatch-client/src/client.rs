use crate::error::{ClientError, Result};
use crate::infrastructure::connection::{Connection, ConnectionEvent};
use crate::infrastructure::message::{ClientRequest, ServerEvent};
use boardmatch_core::{
    Applied, GameKind, GameSession, HardwareLog, Move, MoveSubmission, PlayerId, Position,
    QueueTicket, Selection, SessionMachine, SessionPhase,
};

/// Typed notifications surfaced by [`SessionClient::poll`].
///
/// This replaces implicit handler registration: consumers drain the stream
/// on their own schedule, so there are no per-kind callbacks to leak or
/// silently replace across screen transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotification {
    /// Advisory queue position while searching.
    QueueUpdate { position: u32 },

    /// The server refused the join; the search is over, retry freely.
    QueueRejected { reason: String },

    /// A match was made; the session is now active.
    MatchStarted { session: GameSession },

    /// A relayed move was applied to the local replica.
    MoveApplied { mv: Move, my_turn: bool },

    /// The relay refused the outstanding move; the turn lock is released.
    MoveRejected { reason: String },

    /// The session is over (server signal or transport drop).
    SessionEnded,
}

/// One client's session handle: a transport, the session state machine, and
/// the hardware activity feed, wired together.
///
/// An explicit handle rather than process-wide state, so multiple
/// independent sessions (two sides of a test match, for instance) can
/// coexist in one process.
pub struct SessionClient<C: Connection> {
    connection: C,
    machine: SessionMachine,
    hardware: HardwareLog,
}

impl<C: Connection> SessionClient<C> {
    pub fn new(connection: C) -> Self {
        SessionClient {
            connection,
            machine: SessionMachine::new(),
            hardware: HardwareLog::new(),
        }
    }

    /// Establish the transport. Idempotent; `false` on refusal or timeout,
    /// and retryable by calling again.
    pub fn connect(&mut self) -> bool {
        self.connection.connect()
    }

    /// Drop the transport and terminate the session state immediately,
    /// releasing the turn lock and any queue ticket without waiting for a
    /// server-side signal.
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
        self.machine.disconnected();
    }

    /// Enter the matchmaking queue. Fails distinguishably (transport down,
    /// empty name, search already outstanding) without mutating any
    /// session state.
    pub fn join_queue(&mut self, player_name: &str, game_kind: GameKind) -> Result<QueueTicket> {
        if player_name.trim().is_empty() {
            return Err(ClientError::InvalidPlayerName);
        }
        if !self.connection.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let local = self.connection.local_id().ok_or(ClientError::NotConnected)?;

        let request = ClientRequest::JoinQueue {
            player_name: player_name.to_string(),
            game_kind,
        };
        let bytes = request.to_bytes()?;

        let ticket = QueueTicket::new(game_kind);
        self.machine.begin_search(local, ticket.clone())?;
        if let Err(e) = self.connection.send(bytes) {
            // The join never left this process; roll the machine back so
            // the caller can retry cleanly.
            self.machine.cancel_search();
            return Err(e);
        }
        Ok(ticket)
    }

    /// Leave the queue. Safe to call when no search is outstanding. The
    /// local fence engages first, so a match notification racing this call
    /// is dropped regardless of whether the server heard the cancel.
    pub fn cancel_search(&mut self) -> Result<()> {
        if self.machine.cancel_search() {
            let bytes = ClientRequest::CancelQueue.to_bytes()?;
            if let Err(e) = self.connection.send(bytes) {
                tracing::warn!(error = %e, "cancel notification did not reach the server");
            }
        }
        Ok(())
    }

    /// Drive the piece-selection flow. When a selection plus destination
    /// completes a move, it is submitted to the relay and the optimistic
    /// turn lock engages before this call returns.
    pub fn select_square(&mut self, pos: Position) -> Result<Selection> {
        let selection = self.machine.select_square(pos);
        if let Selection::Proposal(mv) = &selection {
            self.propose_move(mv.clone())?;
        }
        Ok(selection)
    }

    /// Submit a move directly. Returns `Ok(false)` when the machine
    /// suppressed it (not active, or not this client's turn): nothing
    /// reaches the transport in that case.
    pub fn propose_move(&mut self, mv: Move) -> Result<bool> {
        match self.machine.propose_move(mv) {
            Some(submission) => {
                self.submit(submission)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn submit(&mut self, submission: MoveSubmission) -> Result<()> {
        let request = ClientRequest::SubmitMove {
            session_id: submission.session_id,
            mv: submission.mv,
        };
        let bytes = request.to_bytes()?;
        self.hardware.push("📤 Sending move command to hardware...");
        if let Err(e) = self.connection.send(bytes) {
            // The submission never left; release the lock so the turn is
            // not frozen on a known-local failure.
            self.machine.abort_pending(0);
            return Err(e);
        }
        Ok(())
    }

    /// Drain the transport and apply every inbound event, in order, to the
    /// state machine. Returns the typed notifications this produced.
    pub fn poll(&mut self) -> Vec<SessionNotification> {
        let mut notes = Vec::new();
        for event in self.connection.poll_events() {
            match event {
                ConnectionEvent::Connected => {
                    tracing::debug!("transport connected");
                }
                ConnectionEvent::Disconnected => {
                    self.machine.disconnected();
                    notes.push(SessionNotification::SessionEnded);
                }
                ConnectionEvent::Message(data) => match ServerEvent::from_bytes(&data) {
                    Ok(event) => self.handle_server_event(event, &mut notes),
                    Err(e) => {
                        tracing::warn!(error = %e, "discarding malformed inbound frame");
                    }
                },
            }
        }
        notes
    }

    fn handle_server_event(&mut self, event: ServerEvent, notes: &mut Vec<SessionNotification>) {
        // Capture what the notifications and the hardware feed need before
        // the event is consumed by the machine.
        let applied_move = match &event {
            ServerEvent::MoveApplied { mv, .. } => Some(mv.clone()),
            _ => None,
        };
        let rejection_reason = match &event {
            ServerEvent::MoveRejected { reason } | ServerEvent::QueueRejected { reason } => {
                Some(reason.clone())
            }
            _ => None,
        };
        let close_reason = match &event {
            ServerEvent::SessionClosed { reason } => Some(reason.clone()),
            _ => None,
        };

        match self.machine.apply_event(event.into()) {
            Applied::QueuePosition(position) => {
                notes.push(SessionNotification::QueueUpdate { position });
            }
            Applied::SearchRejected => {
                notes.push(SessionNotification::QueueRejected {
                    reason: rejection_reason.unwrap_or_default(),
                });
            }
            Applied::MatchStarted => {
                if let Some(session) = self.machine.session() {
                    notes.push(SessionNotification::MatchStarted {
                        session: session.clone(),
                    });
                }
            }
            Applied::MoveCommitted { .. } => {
                if let Some(mv) = applied_move {
                    self.hardware.push(format!("🤖 Moving piece: {}", mv));
                    self.hardware.push("✅ Hardware movement completed");
                    notes.push(SessionNotification::MoveApplied {
                        mv,
                        my_turn: self.machine.my_turn(),
                    });
                }
            }
            Applied::PendingReleased => {
                notes.push(SessionNotification::MoveRejected {
                    reason: rejection_reason.unwrap_or_default(),
                });
            }
            Applied::Closed => {
                if let Some(reason) = close_reason {
                    tracing::info!(%reason, "session closed by server");
                }
                notes.push(SessionNotification::SessionEnded);
            }
            Applied::Dropped(reason) => {
                tracing::debug!(?reason, "inbound event dropped");
            }
        }
    }

    /// Release the turn lock if the in-flight submission has stalled past
    /// `max_age_millis`. The timeout policy belongs to the caller.
    pub fn abort_stalled_move(&mut self, max_age_millis: u64) -> bool {
        self.machine.abort_pending(max_age_millis)
    }

    // ===== Accessors =====

    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.machine.session()
    }

    pub fn my_turn(&self) -> bool {
        self.machine.my_turn()
    }

    pub fn local_id(&self) -> Option<PlayerId> {
        self.connection.local_id()
    }

    /// The hardware activity feed (display-only, most recent first).
    pub fn hardware_log(&self) -> &HardwareLog {
        &self.hardware
    }
}
