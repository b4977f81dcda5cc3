use boardmatch_client::{ClientError, ClientRequest, Connection, ConnectionEvent, ServerEvent};
use boardmatch_core::PlayerId;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Recording in-memory transport.
///
/// Cloneable handle over shared state, so a test keeps one handle while the
/// session client owns another: the test scripts inbound events and
/// inspects every frame the client sent.
#[derive(Clone)]
pub struct MockConnection {
    local: PlayerId,
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    connected: bool,
    accept_connect: bool,
    fail_sends: bool,
    sent: Vec<Vec<u8>>,
    inbox: VecDeque<ConnectionEvent>,
}

impl MockConnection {
    pub fn new(id: &str) -> Self {
        MockConnection {
            local: PlayerId::new(id),
            state: Arc::new(Mutex::new(MockState {
                connected: false,
                accept_connect: true,
                fail_sends: false,
                sent: Vec::new(),
                inbox: VecDeque::new(),
            })),
        }
    }

    /// A transport whose `connect` is refused.
    pub fn refusing(id: &str) -> Self {
        let conn = Self::new(id);
        conn.lock().accept_connect = false;
        conn
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock poisoned")
    }

    /// Make every subsequent `send` fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// Script one inbound server event.
    pub fn push_event(&self, event: ServerEvent) {
        let bytes = event.to_bytes().expect("test event serializes");
        self.lock().inbox.push_back(ConnectionEvent::Message(bytes));
    }

    /// Script a raw inbound frame (for malformed-input tests).
    pub fn push_raw(&self, data: Vec<u8>) {
        self.lock().inbox.push_back(ConnectionEvent::Message(data));
    }

    /// Script a server-side connection drop.
    pub fn push_disconnect(&self) {
        let mut state = self.lock();
        state.connected = false;
        state.inbox.push_back(ConnectionEvent::Disconnected);
    }

    /// Every request the client has sent, decoded, oldest first.
    pub fn sent_requests(&self) -> Vec<ClientRequest> {
        self.lock()
            .sent
            .iter()
            .map(|data| ClientRequest::from_bytes(data).expect("client sends valid frames"))
            .collect()
    }
}

impl Connection for MockConnection {
    fn connect(&mut self) -> bool {
        let mut state = self.lock();
        if !state.accept_connect {
            return false;
        }
        if !state.connected {
            state.connected = true;
            state.inbox.push_back(ConnectionEvent::Connected);
        }
        true
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn disconnect(&mut self) {
        self.lock().connected = false;
    }

    fn local_id(&self) -> Option<PlayerId> {
        self.is_connected().then(|| self.local.clone())
    }

    fn send(&mut self, data: Vec<u8>) -> Result<(), ClientError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(ClientError::NotConnected);
        }
        if state.fail_sends {
            return Err(ClientError::SendFailed("mock send failure".to_string()));
        }
        state.sent.push(data);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<ConnectionEvent> {
        self.lock().inbox.drain(..).collect()
    }
}
