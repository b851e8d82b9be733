use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::rooms::{BroadcastMessage, RoomRegistry};
use crate::models::{NoteId, SendMessage};

/// Tracks every live session and the room it currently occupies
pub struct SessionCoordinator {
    rooms: Arc<RoomRegistry>,
    sessions: RwLock<HashMap<Uuid, Option<NoteId>>>,
}

impl SessionCoordinator {
    pub fn new(rooms: Arc<RoomRegistry>) -> Self {
        Self {
            rooms,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    /// Register a new session. It is not in any room until a note is opened.
    pub async fn connect(self: &Arc<Self>) -> Session {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, None);
        info!("Session {} connected", id);
        Session {
            id,
            coordinator: self.clone(),
            current_room: None,
            inbox: None,
            closed: false,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Sessions that have not opened a note yet
    pub async fn idle_count(&self) -> usize {
        self.sessions.read().await.values().filter(|room| room.is_none()).count()
    }

    pub async fn current_room(&self, session_id: Uuid) -> Option<NoteId> {
        self.sessions.read().await.get(&session_id).cloned().flatten()
    }

    async fn record_room(&self, session_id: Uuid, room: Option<NoteId>) {
        if let Some(entry) = self.sessions.write().await.get_mut(&session_id) {
            *entry = room;
        }
    }

    async fn release(&self, session_id: Uuid, room: Option<NoteId>) {
        if let Some(room) = room {
            self.rooms.release(&room).await;
        }
        self.sessions.write().await.remove(&session_id);
        info!("Session {} disconnected", session_id);
    }
}

/// Server side state of one connection
pub struct Session {
    id: Uuid,
    coordinator: Arc<SessionCoordinator>,
    current_room: Option<NoteId>,
    inbox: Option<broadcast::Receiver<BroadcastMessage>>,
    closed: bool,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_room(&self) -> Option<&NoteId> {
        self.current_room.as_ref()
    }

    /// Leave the current room, if any, then join the room of `note_id`.
    pub async fn open_note(&mut self, note_id: NoteId) {
        self.leave().await;
        self.inbox = Some(self.coordinator.rooms.join(&note_id).await);
        self.coordinator.record_room(self.id, Some(note_id.clone())).await;
        info!("Session {} is editing note {}", self.id, note_id);
        self.current_room = Some(note_id);
    }

    async fn leave(&mut self) {
        // Membership ends with the receiver; drop it before releasing the room
        self.inbox = None;
        if let Some(room) = self.current_room.take() {
            self.coordinator.rooms.release(&room).await;
            self.coordinator.record_room(self.id, None).await;
            debug!("Session {} left note {}", self.id, room);
        }
    }

    /// Fan `message` out to every other session in this session's room.
    /// Returns the number of peers reached; without a room the message is
    /// dropped.
    pub async fn relay(&self, message: SendMessage) -> usize {
        let Some(room) = &self.current_room else {
            debug!("Session {} has no open note, dropping message", self.id);
            return 0;
        };
        let reached = self
            .coordinator
            .rooms
            .broadcast(room, BroadcastMessage { sender_id: self.id, message })
            .await;
        reached.saturating_sub(1)
    }

    /// Next message relayed by a peer in the current room. Pends forever while
    /// no note is open.
    pub async fn recv(&mut self) -> Option<SendMessage> {
        let Some(inbox) = self.inbox.as_mut() else {
            return std::future::pending().await;
        };
        loop {
            match inbox.recv().await {
                // Skip messages from this session to prevent echo
                Ok(msg) if msg.sender_id == self.id => continue,
                Ok(msg) => return Some(msg.message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Session {} lagged behind, {} messages skipped", self.id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Deregister the session and release its room membership
    pub async fn disconnect(mut self) {
        self.closed = true;
        self.inbox = None;
        let room = self.current_room.take();
        self.coordinator.release(self.id, room).await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Dropped without disconnect (aborted task); clean up in the background
        self.inbox = None;
        let coordinator = self.coordinator.clone();
        let id = self.id;
        let room = self.current_room.take();
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                coordinator.release(id, room).await;
            });
        }
    }
}
