use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::{NoteId, SendMessage};

/// A message fanned out to a room, tagged with the session that sent it
#[derive(Debug, Clone)]
pub struct BroadcastMessage {
    pub sender_id: Uuid,
    pub message: SendMessage,
}

/// Group-broadcast primitive over note rooms.
///
/// A room is a broadcast channel; its members are the live receivers. A room
/// exists while it has at least one member and is dropped with its last one.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<NoteId, broadcast::Sender<BroadcastMessage>>>,
    capacity: usize,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Join a room, creating it if needed. Membership lasts as long as the
    /// returned receiver.
    pub async fn join(&self, room: &NoteId) -> broadcast::Receiver<BroadcastMessage> {
        let mut rooms = self.rooms.write().await;
        let capacity = self.capacity;
        rooms
            .entry(room.clone())
            .or_insert_with(|| {
                debug!("Creating room {}", room);
                let (bc, _rx) = broadcast::channel::<BroadcastMessage>(capacity);
                bc
            })
            .subscribe()
    }

    /// Drop the room if its last member is gone. Call after the member's
    /// receiver has been dropped.
    pub async fn release(&self, room: &NoteId) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(room).is_some_and(|bc| bc.receiver_count() == 0) {
            rooms.remove(room);
            debug!("Room {} is empty, removed", room);
        }
    }

    /// Send to every member of `room`, the sender's own session included; the
    /// receiving side filters its own messages. Returns the number of members
    /// reached, zero when the room does not exist.
    pub async fn broadcast(&self, room: &NoteId, msg: BroadcastMessage) -> usize {
        let rooms = self.rooms.read().await;
        match rooms.get(room) {
            Some(bc) => bc.send(msg).unwrap_or(0),
            None => 0,
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn member_count(&self, room: &NoteId) -> usize {
        self.rooms
            .read()
            .await
            .get(room)
            .map_or(0, |bc| bc.receiver_count())
    }

    /// Total memberships across all rooms
    pub async fn total_members(&self) -> usize {
        self.rooms
            .read()
            .await
            .values()
            .map(|bc| bc.receiver_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> BroadcastMessage {
        BroadcastMessage {
            sender_id: Uuid::new_v4(),
            message: SendMessage::NoteContent(text.to_string()),
        }
    }

    #[tokio::test]
    async fn room_lives_as_long_as_its_members() {
        let registry = RoomRegistry::new(8);
        let room = NoteId::from(1);

        let a = registry.join(&room).await;
        let b = registry.join(&room).await;
        assert_eq!(registry.room_count().await, 1);
        assert_eq!(registry.member_count(&room).await, 2);

        drop(a);
        registry.release(&room).await;
        assert_eq!(registry.room_count().await, 1);

        drop(b);
        registry.release(&room).await;
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn broadcast_to_missing_room_reaches_nobody() {
        let registry = RoomRegistry::new(8);
        assert_eq!(registry.broadcast(&NoteId::from("nowhere"), msg("x")).await, 0);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn broadcast_is_scoped_to_the_room() {
        let registry = RoomRegistry::new(8);
        let mut in_one = registry.join(&NoteId::from(1)).await;
        let mut in_two = registry.join(&NoteId::from(2)).await;

        assert_eq!(registry.broadcast(&NoteId::from(1), msg("one")).await, 1);

        let got = in_one.recv().await.unwrap();
        assert_eq!(got.message, SendMessage::NoteContent("one".into()));
        assert!(in_two.try_recv().is_err());
        assert_eq!(registry.total_members().await, 2);
    }
}
