use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::buffer::EditingBuffer;
use crate::models::{NoteId, ReceivedMessage, SendMessage};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound half of a tab's connection. Sends are fire-and-forget.
pub trait EventSink: Send + Sync {
    fn emit(&self, message: ReceivedMessage) -> Result<(), TransportError>;
}

/// Result of running the local change handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEdit {
    /// Sent to the room as a `note-update`
    Sent,
    /// The change was a just-applied remote update and was not sent back
    Suppressed,
}

/// Binds one tab's editing buffer to the wire protocol.
///
/// Local changes and applied remote updates reach the same change handler,
/// `apply_local_edit`. A remote update raises the suppression flag first so
/// the handler swallows exactly that one change instead of echoing it.
pub struct ClientBridge<S> {
    sink: S,
    buffer: EditingBuffer,
    suppress_next_change: bool,
    current_note: Option<NoteId>,
    rejoin_on_reconnect: bool,
}

impl<S: EventSink> ClientBridge<S> {
    pub fn new(sink: S, buffer: EditingBuffer) -> Self {
        Self {
            sink,
            buffer,
            suppress_next_change: false,
            current_note: None,
            rejoin_on_reconnect: false,
        }
    }

    pub fn with_rejoin_on_reconnect(mut self, rejoin: bool) -> Self {
        self.rejoin_on_reconnect = rejoin;
        self
    }

    pub fn buffer(&self) -> &EditingBuffer {
        &self.buffer
    }

    pub fn current_note(&self) -> Option<&NoteId> {
        self.current_note.as_ref()
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppress_next_change
    }

    /// Tell the server this tab now views `note_id`. The server leaves the
    /// previous room on our behalf.
    pub fn open(&mut self, note_id: NoteId) {
        info!("Opening note {}", note_id);
        self.current_note = Some(note_id.clone());
        self.send(ReceivedMessage::NoteOpen(note_id));
    }

    /// Replace the buffer with stored content without treating it as an edit
    pub fn load(&mut self, content: impl Into<String>) {
        self.buffer.replace(content);
    }

    /// The user typed: mutate the buffer, then run the change handler
    pub fn type_text(&mut self, text: impl Into<String>) -> LocalEdit {
        let text = text.into();
        self.buffer.replace(text.clone());
        self.apply_local_edit(text)
    }

    /// Change handler, run after every buffer mutation.
    pub fn apply_local_edit(&mut self, new_text: String) -> LocalEdit {
        if self.suppress_next_change {
            self.suppress_next_change = false;
            debug!("Change came from a remote update, not sending it back");
            return LocalEdit::Suppressed;
        }
        self.send(ReceivedMessage::NoteUpdate(new_text));
        LocalEdit::Sent
    }

    /// Apply an update relayed from a peer
    pub fn apply_remote_edit(&mut self, payload: String) {
        // Must be raised before the mutation that runs the change handler
        self.suppress_next_change = true;
        self.buffer.replace(payload.clone());
        self.apply_local_edit(payload);
    }

    pub fn send_presence(&self, payload: Value) {
        self.send(ReceivedMessage::Editing(payload));
    }

    /// Apply a server event. Presence payloads are handed back to the caller.
    pub fn on_server_message(&mut self, message: SendMessage) -> Option<Value> {
        match message {
            SendMessage::NoteContent(content) => {
                debug!("Note update received ({} bytes)", content.len());
                self.apply_remote_edit(content);
                None
            }
            SendMessage::Editing(payload) => Some(payload),
        }
    }

    /// The transport came back after a loss. The server side session is new
    /// and in no room.
    pub fn on_reconnect(&mut self) {
        match (&self.current_note, self.rejoin_on_reconnect) {
            (Some(note_id), true) => {
                let note_id = note_id.clone();
                info!("Reconnected, rejoining note {}", note_id);
                self.send(ReceivedMessage::NoteOpen(note_id));
            }
            (Some(note_id), false) => {
                warn!("Reconnected without rejoining note {}; updates stop until it is reopened", note_id);
            }
            (None, _) => debug!("Reconnected with no open note"),
        }
    }

    fn send(&self, message: ReceivedMessage) {
        if let Err(e) = self.sink.emit(message) {
            warn!("Dropping outbound event: {}", e);
        }
    }
}
