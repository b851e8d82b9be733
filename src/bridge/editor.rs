use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use super::autosave::{AutosaveScheduler, AutosaveTarget, Ownership};
use super::buffer::EditingBuffer;
use super::client_bridge::{ClientBridge, EventSink, LocalEdit};
use super::connection::{ConnectionEvent, ConnectionSink, WsConnection};
use crate::clients::HttpNoteApi;
use crate::config::Config;
use crate::models::NoteId;
use crate::services::{NotePersistence, PersistenceError};

/// The authenticated user of a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
}

/// Everything one tab needs to edit a note collaboratively: the bridge to the
/// room and the autosave timer, both following the open note.
pub struct NoteEditor<S> {
    identity: Identity,
    bridge: ClientBridge<S>,
    autosave: AutosaveScheduler,
    store: Arc<dyn NotePersistence>,
    connected: bool,
    has_connected: bool,
}

impl<S: EventSink> NoteEditor<S> {
    pub fn new(identity: Identity, sink: S, store: Arc<dyn NotePersistence>, config: &Config) -> Self {
        let buffer = EditingBuffer::default();
        let autosave = AutosaveScheduler::new(store.clone(), config.autosave_period(), buffer.subscribe());
        let bridge = ClientBridge::new(sink, buffer).with_rejoin_on_reconnect(config.rejoin_on_reconnect);
        Self {
            identity,
            bridge,
            autosave,
            store,
            connected: false,
            has_connected: false,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn bridge(&self) -> &ClientBridge<S> {
        &self.bridge
    }

    pub fn autosave_target(&self) -> Option<&AutosaveTarget> {
        self.autosave.target()
    }

    pub fn content(&self) -> String {
        self.bridge.buffer().content()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Load `note_id` from storage, join its room and point autosave at it.
    /// Nothing changes when the note cannot be loaded.
    pub async fn open(&mut self, note_id: NoteId, ownership: Ownership) -> Result<(), PersistenceError> {
        let note = self
            .store
            .fetch_note(&note_id)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(note_id.clone()))?;

        self.bridge.load(note.content);
        self.bridge.open(note_id.clone());
        self.autosave
            .retarget(AutosaveTarget::new(self.identity.user_id, note_id, ownership));
        Ok(())
    }

    /// Stop editing: no more autosaves. The room is left on the next open or
    /// when the connection closes.
    pub fn close(&mut self) {
        if let Some(target) = self.autosave.target() {
            info!("Closing note {}", target.note_id());
        }
        self.autosave.stop();
    }

    pub fn type_text(&mut self, text: impl Into<String>) -> LocalEdit {
        self.bridge.type_text(text)
    }

    pub fn send_presence(&self, payload: Value) {
        self.bridge.send_presence(payload);
    }

    /// Apply a connection event. Returns presence payloads from peers.
    pub fn handle_event(&mut self, event: ConnectionEvent) -> Option<Value> {
        match event {
            ConnectionEvent::Connected => {
                if self.has_connected && !self.connected {
                    self.bridge.on_reconnect();
                }
                self.connected = true;
                self.has_connected = true;
                None
            }
            ConnectionEvent::Disconnected => {
                self.connected = false;
                None
            }
            ConnectionEvent::Message(message) => self.bridge.on_server_message(message),
        }
    }

    /// Manual save. Unlike autosave, failures are returned to the caller.
    pub async fn save(&self) -> Result<(), PersistenceError> {
        self.autosave.save_now().await.inspect_err(|e| {
            error!("Saving failed: {}", e);
        })
    }
}

impl NoteEditor<ConnectionSink> {
    /// Open a tab against the configured server: one socket to `ws_url` and
    /// the REST API at `api_base_url` for persistence.
    pub fn connect(identity: Identity, config: &Config) -> Result<(Self, WsConnection), PersistenceError> {
        let store: Arc<dyn NotePersistence> = Arc::new(HttpNoteApi::new(config.api_base_url.as_str())?);
        let connection = WsConnection::spawn(config.ws_url.as_str(), config.reconnect_delay());
        let editor = NoteEditor::new(identity, connection.sink.clone(), store, config);
        Ok((editor, connection))
    }
}
