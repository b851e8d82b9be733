#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use note_collab::config::Config;
use note_collab::models::{NoteId, ReceivedMessage, SendMessage};
use note_collab::routes::create_app;
use note_collab::services::MemoryNoteStore;
use note_collab::state::AppState;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// A server on an ephemeral port backed by an in-memory store
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryNoteStore>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let store = Arc::new(MemoryNoteStore::new());
        store.insert(1, NoteId::from(42), "").await;
        store.insert(1, NoteId::from(7), "").await;
        store.insert(2, NoteId::from(8), "owned by two").await;

        let state = Arc::new(AppState::new(Config::default(), store.clone()));
        let app = create_app(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self { addr, state, store, handle }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn client(&self) -> TestClient {
        let (ws, _) = connect_async(self.ws_url()).await.expect("connect to test server");
        TestClient { ws }
    }

    /// Wait until `note_id`'s room holds exactly `members` sessions
    pub async fn wait_for_members(&self, note_id: impl Into<NoteId>, members: usize) {
        let note_id = note_id.into();
        let rooms = self.state.coordinator.rooms().clone();
        tokio::time::timeout(RECV_TIMEOUT, async {
            while rooms.member_count(&note_id).await != members {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("room {} never reached {} members", note_id, members));
    }

    pub async fn wait_for_sessions(&self, sessions: usize) {
        let coordinator = self.state.coordinator.clone();
        tokio::time::timeout(RECV_TIMEOUT, async {
            while coordinator.session_count().await != sessions {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("server never reached {} sessions", sessions));
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A raw protocol client standing in for one browser tab
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn send(&mut self, message: ReceivedMessage) {
        let text = serde_json::to_string(&message).expect("encode event");
        self.ws.send(Message::text(text)).await.expect("send event");
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::text(text.to_string())).await.expect("send raw frame");
    }

    pub async fn open(&mut self, note_id: impl Into<NoteId>) {
        self.send(ReceivedMessage::NoteOpen(note_id.into())).await;
    }

    pub async fn update(&mut self, content: &str) {
        self.send(ReceivedMessage::NoteUpdate(content.to_string())).await;
    }

    /// Next server event, failing the test if none arrives in time
    pub async fn recv(&mut self) -> SendMessage {
        tokio::time::timeout(RECV_TIMEOUT, self.next_event())
            .await
            .expect("timed out waiting for a server event")
            .expect("connection closed")
    }

    /// Assert that no server event arrives for a short while
    pub async fn assert_silent(&mut self) {
        if let Ok(Some(event)) = tokio::time::timeout(QUIET_PERIOD, self.next_event()).await {
            panic!("unexpected server event: {:?}", event);
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }

    async fn next_event(&mut self) -> Option<SendMessage> {
        while let Some(frame) = self.ws.next().await {
            match frame.ok()? {
                Message::Text(text) => {
                    return Some(serde_json::from_str(text.as_str()).expect("decode server event"));
                }
                Message::Close(_) => return None,
                _ => continue,
            }
        }
        None
    }
}
