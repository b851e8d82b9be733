mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{TestServer, RECV_TIMEOUT};
use note_collab::bridge::{ConnectionEvent, Identity, NoteEditor, Ownership, WsConnection};
use note_collab::clients::HttpNoteApi;
use note_collab::config::Config;
use note_collab::models::{NoteId, ReceivedMessage, SendMessage};
use note_collab::services::NotePersistence;

#[tokio::test]
async fn update_reaches_every_other_viewer_but_not_the_sender() {
    let server = TestServer::start().await;
    let mut a = server.client().await;
    let mut b = server.client().await;
    let mut c = server.client().await;

    a.open(42).await;
    b.open(42).await;
    c.open(42).await;
    server.wait_for_members(42, 3).await;

    a.update("hello").await;

    assert_eq!(b.recv().await, SendMessage::NoteContent("hello".into()));
    assert_eq!(c.recv().await, SendMessage::NoteContent("hello".into()));
    a.assert_silent().await;
}

#[tokio::test]
async fn numeric_and_string_ids_share_a_room() {
    let server = TestServer::start().await;
    let mut a = server.client().await;
    let mut b = server.client().await;

    a.send_raw(r#"{"event":"note-open","data":42}"#).await;
    b.send_raw(r#"{"event":"note-open","data":"42"}"#).await;
    server.wait_for_members(42, 2).await;

    b.update("typed as text").await;
    assert_eq!(a.recv().await, SendMessage::NoteContent("typed as text".into()));
}

#[tokio::test]
async fn update_without_an_open_note_goes_nowhere() {
    let server = TestServer::start().await;
    let mut idle = server.client().await;
    let mut viewer = server.client().await;
    viewer.open(42).await;
    server.wait_for_members(42, 1).await;

    idle.update("lost").await;
    viewer.assert_silent().await;

    // The idle connection is still usable afterwards
    idle.open(42).await;
    server.wait_for_members(42, 2).await;
    idle.update("found").await;
    assert_eq!(viewer.recv().await, SendMessage::NoteContent("found".into()));
}

#[tokio::test]
async fn malformed_events_are_ignored() {
    let server = TestServer::start().await;
    let mut a = server.client().await;
    let mut b = server.client().await;
    a.open(42).await;
    b.open(42).await;
    server.wait_for_members(42, 2).await;

    a.send_raw("not json").await;
    a.send_raw(r#"{"event":"note-delete","data":42}"#).await;
    b.assert_silent().await;

    a.update("still connected").await;
    assert_eq!(b.recv().await, SendMessage::NoteContent("still connected".into()));
}

#[tokio::test]
async fn switching_notes_leaves_the_previous_room() {
    let server = TestServer::start().await;
    let mut switcher = server.client().await;
    let mut on_first = server.client().await;
    let mut on_second = server.client().await;

    switcher.open(1).await;
    on_first.open(1).await;
    on_second.open(2).await;
    server.wait_for_members(1, 2).await;
    server.wait_for_members(2, 1).await;

    switcher.open(2).await;
    server.wait_for_members(1, 1).await;
    server.wait_for_members(2, 2).await;

    on_first.update("for note 1").await;
    switcher.assert_silent().await;

    on_second.update("for note 2").await;
    assert_eq!(switcher.recv().await, SendMessage::NoteContent("for note 2".into()));
}

#[tokio::test]
async fn disconnect_removes_the_session_from_its_room() {
    let server = TestServer::start().await;
    let mut leaving = server.client().await;
    let mut staying = server.client().await;

    leaving.open(7).await;
    staying.open(7).await;
    server.wait_for_members(7, 2).await;

    leaving.close().await;
    server.wait_for_members(7, 1).await;
    server.wait_for_sessions(1).await;

    // Relaying into a room of one reaches nobody and is not an error
    staying.update("alone").await;
    staying.assert_silent().await;

    staying.close().await;
    server.wait_for_sessions(0).await;
    assert_eq!(server.state.coordinator.rooms().room_count().await, 0);
}

#[tokio::test]
async fn editing_presence_is_relayed_verbatim() {
    let server = TestServer::start().await;
    let mut a = server.client().await;
    let mut b = server.client().await;
    a.open(42).await;
    b.open(42).await;
    server.wait_for_members(42, 2).await;

    let presence = serde_json::json!({"user": "alice", "cursor": 3});
    a.send(ReceivedMessage::Editing(presence.clone())).await;

    assert_eq!(b.recv().await, SendMessage::Editing(presence));
    a.assert_silent().await;
}

/// Drive `conn` events into `editor` until `done` holds or the timeout hits
async fn pump_until<S, F>(editor: &mut NoteEditor<S>, conn: &mut WsConnection, mut done: F)
where
    S: note_collab::bridge::EventSink,
    F: FnMut(&NoteEditor<S>) -> bool,
{
    tokio::time::timeout(RECV_TIMEOUT, async {
        while !done(editor) {
            let event = conn.events.recv().await.expect("connection task stopped");
            editor.handle_event(event);
        }
    })
    .await
    .expect("editor never reached the expected state");
}

#[tokio::test]
async fn editors_converge_and_autosave_over_the_network() {
    let server = TestServer::start().await;
    let config = Config {
        autosave_interval_ms: 150,
        api_base_url: server.http_url(),
        ws_url: server.ws_url(),
        ..Config::default()
    };

    let (mut owner, mut conn_a) = NoteEditor::connect(Identity { user_id: 1 }, &config).unwrap();

    // A second tab wired by hand over the same collaborators
    let api: Arc<dyn NotePersistence> = Arc::new(HttpNoteApi::new(server.http_url()).unwrap());
    let mut conn_b = WsConnection::spawn(server.ws_url(), config.reconnect_delay());
    let mut guest = NoteEditor::new(Identity { user_id: 2 }, conn_b.sink.clone(), api, &config);

    owner.open(NoteId::from(42), Ownership::Owned).await.unwrap();
    guest.open(NoteId::from(42), Ownership::Shared).await.unwrap();
    server.wait_for_members(42, 2).await;
    pump_until(&mut owner, &mut conn_a, |e| e.is_connected()).await;
    pump_until(&mut guest, &mut conn_b, |e| e.is_connected()).await;

    owner.type_text("hello");
    pump_until(&mut guest, &mut conn_b, |e| e.content() == "hello").await;

    // The guest applied the update without sending it back
    let echoed = tokio::time::timeout(Duration::from_millis(300), conn_a.events.recv()).await;
    assert!(
        !matches!(echoed, Ok(Some(ConnectionEvent::Message(_)))),
        "owner received its own update back: {:?}",
        echoed
    );

    tokio::time::sleep(Duration::from_millis(400)).await;
    let stored = server.store.fetch_note(&NoteId::from(42)).await.unwrap().unwrap();
    assert_eq!(stored.content, "hello");

    owner.close();
    guest.close();
    conn_a.shutdown();
    conn_b.shutdown();
}
