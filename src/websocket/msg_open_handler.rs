use tracing::info;

use crate::models::NoteId;
use crate::ws::Session;

/// Handle note-open: move the session into the room of `note_id`
pub async fn handle_open_message(note_id: NoteId, session: &mut Session) {
    if let Some(previous) = session.current_room() {
        info!("Session {} switching from note {} to note {}", session.id(), previous, note_id);
    }
    session.open_note(note_id).await;
}
