use tracing::debug;

use crate::models::SendMessage;
use crate::ws::Session;

/// Handle note-update: relay the full text to the other viewers of the note
pub async fn handle_update_message(content: String, session: &Session) {
    let len = content.len();
    let peers = session.relay(SendMessage::NoteContent(content)).await;
    debug!("Received update from {} ({} bytes), sent to {} other users", session.id(), len, peers);
}
