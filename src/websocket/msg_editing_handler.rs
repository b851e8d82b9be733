use serde_json::Value;
use tracing::debug;

use crate::models::SendMessage;
use crate::ws::Session;

/// Handle editing feedback: relay the presence payload to the other viewers
pub async fn handle_editing_message(feedback: Value, session: &Session) {
    let peers = session.relay(SendMessage::Editing(feedback)).await;
    debug!("User {} is editing, told {} peers", session.id(), peers);
}
