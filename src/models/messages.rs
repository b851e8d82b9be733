use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a note, and therefore of the room its viewers share.
///
/// Clients may send either a string or a number; both are normalised to the
/// string form so `42` and `"42"` name the same room.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawNoteId", into = "String")]
pub struct NoteId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNoteId {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<RawNoteId> for NoteId {
    fn from(raw: RawNoteId) -> Self {
        match raw {
            RawNoteId::Text(s) => NoteId(s),
            RawNoteId::Int(n) => NoteId(n.to_string()),
            RawNoteId::Float(f) => NoteId(f.to_string()),
        }
    }
}

impl From<NoteId> for String {
    fn from(id: NoteId) -> Self {
        id.0
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        NoteId(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        NoteId(s)
    }
}

impl From<i64> for NoteId {
    fn from(n: i64) -> Self {
        NoteId(n.to_string())
    }
}

impl NoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form used by the relational store
    pub fn as_i64(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Events sent by a client to the server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ReceivedMessage {
    #[serde(rename = "note-open")]
    NoteOpen(NoteId),
    #[serde(rename = "note-update")]
    NoteUpdate(String),
    #[serde(rename = "editing")]
    Editing(Value),
}

/// Events sent by the server to a client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum SendMessage {
    #[serde(rename = "note_content")]
    NoteContent(String),
    #[serde(rename = "editing")]
    Editing(Value),
}
