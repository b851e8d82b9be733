//! Client side of collaborative editing: one tab's buffer, its connection to
//! the server and the autosave timer of the open note.

pub mod autosave;
pub mod buffer;
pub mod client_bridge;
pub mod connection;
pub mod editor;

pub use autosave::{AutosaveScheduler, AutosaveTarget, Ownership};
pub use buffer::EditingBuffer;
pub use client_bridge::{ClientBridge, EventSink, LocalEdit, TransportError};
pub use connection::{ConnectionEvent, ConnectionSink, WsConnection};
pub use editor::{Identity, NoteEditor};
