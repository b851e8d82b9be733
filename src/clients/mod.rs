pub mod note_api_client;

pub use note_api_client::HttpNoteApi;
