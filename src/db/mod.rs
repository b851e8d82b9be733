pub mod dbnotes;

pub use dbnotes::PgNoteStore;
