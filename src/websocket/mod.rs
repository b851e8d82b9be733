pub mod handler;
pub mod msg_open_handler;
pub mod msg_update_handler;
pub mod msg_editing_handler;

pub use handler::websocket_handler;
