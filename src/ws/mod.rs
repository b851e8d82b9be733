pub mod rooms;
pub mod session;

pub use rooms::{BroadcastMessage, RoomRegistry};
pub use session::{Session, SessionCoordinator};
