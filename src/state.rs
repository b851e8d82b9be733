use std::sync::Arc;

use crate::config::Config;
use crate::services::NotePersistence;
use crate::ws::{RoomRegistry, SessionCoordinator};

/// Shared state of the server process
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SessionCoordinator>,
    pub store: Arc<dyn NotePersistence>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn NotePersistence>) -> Self {
        let rooms = Arc::new(RoomRegistry::new(config.broadcast_capacity));
        Self {
            coordinator: Arc::new(SessionCoordinator::new(rooms)),
            store,
            config: Arc::new(config),
        }
    }
}
