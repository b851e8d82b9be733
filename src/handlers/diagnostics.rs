use crate::{models::DiagnosticsResponse, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::{info, warn};

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

const MB: u64 = 1024 * 1024;

struct HostLoad {
    cpu_usage: f32,
    used_mb: u64,
    free_mb: u64,
    total_mb: u64,
}

impl HostLoad {
    fn sample() -> Self {
        let monitor = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match monitor.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                HostLoad {
                    cpu_usage: sys.global_cpu_info().cpu_usage(),
                    used_mb: sys.used_memory() / MB,
                    free_mb: sys.free_memory() / MB,
                    total_mb: sys.total_memory() / MB,
                }
            }
            Err(_) => {
                warn!("System monitor lock poisoned, reporting no host load");
                HostLoad { cpu_usage: 0.0, used_mb: 0, free_mb: 0, total_mb: 0 }
            }
        }
    }
}

/// Report live sessions, rooms and host load
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> (StatusCode, Json<DiagnosticsResponse>) {
    let coordinator = &state.coordinator;
    let rooms = coordinator.rooms();

    let response = {
        let load = HostLoad::sample();
        DiagnosticsResponse {
            n_sessions: coordinator.session_count().await as u32,
            n_idle_sessions: coordinator.idle_count().await as u32,
            n_rooms: rooms.room_count().await as u32,
            n_room_members: rooms.total_members().await as u32,
            cpu_usage: load.cpu_usage,
            memory_used_mb: load.used_mb,
            memory_free_mb: load.free_mb,
            memory_total_mb: load.total_mb,
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB, Sessions: {}, Rooms: {}",
        response.cpu_usage, response.memory_used_mb, response.memory_total_mb, response.n_sessions, response.n_rooms
    );

    (StatusCode::OK, Json(response))
}
