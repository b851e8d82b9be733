use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Snapshot of live sessions, rooms and host load
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct DiagnosticsResponse {
    /// Connected sessions
    pub n_sessions: u32,
    /// Sessions that have not opened a note
    pub n_idle_sessions: u32,
    /// Notes with at least one viewer
    pub n_rooms: u32,
    pub n_room_members: u32,
    pub cpu_usage: f32,
    pub memory_used_mb: u64,
    pub memory_free_mb: u64,
    pub memory_total_mb: u64,
}
