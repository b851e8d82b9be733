use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response for liveness and readiness checks
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
    pub message: String,
}
