use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_backend().await {
        Ok(backend) => {
            if let Err(err) = backend.health_check().await {
                warn!(error = %err, "backend health check failed");
            }
        }
        Err(_) => warn!("backend unavailable (degraded mode)"),
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
