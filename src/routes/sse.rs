use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    services::sse_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/events",
    tag = "sse",
    responses((status = 200, description = "Realtime event stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime queue and match events to connected dashboards.
pub async fn event_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!("new SSE connection");
    let greeting = ServerEvent::json(
        None,
        &Handshake {
            message: "stream connected".into(),
            degraded: state.is_degraded().await,
        },
    )
    .ok();
    sse_service::to_sse_stream(receiver, greeting)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/events", get(event_stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::memory::MemoryBackend, state::AppState};
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn connecting_never_pushes_the_greeting_to_other_subscribers() {
        let state = AppState::new(AppConfig::default());
        state.install_backend(Arc::new(MemoryBackend::new())).await;
        let mut existing = state.sse().subscribe();

        let _stream = event_stream(State(state.clone())).await;

        assert!(matches!(existing.try_recv(), Err(TryRecvError::Empty)));
    }
}
