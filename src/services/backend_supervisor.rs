//! Backend supervisor: establishes the data backend connection, polls its
//! health and drives the degraded flag so the rest of the application can
//! keep serving its last snapshots while storage is away.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{backend::DataBackend, storage::StorageError},
    services::sse_events,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the data backend and keep the shared state in degraded mode
/// whenever it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DataBackend>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(backend) => {
                state.install_backend(backend.clone()).await;
                sse_events::broadcast_system_status(&state, false);
                info!("backend connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match backend.health_check().await {
                        Ok(()) => {
                            if state.is_degraded().await {
                                info!("backend healthy again; leaving degraded mode");
                                state.update_degraded(false).await;
                                sse_events::broadcast_system_status(&state, false);
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(_) => {
                            if reconnect_with_backoff(&state, backend.as_ref()).await {
                                state.update_degraded(false).await;
                                sse_events::broadcast_system_status(&state, false);
                                sleep(HEALTH_POLL_INTERVAL).await;
                            } else {
                                warn!("exhausted backend reconnect attempts; staying in degraded mode");
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "backend connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Retry the in-place reconnect a few times with exponential backoff,
/// flipping the degraded flag on the first failure.
async fn reconnect_with_backoff(state: &SharedState, backend: &dyn DataBackend) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match backend.try_reconnect().await {
            Ok(()) => {
                info!("backend reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "backend reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true).await;
                    sse_events::broadcast_system_status(state, true);
                } else {
                    warn!(attempt, error = %err, "backend reconnect attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
