pub mod model;
mod sse;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;

use crate::{
    config::AppConfig,
    dao::backend::DataBackend,
    error::ServiceError,
    state::model::{MatchState, QueueSnapshot},
};

pub use self::sse::SseHub;

/// Cheaply cloneable handle to the shared application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the backend slot, the owned queue/match
/// snapshots published through watch channels, and the SSE hub.
///
/// Snapshots are owned here and published read-only; every mutation goes
/// through the backend followed by a synchronizer refresh.
pub struct AppState {
    backend: RwLock<Option<Arc<dyn DataBackend>>>,
    degraded: watch::Sender<bool>,
    queue: watch::Sender<Arc<QueueSnapshot>>,
    matches: watch::Sender<Arc<Vec<MatchState>>>,
    sse: SseHub,
    clock_task: Mutex<Option<JoinHandle<()>>>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a data backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let (queue_tx, _rx) = watch::channel(Arc::new(QueueSnapshot::default()));
        let (matches_tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Arc::new(Self {
            backend: RwLock::new(None),
            degraded: degraded_tx,
            queue: queue_tx,
            matches: matches_tx,
            sse: SseHub::new(16),
            clock_task: Mutex::new(None),
            config,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current data backend, if one is installed.
    pub async fn backend(&self) -> Option<Arc<dyn DataBackend>> {
        let guard = self.backend.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the data backend or fail with a degraded-mode error.
    pub async fn require_backend(&self) -> Result<Arc<dyn DataBackend>, ServiceError> {
        self.backend().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new data backend implementation and leave degraded mode.
    pub async fn install_backend(&self, backend: Arc<dyn DataBackend>) {
        {
            let mut guard = self.backend.write().await;
            *guard = Some(backend);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current data backend and enter degraded mode.
    pub async fn clear_backend(&self) {
        {
            let mut guard = self.backend.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag, as last broadcast.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    ///
    /// The comparison reads the watch value itself, not the backend slot:
    /// the supervisor flags an outage while the backend stays installed, and
    /// recovery must be able to clear that flag again.
    pub async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Latest published queue snapshot.
    pub fn queue_snapshot(&self) -> Arc<QueueSnapshot> {
        self.queue.borrow().clone()
    }

    /// Replace the queue snapshot, waking subscribers.
    pub fn publish_queue(&self, snapshot: QueueSnapshot) {
        self.queue.send_replace(Arc::new(snapshot));
    }

    /// Subscribe to queue snapshot updates.
    pub fn watch_queue(&self) -> watch::Receiver<Arc<QueueSnapshot>> {
        self.queue.subscribe()
    }

    /// Latest published match list.
    pub fn matches_snapshot(&self) -> Arc<Vec<MatchState>> {
        self.matches.borrow().clone()
    }

    /// Replace the match list, waking subscribers.
    pub fn publish_matches(&self, matches: Vec<MatchState>) {
        self.matches.send_replace(Arc::new(matches));
    }

    /// Mutate the match list in place (clone-on-write), waking subscribers.
    /// Used by the clock so local decrements are visible before any
    /// checkpoint write is issued.
    pub fn modify_matches(&self, apply: impl FnOnce(&mut Vec<MatchState>)) {
        self.matches.send_modify(|current| {
            let mut next = (**current).clone();
            apply(&mut next);
            *current = Arc::new(next);
        });
    }

    /// Subscribe to match list updates.
    pub fn watch_matches(&self) -> watch::Receiver<Arc<Vec<MatchState>>> {
        self.matches.subscribe()
    }

    /// Broadcast hub feeding the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Slot holding the running clock task, if any.
    pub fn clock_task(&self) -> &Mutex<Option<JoinHandle<()>>> {
        &self.clock_task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::memory::MemoryBackend;

    #[tokio::test]
    async fn degraded_flag_recovers_while_backend_stays_installed() {
        let state = AppState::new(AppConfig::default());
        state.install_backend(Arc::new(MemoryBackend::new())).await;
        let mut watcher = state.degraded_watcher();
        assert!(!*watcher.borrow_and_update());

        // Outage reported by the supervisor without dropping the backend.
        state.update_degraded(true).await;
        assert!(*watcher.borrow_and_update());
        assert!(state.is_degraded().await);

        // Recovery must clear the flag again.
        state.update_degraded(false).await;
        assert!(!*watcher.borrow_and_update());
        assert!(!state.is_degraded().await);
    }
}
