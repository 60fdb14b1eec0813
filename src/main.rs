//! Rinha queue backend entrypoint wiring REST, SSE and MongoDB layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rinha_queue_back::{
    config::AppConfig,
    dao::{backend::DataBackend, storage::StorageError},
    routes,
    services::{backend_supervisor, realtime},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    tokio::spawn(backend_supervisor::run(app_state.clone(), connect_backend));
    tokio::spawn(realtime::run(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Establish the hosted MongoDB backend, or an in-memory one on
/// feature-less builds.
#[cfg(feature = "mongo-store")]
async fn connect_backend() -> Result<Arc<dyn DataBackend>, StorageError> {
    use rinha_queue_back::dao::mongodb::{MongoBackend, MongoConfig};

    let config = MongoConfig::from_env().await?;
    let backend = MongoBackend::connect(config).await?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "mongo-store"))]
async fn connect_backend() -> Result<Arc<dyn DataBackend>, StorageError> {
    use rinha_queue_back::dao::memory::MemoryBackend;

    tracing::warn!("built without the mongo-store feature; data will not survive restarts");
    Ok(Arc::new(MemoryBackend::new()))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: rinha_queue_back::state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
