/// Backend connection supervision and degraded mode handling.
pub mod backend_supervisor;
/// Pure queue ordering and block assembly.
pub mod blocks;
/// Cooperative countdown clock for active matches.
pub mod clock;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Queue and match lifecycle commands.
pub mod lifecycle;
/// Match list synchronization from backend rows.
pub mod match_sync;
/// Membership resolution and queue counters.
pub mod membership;
/// Read-only projections for dashboards.
pub mod public_service;
/// Queue snapshot synchronization from backend rows.
pub mod queue_sync;
/// Change feed listener keeping snapshots converged.
pub mod realtime;
/// Outcome settlement with points and MVP awards.
pub mod settlement;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
