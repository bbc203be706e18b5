//! HTTP API server for the relationship service.
//!
//! Exposes the relationship operations and per-member listings, with
//! structured logging (tracing) and Prometheus metrics. The caller identity
//! is taken from the `x-member-id` header set by the gateway.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use relation_store::{InMemoryCache, Persistor};
use saga::{
    AffinityScheduler, Collaborators, InMemoryChatService, InMemoryPeerService,
    InMemoryProfileCache, InMemoryPushChannel, RelationCoordinator, RelationStore,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::friends::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P: Persistor + Clone + 'static>(
    state: Arc<AppState<P>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<P>))
        .route("/friends/apply", post(routes::friends::apply::<P>))
        .route("/friends/accept", post(routes::friends::accept::<P>))
        .route("/friends/reject", post(routes::friends::reject::<P>))
        .route("/friends/delete", post(routes::friends::delete::<P>))
        .route("/friends/block", post(routes::friends::block::<P>))
        .route("/friends/unblock", post(routes::friends::unblock::<P>))
        .route("/friends/mark", post(routes::friends::mark::<P>))
        .route("/members/{id}/friends", get(routes::members::friends::<P>))
        .route(
            "/members/{id}/applications",
            get(routes::members::applications::<P>),
        )
        .route(
            "/members/{id}/relations/{other}",
            get(routes::members::relation::<P>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over `persistor` with the given collaborators.
///
/// Must be called from within a Tokio runtime (the scheduler starts its lanes).
pub fn create_state<P: Persistor + Clone + 'static>(
    persistor: P,
    config: &Config,
    collaborators: Collaborators,
) -> Arc<AppState<P>> {
    let coordinator = RelationCoordinator::new(
        RelationStore::new(persistor, InMemoryCache::new()),
        AffinityScheduler::new(config.lanes),
        collaborators,
        config.coordinator(),
    );
    Arc::new(AppState { coordinator })
}

/// Creates the default application state with in-memory collaborators.
pub fn create_default_state<P: Persistor + Clone + 'static>(
    persistor: P,
    config: &Config,
) -> Arc<AppState<P>> {
    let collaborators = Collaborators {
        remote: Arc::new(InMemoryPeerService::new()),
        profiles: Arc::new(InMemoryProfileCache::generating()),
        push: Arc::new(InMemoryPushChannel::new()),
        chat: Arc::new(InMemoryChatService::new()),
    };
    create_state(persistor, config, collaborators)
}
