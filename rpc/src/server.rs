//! Axum-based HTTP server.

use crate::handlers;
use crate::metrics::Metrics;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::routing::{delete, get, post};
use axum::Router;
use praman_credential::CredentialService;
use praman_orchestrator::FlowOrchestrator;
use praman_registry::RegistryStore;
use praman_store::CredentialStore;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Everything the handlers require from a storage backend.
pub trait CoreStore: RegistryStore + CredentialStore + Send + Sync + 'static {}

impl<T> CoreStore for T where T: RegistryStore + CredentialStore + Send + Sync + 'static {}

/// Shared handler state.
pub struct AppState<S> {
    pub orchestrator: Arc<FlowOrchestrator<S>>,
    pub credentials: Arc<CredentialService<S>>,
    pub metrics: Arc<Metrics>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            credentials: Arc::clone(&self.credentials),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Build the full API router.
pub fn build_router<S: CoreStore>(state: AppState<S>) -> Router {
    let metrics = Arc::clone(&state.metrics);
    Router::new()
        // Issuance flows
        .route("/v1/identities/challenge", post(handlers::identity_challenge::<S>))
        .route("/v1/identities/verify", post(handlers::identity_verify::<S>))
        .route("/v1/identities", post(handlers::create_identity::<S>))
        .route("/v1/identities/search", get(handlers::search_identities::<S>))
        .route("/v1/identities/:id", get(handlers::lookup_identity::<S>))
        .route("/v1/identities/:id/blacklist", post(handlers::set_blacklist::<S>))
        .route("/v1/tax-ids/challenge", post(handlers::tax_challenge::<S>))
        .route("/v1/tax-ids/verify", post(handlers::tax_verify::<S>))
        .route("/v1/tax-ids", post(handlers::issue_tax_id::<S>))
        .route("/v1/entities/challenge", post(handlers::entity_challenge::<S>))
        .route("/v1/entities/verify", post(handlers::entity_verify::<S>))
        .route("/v1/entities", post(handlers::register_entity::<S>))
        .route("/v1/entities/search", get(handlers::search_entities::<S>))
        .route("/v1/entities/:id", get(handlers::lookup_entity::<S>))
        .route("/v1/entities/:id/summary", get(handlers::entity_summary::<S>))
        .route("/v1/entities/:id/suspension", post(handlers::set_suspension::<S>))
        // Invoices and compliance
        .route(
            "/v1/entities/:id/invoices",
            post(handlers::record_invoice::<S>).get(handlers::list_invoices::<S>),
        )
        .route("/v1/invoices/:id/status", post(handlers::update_invoice_status::<S>))
        .route(
            "/v1/entities/:id/compliance",
            post(handlers::file_compliance::<S>).get(handlers::compliance_history::<S>),
        )
        // Consumers and evaluation
        .route("/v1/consumers", post(handlers::mint_consumer::<S>))
        .route("/v1/consumers/:name/rotate", post(handlers::rotate_consumer::<S>))
        .route("/v1/consumers/:name", delete(handlers::revoke_consumer::<S>))
        .route("/v1/evaluate", post(handlers::evaluate_subject::<S>))
        // Operational
        .route("/v1/audit", get(handlers::recent_audit::<S>))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics::<S>))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            let metrics = Arc::clone(&metrics);
            async move {
                metrics.requests_total.inc();
                next.run(req).await
            }
        }))
        .with_state(state)
}

/// The HTTP server: binds and serves until the shutdown future resolves.
pub struct RpcServer<S> {
    state: AppState<S>,
    addr: SocketAddr,
}

impl<S: CoreStore> RpcServer<S> {
    pub fn new(state: AppState<S>, addr: SocketAddr) -> Self {
        Self { state, addr }
    }

    pub async fn serve(self, shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "rpc server listening");
        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
    }
}
