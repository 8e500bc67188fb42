//! Society Portal Gateway
//!
//! The single entry point for the portal:
//! - Public read-only pages (placeholder-degrading)
//! - Admin panels behind JWT sessions
//! - Sign-in/sign-up against the identity provider
//! - Observability (logging, metrics, tracing)

mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use portal_common::{
    auth::{AuthProvider, HttpAuthProvider, JwtManager, JwtState},
    config::AppConfig,
    metrics,
    store::{HttpDocumentStore, HttpObjectStore},
    DocumentStore, ObjectStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub docs: Arc<dyn DocumentStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub jwt: Arc<JwtManager>,
}

impl JwtState for AppState {
    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;
    let config = Arc::new(config);

    // Initialize tracing
    init_tracing(&config);

    info!("Starting Society Portal Gateway v{}", portal_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter on {}", metrics_addr);
    }

    // External collaborators
    let docs: Arc<dyn DocumentStore> = Arc::new(HttpDocumentStore::new(&config.document_store)?);
    let objects: Arc<dyn ObjectStore> = Arc::new(HttpObjectStore::new(&config.object_store)?);
    let auth: Arc<dyn AuthProvider> = Arc::new(HttpAuthProvider::new(&config.auth)?);
    let jwt = Arc::new(JwtManager::from_config(&config.auth)?);

    let state = AppState {
        config: config.clone(),
        docs,
        objects,
        auth,
        jwt,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Multipart bodies carry PDFs; limits themselves are enforced
    // per-kind by the panels.
    let body_limit =
        DefaultBodyLimit::max(state.config.uploads.pdf_max_bytes + 1024 * 1024);

    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/awards", get(handlers::public::awards))
        .route("/gallery", get(handlers::public::gallery))
        .route("/journals", get(handlers::public::journals))
        .route("/members", get(handlers::public::members))
        .route("/council", get(handlers::public::council))
        .route("/notices", get(handlers::public::notices));

    // Admin routes (JWT session required per handler)
    let admin_routes = Router::new()
        .route("/awards", get(handlers::admin::list_awards))
        .route("/awards", post(handlers::admin::add_award))
        .route("/awards/{id}", delete(handlers::admin::remove_award))
        .route("/gallery", get(handlers::admin::list_gallery))
        .route("/gallery", post(handlers::admin::add_gallery_image))
        .route("/gallery/{id}", delete(handlers::admin::remove_gallery_image))
        .route("/journals", get(handlers::admin::list_journals))
        .route("/journals", post(handlers::admin::add_journal))
        .route("/journals/{id}", delete(handlers::admin::remove_journal))
        .route("/members", get(handlers::admin::list_members))
        .route("/members", post(handlers::admin::add_member))
        .route("/members/{id}", delete(handlers::admin::remove_member))
        .route("/council", get(handlers::admin::list_council))
        .route("/council", post(handlers::admin::add_council_member))
        .route("/council/{id}", patch(handlers::admin::edit_council_member))
        .route("/council/{id}", delete(handlers::admin::remove_council_member))
        .route("/notices", get(handlers::admin::list_notices))
        .route("/notices", post(handlers::admin::add_notice))
        .route("/notices/{id}", delete(handlers::admin::remove_notice));

    let auth_routes = Router::new()
        .route("/sign-in", post(handlers::auth::sign_in))
        .route("/sign-up", post(handlers::auth::sign_up))
        .route("/sign-out", post(handlers::auth::sign_out));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1/public", public_routes)
        .nest("/v1/admin", admin_routes)
        .nest("/v1/auth", auth_routes)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            tracing::error!("failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
