use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point.
pub use audit::{AuditState, MockAuditRecorder, PostgresAuditRecorder};
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the service,
/// aggregating every path and schema decorated with the utoipa macros.
/// Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::get_me,
        handlers::list_assets, handlers::create_asset, handlers::get_asset_detail,
        handlers::update_asset,
        handlers::list_documents, handlers::create_document, handlers::get_document,
        handlers::update_document, handlers::delete_document, handlers::reveal_credential,
        handlers::list_categories, handlers::create_category, handlers::update_category,
        handlers::delete_category,
        handlers::list_routines, handlers::create_routine, handlers::list_backup_logs,
        handlers::create_backup_log,
        handlers::get_audit_logs, handlers::get_dashboard_stats,
    ),
    components(
        schemas(
            models::Role, models::User, models::Asset, models::AssetHistory,
            models::AssetDetail, models::Document, models::DocumentDetail,
            models::DocCategory, models::DocAccessLog, models::BackupRoutine,
            models::BackupLog, models::AuditLogEntry, models::LoginRequest,
            models::LoginResponse, models::CreateAssetRequest, models::UpdateAssetRequest,
            models::CreateDocumentRequest, models::UpdateDocumentRequest,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreateRoutineRequest, models::CreateBackupLogRequest,
            models::RevealResponse, models::OkResponse, models::DashboardStats,
        )
    ),
    tags(
        (name = "fgreat-portal", description = "Fgreat TI asset & backup tracking API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single, thread-safe container holding all application services and
/// configuration, shared across every incoming request.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: all persisted-entity reads and writes.
    pub repo: RepositoryState,
    /// Audit layer: fire-and-forget audit and document-access trails.
    pub audit: AuditState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors and handlers pull individual components out of AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuditState {
    fn from_ref(app_state: &AppState) -> AuditState {
        app_state.audit.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces a valid session on the authenticated route set. The `AuthUser`
/// extractor performs the actual resolution (token validation + user
/// lookup); a failure rejects the request with a permission-denied response
/// before any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: session required before the handler runs;
        // role requirements are checked inside the handlers.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: nested under '/admin'. The ADMIN role check is
        // performed inside the handlers after session resolution.
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    // Observability and correlation layers (outermost).
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the `TraceLayer` span so every log line of a request carries
/// the correlation id alongside the HTTP method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
