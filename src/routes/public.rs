use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. Reads served here must never leak
/// credential material: the handlers mask `credPass` before responding, and
/// document reads are access-logged even for anonymous callers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Credentials exchange: verifies the stored password hash and issues
        // the session token used by everything under the authenticated router.
        .route("/auth/login", post(handlers::login))
        // GET /assets — full inventory listing, most recently updated first.
        .route("/assets", get(handlers::list_assets))
        // GET /assets/{id} — asset detail plus its recent history trail.
        .route("/assets/{id}", get(handlers::get_asset_detail))
        // GET /docs?category=...&type=...&search=...
        // Filtered document listing. The search term is an OR-group across
        // title, description and tags; credentials come back masked.
        .route("/docs", get(handlers::list_documents))
        // GET /docs/categories — alphabetical category listing.
        .route("/docs/categories", get(handlers::list_categories))
        // GET /docs/{id}
        // Document detail. Records a VIEW access-log row on every hit,
        // anonymous included.
        .route("/docs/{id}", get(handlers::get_document))
        // GET /backups — tracked backup routines.
        .route("/backups", get(handlers::list_routines))
        // GET /backups/{id}/logs — recent execution logs of one routine.
        .route("/backups/{id}/logs", get(handlers::list_backup_logs))
}
