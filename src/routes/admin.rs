use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under `/admin`. The session middleware guarantees an identity;
/// the ADMIN role check itself happens inside each handler.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/logs
        // The audit trail: up to one hundred most recent privileged actions,
        // newest first, with the acting user's name/email joined in.
        .route("/logs", get(handlers::get_audit_logs))
        // GET /admin/stats
        // Aggregated inventory/backup counters for the dashboard.
        .route("/stats", get(handlers::get_dashboard_stats))
}
