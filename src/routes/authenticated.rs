use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every mutating endpoint lives here, behind the session middleware layered
/// on in `create_router`. Handlers receive a resolved `AuthUser` and apply
/// the role table themselves: most writes require ADMIN or TI, deletes
/// require ADMIN.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/me — profile of the session user.
        .route("/auth/me", get(handlers::get_me))
        // --- Inventory ---
        // POST /assets
        // Registers an asset under its client-assigned tag. One creation
        // event: asset row + "Criação" history row + CREATE_ASSET audit row.
        .route("/assets", post(handlers::create_asset))
        // PUT /assets/{id} — partial update; the tag is immutable.
        .route("/assets/{id}", put(handlers::update_asset))
        // --- Documents ---
        // POST /docs
        // Creates a document; credential secrets are hashed before storage.
        .route("/docs", post(handlers::create_document))
        // PUT/DELETE /docs/{id}
        // Update re-hashes only a genuinely new secret (the mask sentinel
        // means "unchanged"). Delete is ADMIN-only.
        .route(
            "/docs/{id}",
            put(handlers::update_document).delete(handlers::delete_document),
        )
        // POST /docs/{id}/reveal
        // Credential access acknowledgment: logs VIEW_CREDENTIAL and returns
        // the username. No plaintext secret exists to return.
        .route("/docs/{id}/reveal", post(handlers::reveal_credential))
        // --- Document categories ---
        .route("/docs/categories", post(handlers::create_category))
        .route(
            "/docs/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // --- Backups ---
        // POST /backups — registers a routine to track (starts "Pendente").
        .route("/backups", post(handlers::create_routine))
        // POST /backups/{id}/logs
        // Records an execution; log row and routine status/lastRun refresh
        // are a single transaction.
        .route("/backups/{id}/logs", post(handlers::create_backup_log))
}
