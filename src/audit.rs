use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::sync::Mutex;
use uuid::Uuid;

// 1. AuditRecorder Contract

/// AuditRecorder
///
/// Abstract contract for the append-only audit trail. Both methods are
/// fire-and-forget: they run only after the guarded operation has committed,
/// and a failed write is logged for operators but never surfaced to the
/// caller — an audit gap is an accepted failure mode, a failed user request
/// because of one is not.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    /// Appends a privileged-action row (admin review trail).
    async fn record(&self, user_id: Uuid, action: &str, resource: &str);

    /// Appends a document-access row. `user_id` is `None` for anonymous
    /// views, which are recorded all the same.
    async fn record_doc_access(&self, document_id: Uuid, user_id: Option<Uuid>, action: &str);
}

/// AuditState
///
/// The concrete type used to share the recorder across the application state.
pub type AuditState = Arc<dyn AuditRecorder>;

// 2. The Real Implementation (Postgres)

/// PostgresAuditRecorder
///
/// Writes audit and doc-access rows into the same database the repository
/// uses, on its own connection pool handle.
#[derive(Clone)]
pub struct PostgresAuditRecorder {
    pool: PgPool,
}

impl PostgresAuditRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRecorder for PostgresAuditRecorder {
    async fn record(&self, user_id: Uuid, action: &str, resource: &str) {
        let result = sqlx::query(
            "INSERT INTO audit_logs (user_id, action, resource) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(action)
        .bind(resource)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!("audit write failed ({} {}): {:?}", action, resource, e);
        }
    }

    async fn record_doc_access(&self, document_id: Uuid, user_id: Option<Uuid>, action: &str) {
        let result = sqlx::query(
            "INSERT INTO doc_access_logs (document_id, user_id, action) VALUES ($1, $2, $3)",
        )
        .bind(document_id)
        .bind(user_id)
        .bind(action)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!("doc access log write failed ({}): {:?}", action, e);
        }
    }
}

// 3. The Mock Implementation (For Unit Tests)

/// MockAuditRecorder
///
/// In-memory recorder used by handler tests to assert which audit events a
/// request produced, without a database.
#[derive(Default)]
pub struct MockAuditRecorder {
    /// (user_id, action, resource) triples, in call order.
    pub recorded: Mutex<Vec<(Uuid, String, String)>>,
    /// (document_id, user_id, action) triples, in call order.
    pub doc_access: Mutex<Vec<(Uuid, Option<Uuid>, String)>>,
}

impl MockAuditRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRecorder for MockAuditRecorder {
    async fn record(&self, user_id: Uuid, action: &str, resource: &str) {
        self.recorded
            .lock()
            .expect("recorder mutex poisoned")
            .push((user_id, action.to_string(), resource.to_string()));
    }

    async fn record_doc_access(&self, document_id: Uuid, user_id: Option<Uuid>, action: &str) {
        self.doc_access
            .lock()
            .expect("recorder mutex poisoned")
            .push((document_id, user_id, action.to_string()));
    }
}
