use crate::models::{
    Asset, AssetHistory, AuditLogEntry, BackupLog, BackupRoutine, CreateAssetRequest,
    CreateBackupLogRequest, CreateDocumentRequest, CreateRoutineRequest, DashboardStats,
    DocAccessLog, DocCategory, Document, UpdateAssetRequest, UpdateCategoryRequest,
    UpdateDocumentRequest, User, UserRecord,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for all persistence operations, one method per
/// (entity, verb). Handlers depend on this trait only, so tests can swap in
/// an in-memory mock and the Postgres implementation stays behind the seam.
///
/// Conventions: `get_*` on a missing id yields `Ok(None)`; `delete_*` and
/// row-count updates yield `Ok(false)` when nothing matched; infrastructure
/// failures propagate as `sqlx::Error` for the handler boundary to convert.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / identity ---
    async fn get_user(&self, id: Uuid) -> sqlx::Result<Option<User>>;
    // Login lookup; includes the stored password hash. Case-insensitive email.
    async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<UserRecord>>;

    // --- Assets ---
    async fn list_assets(&self) -> sqlx::Result<Vec<Asset>>;
    async fn get_asset(&self, id: &str) -> sqlx::Result<Option<Asset>>;
    async fn get_asset_history(&self, id: &str, limit: i64) -> sqlx::Result<Vec<AssetHistory>>;
    /// Inserts the asset and its initial "Criação" history row in one
    /// transaction: either both land or neither does.
    async fn create_asset(&self, req: CreateAssetRequest) -> sqlx::Result<Asset>;
    /// Applies a partial update plus an "Atualização" history row in one
    /// transaction. `Ok(None)` when the asset does not exist.
    async fn update_asset(
        &self,
        id: &str,
        req: UpdateAssetRequest,
    ) -> sqlx::Result<Option<Asset>>;

    // --- Documents ---
    /// Filtered listing: exact category/type match, case-insensitive
    /// substring OR across title/description/tags, all AND-combined.
    async fn list_documents(
        &self,
        category: Option<Uuid>,
        doc_type: Option<String>,
        search: Option<String>,
    ) -> sqlx::Result<Vec<Document>>;
    async fn get_document(&self, id: Uuid) -> sqlx::Result<Option<Document>>;
    async fn recent_doc_access(&self, id: Uuid, limit: i64) -> sqlx::Result<Vec<DocAccessLog>>;
    // `cred_pass_hash` is the already-hashed secret or None; raw secrets
    // never reach this layer.
    async fn create_document(
        &self,
        req: CreateDocumentRequest,
        cred_pass_hash: Option<String>,
        created_by: Uuid,
    ) -> sqlx::Result<Document>;
    async fn update_document(
        &self,
        id: Uuid,
        req: UpdateDocumentRequest,
        cred_pass_hash: Option<String>,
    ) -> sqlx::Result<Option<Document>>;
    async fn delete_document(&self, id: Uuid) -> sqlx::Result<bool>;

    // --- Document categories ---
    async fn list_categories(&self) -> sqlx::Result<Vec<DocCategory>>;
    async fn create_category(&self, name: String, icon: String) -> sqlx::Result<DocCategory>;
    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> sqlx::Result<Option<DocCategory>>;
    async fn delete_category(&self, id: Uuid) -> sqlx::Result<bool>;

    // --- Backup routines & logs ---
    async fn list_routines(&self) -> sqlx::Result<Vec<BackupRoutine>>;
    async fn get_routine(&self, id: Uuid) -> sqlx::Result<Option<BackupRoutine>>;
    async fn create_routine(&self, req: CreateRoutineRequest) -> sqlx::Result<BackupRoutine>;
    async fn list_backup_logs(&self, routine_id: Uuid, limit: i64)
    -> sqlx::Result<Vec<BackupLog>>;
    /// Appends an execution log and refreshes the parent routine's
    /// status/last_run in one transaction. `Ok(None)` when the routine is
    /// missing.
    async fn append_backup_log(
        &self,
        routine_id: Uuid,
        req: CreateBackupLogRequest,
    ) -> sqlx::Result<Option<BackupLog>>;

    // --- Audit (read side; writes go through the AuditRecorder) ---
    async fn list_audit_entries(&self, limit: i64) -> sqlx::Result<Vec<AuditLogEntry>>;

    // --- Dashboard ---
    async fn dashboard_stats(&self) -> sqlx::Result<DashboardStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by Postgres.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const DOC_COLUMNS: &str = "d.id, d.title, d.category_id, d.type, d.description, d.tags, \
     d.content, d.file_url, d.file_type, d.cred_user, d.cred_pass, d.responsible, \
     d.created_by, d.created_at, d.updated_at, c.name AS category_name, c.icon AS category_icon";

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, email, name, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<UserRecord>> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, role, password FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_assets(&self) -> sqlx::Result<Vec<Asset>> {
        sqlx::query_as::<_, Asset>(
            "SELECT id, name, type, location, status, ip, created_at, updated_at \
             FROM assets ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_asset(&self, id: &str) -> sqlx::Result<Option<Asset>> {
        sqlx::query_as::<_, Asset>(
            "SELECT id, name, type, location, status, ip, created_at, updated_at \
             FROM assets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_asset_history(&self, id: &str, limit: i64) -> sqlx::Result<Vec<AssetHistory>> {
        sqlx::query_as::<_, AssetHistory>(
            "SELECT id, asset_id, action, details, timestamp FROM asset_history \
             WHERE asset_id = $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// create_asset
    ///
    /// Asset row + initial history row are one unit: the transaction rolls
    /// both back if either insert fails (duplicate tag included).
    async fn create_asset(&self, req: CreateAssetRequest) -> sqlx::Result<Asset> {
        let mut tx = self.pool.begin().await?;

        let asset = sqlx::query_as::<_, Asset>(
            "INSERT INTO assets (id, name, type, location, status, ip, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             RETURNING id, name, type, location, status, ip, created_at, updated_at",
        )
        .bind(&req.id)
        .bind(&req.name)
        .bind(&req.asset_type)
        .bind(&req.location)
        .bind(&req.status)
        .bind(&req.ip)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO asset_history (asset_id, action, details) VALUES ($1, $2, $3)",
        )
        .bind(&asset.id)
        .bind("Criação")
        .bind("Ativo cadastrado no sistema")
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(asset)
    }

    /// update_asset
    ///
    /// COALESCE-based partial update (only `Some` fields change) plus an
    /// "Atualização" history row, both in one transaction.
    async fn update_asset(
        &self,
        id: &str,
        req: UpdateAssetRequest,
    ) -> sqlx::Result<Option<Asset>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Asset>(
            "UPDATE assets \
             SET name = COALESCE($2, name), \
                 type = COALESCE($3, type), \
                 location = COALESCE($4, location), \
                 status = COALESCE($5, status), \
                 ip = COALESCE($6, ip), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, type, location, status, ip, created_at, updated_at",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.asset_type)
        .bind(&req.location)
        .bind(&req.status)
        .bind(&req.ip)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(asset) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO asset_history (asset_id, action, details) VALUES ($1, $2, $3)",
        )
        .bind(&asset.id)
        .bind("Atualização")
        .bind("Dados do ativo atualizados")
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(asset))
    }

    /// list_documents
    ///
    /// Flexible filtering via QueryBuilder with bound parameters. The
    /// free-text term is an ILIKE OR-group over title/description/tags;
    /// every other filter narrows with AND.
    async fn list_documents(
        &self,
        category: Option<Uuid>,
        doc_type: Option<String>,
        search: Option<String>,
    ) -> sqlx::Result<Vec<Document>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {DOC_COLUMNS} FROM documents d \
             LEFT JOIN doc_categories c ON d.category_id = c.id WHERE 1 = 1"
        ));

        if let Some(cat) = category {
            builder.push(" AND d.category_id = ");
            builder.push_bind(cat);
        }

        if let Some(t) = doc_type {
            builder.push(" AND d.type = ");
            builder.push_bind(t);
        }

        if let Some(s) = search {
            let pattern = format!("%{}%", s);
            builder.push(" AND (d.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR d.description ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR d.tags ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY d.updated_at DESC");

        builder
            .build_query_as::<Document>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_document(&self, id: Uuid) -> sqlx::Result<Option<Document>> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOC_COLUMNS} FROM documents d \
             LEFT JOIN doc_categories c ON d.category_id = c.id WHERE d.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn recent_doc_access(&self, id: Uuid, limit: i64) -> sqlx::Result<Vec<DocAccessLog>> {
        sqlx::query_as::<_, DocAccessLog>(
            "SELECT id, document_id, user_id, action, timestamp FROM doc_access_logs \
             WHERE document_id = $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// create_document
    ///
    /// Insert + category join in one round trip via a CTE, so the response
    /// carries the category name/icon without a second query.
    async fn create_document(
        &self,
        req: CreateDocumentRequest,
        cred_pass_hash: Option<String>,
        created_by: Uuid,
    ) -> sqlx::Result<Document> {
        sqlx::query_as::<_, Document>(
            "WITH inserted AS ( \
                INSERT INTO documents \
                    (id, title, category_id, type, description, tags, content, file_url, \
                     file_type, cred_user, cred_pass, responsible, created_by, created_at, updated_at) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW()) \
                RETURNING * \
             ) \
             SELECT i.id, i.title, i.category_id, i.type, i.description, i.tags, i.content, \
                    i.file_url, i.file_type, i.cred_user, i.cred_pass, i.responsible, \
                    i.created_by, i.created_at, i.updated_at, \
                    c.name AS category_name, c.icon AS category_icon \
             FROM inserted i LEFT JOIN doc_categories c ON i.category_id = c.id",
        )
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(req.category_id)
        .bind(&req.doc_type)
        .bind(&req.description)
        .bind(&req.tags)
        .bind(&req.content)
        .bind(&req.file_url)
        .bind(&req.file_type)
        .bind(&req.cred_user)
        .bind(&cred_pass_hash)
        .bind(&req.responsible)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
    }

    /// update_document
    ///
    /// COALESCE partial update. The secret column only changes when a fresh
    /// hash is supplied; a masked/absent `cred_pass` leaves it untouched.
    async fn update_document(
        &self,
        id: Uuid,
        req: UpdateDocumentRequest,
        cred_pass_hash: Option<String>,
    ) -> sqlx::Result<Option<Document>> {
        sqlx::query_as::<_, Document>(
            "WITH updated AS ( \
                UPDATE documents \
                SET title = COALESCE($2, title), \
                    category_id = COALESCE($3, category_id), \
                    type = COALESCE($4, type), \
                    description = COALESCE($5, description), \
                    tags = COALESCE($6, tags), \
                    content = COALESCE($7, content), \
                    file_url = COALESCE($8, file_url), \
                    file_type = COALESCE($9, file_type), \
                    cred_user = COALESCE($10, cred_user), \
                    cred_pass = COALESCE($11, cred_pass), \
                    responsible = COALESCE($12, responsible), \
                    updated_at = NOW() \
                WHERE id = $1 \
                RETURNING * \
             ) \
             SELECT u.id, u.title, u.category_id, u.type, u.description, u.tags, u.content, \
                    u.file_url, u.file_type, u.cred_user, u.cred_pass, u.responsible, \
                    u.created_by, u.created_at, u.updated_at, \
                    c.name AS category_name, c.icon AS category_icon \
             FROM updated u LEFT JOIN doc_categories c ON u.category_id = c.id",
        )
        .bind(id)
        .bind(&req.title)
        .bind(req.category_id)
        .bind(&req.doc_type)
        .bind(&req.description)
        .bind(&req.tags)
        .bind(&req.content)
        .bind(&req.file_url)
        .bind(&req.file_type)
        .bind(&req.cred_user)
        .bind(&cred_pass_hash)
        .bind(&req.responsible)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_document(&self, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> sqlx::Result<Vec<DocCategory>> {
        sqlx::query_as::<_, DocCategory>(
            "SELECT id, name, icon FROM doc_categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_category(&self, name: String, icon: String) -> sqlx::Result<DocCategory> {
        sqlx::query_as::<_, DocCategory>(
            "INSERT INTO doc_categories (id, name, icon) VALUES ($1, $2, $3) \
             RETURNING id, name, icon",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(icon)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> sqlx::Result<Option<DocCategory>> {
        sqlx::query_as::<_, DocCategory>(
            "UPDATE doc_categories \
             SET name = COALESCE($2, name), icon = COALESCE($3, icon) \
             WHERE id = $1 RETURNING id, name, icon",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.icon)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_category(&self, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM doc_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_routines(&self) -> sqlx::Result<Vec<BackupRoutine>> {
        sqlx::query_as::<_, BackupRoutine>(
            "SELECT id, name, type, frequency, responsible, status, last_run, \
                    created_at, updated_at \
             FROM backup_routines ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_routine(&self, id: Uuid) -> sqlx::Result<Option<BackupRoutine>> {
        sqlx::query_as::<_, BackupRoutine>(
            "SELECT id, name, type, frequency, responsible, status, last_run, \
                    created_at, updated_at \
             FROM backup_routines WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_routine(&self, req: CreateRoutineRequest) -> sqlx::Result<BackupRoutine> {
        sqlx::query_as::<_, BackupRoutine>(
            "INSERT INTO backup_routines \
                (id, name, type, frequency, responsible, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 'Pendente', NOW(), NOW()) \
             RETURNING id, name, type, frequency, responsible, status, last_run, \
                       created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.routine_type)
        .bind(&req.frequency)
        .bind(&req.responsible)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_backup_logs(
        &self,
        routine_id: Uuid,
        limit: i64,
    ) -> sqlx::Result<Vec<BackupLog>> {
        sqlx::query_as::<_, BackupLog>(
            "SELECT id, routine_id, status, evidence, log_output, timestamp \
             FROM backup_logs WHERE routine_id = $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(routine_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// append_backup_log
    ///
    /// The routine refresh runs first: zero rows affected means the routine
    /// does not exist, and the whole unit aborts before any log is written.
    async fn append_backup_log(
        &self,
        routine_id: Uuid,
        req: CreateBackupLogRequest,
    ) -> sqlx::Result<Option<BackupLog>> {
        let mut tx = self.pool.begin().await?;

        let refreshed = sqlx::query(
            "UPDATE backup_routines \
             SET status = $2, last_run = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(routine_id)
        .bind(&req.status)
        .execute(&mut *tx)
        .await?;

        if refreshed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let log = sqlx::query_as::<_, BackupLog>(
            "INSERT INTO backup_logs (routine_id, status, evidence, log_output) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, routine_id, status, evidence, log_output, timestamp",
        )
        .bind(routine_id)
        .bind(&req.status)
        .bind(&req.evidence)
        .bind(&req.log_output)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(log))
    }

    async fn list_audit_entries(&self, limit: i64) -> sqlx::Result<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditLogEntry>(
            "SELECT a.id, a.user_id, a.action, a.resource, a.timestamp, \
                    u.name AS user_name, u.email AS user_email \
             FROM audit_logs a LEFT JOIN users u ON a.user_id = u.id \
             ORDER BY a.timestamp DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// dashboard_stats
    ///
    /// Compiles the dashboard counters in a handful of scalar queries,
    /// mirroring the aggregations the frontend renders.
    async fn dashboard_stats(&self) -> sqlx::Result<DashboardStats> {
        let total_assets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
            .fetch_one(&self.pool)
            .await?;
        let assets_in_maintenance: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assets WHERE status = 'Manutenção'")
                .fetch_one(&self.pool)
                .await?;
        let assets_inactive: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assets WHERE status = 'Desativado'")
                .fetch_one(&self.pool)
                .await?;
        let total_documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        let total_routines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM backup_routines")
            .fetch_one(&self.pool)
            .await?;
        let routines_ok: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM backup_routines WHERE status = 'Sucesso'")
                .fetch_one(&self.pool)
                .await?;
        let routines_failing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM backup_routines WHERE status = 'Erro'")
                .fetch_one(&self.pool)
                .await?;

        Ok(DashboardStats {
            total_assets,
            assets_in_maintenance,
            assets_inactive,
            total_documents,
            total_routines,
            routines_ok,
            routines_failing,
        })
    }
}
