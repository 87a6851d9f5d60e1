use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Fixed placeholder returned in place of a stored credential secret.
/// Clients only ever see this sentinel (or `null`); the stored hash never
/// leaves the server. Sending the sentinel back on update means "unchanged".
pub const CRED_MASK: &str = "••••••••";

// --- Roles ---

/// Role
///
/// Closed set of access levels carried on a resolved identity.
/// Stored as TEXT in `users.role`; parsing happens once at session resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Ti,
    Viewer,
}

impl Role {
    /// Parses a stored role string. Unknown values degrade to `Viewer`,
    /// the least-privileged role.
    pub fn parse(value: &str) -> Role {
        match value {
            "ADMIN" => Role::Admin,
            "TI" => Role::Ti,
            _ => Role::Viewer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Ti => "TI",
            Role::Viewer => "VIEWER",
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Public shape of a user account. The stored password hash lives only on
/// `UserRecord` and is never serialized to a client.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    // TEXT role column: ADMIN, TI or VIEWER.
    pub role: String,
}

/// UserRecord
///
/// Internal row used by the login flow. Carries the Argon2id password hash,
/// so this struct is deliberately not serializable.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: String,
}

impl UserRecord {
    /// Strips the credential material, leaving the client-safe shape.
    pub fn sanitized(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            role: self.role,
        }
    }
}

/// Asset
///
/// An inventoried piece of infrastructure (server, switch, notebook, ...).
/// The id is the client-assigned asset tag, immutable after creation.
/// `status` is one of "Ativo", "Manutenção" or "Desativado".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Asset {
    pub id: String,
    pub name: String,

    /// Maps SQL column "type" to Rust field "asset_type"; `type` is a
    /// reserved keyword in Rust. Serialized back as "type".
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub asset_type: String,

    pub location: String,
    pub status: String,
    pub ip: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AssetHistory
///
/// Append-only trail of actions taken on an asset. The creation handler
/// writes the initial "Criação" row in the same transaction as the asset.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssetHistory {
    pub id: i64,
    pub asset_id: String,
    pub action: String,
    pub details: Option<String>,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}

/// Document
///
/// A knowledge-base entry: runbook, contract, license or stored credential
/// (type = "Credencial"). `cred_pass` holds a one-way salted hash on disk;
/// every read path masks it via `masked()` before the row leaves the server.
/// Category name/icon are joined in by the repository for list/detail reads.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub category_id: Uuid,

    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub doc_type: String,

    pub description: Option<String>,
    pub tags: Option<String>,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub cred_user: Option<String>,
    pub cred_pass: Option<String>,
    pub responsible: Option<String>,
    pub created_by: Option<Uuid>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,

    // Loaded via a LEFT JOIN on doc_categories in the repository queries.
    #[sqlx(default)]
    pub category_name: Option<String>,
    #[sqlx(default)]
    pub category_icon: Option<String>,
}

impl Document {
    /// Replaces a stored credential hash with the fixed mask sentinel.
    /// A document without a secret keeps `cred_pass = null`.
    pub fn masked(mut self) -> Self {
        if self.cred_pass.is_some() {
            self.cred_pass = Some(CRED_MASK.to_string());
        }
        self
    }
}

/// DocCategory
///
/// Grouping for documents. `icon` is a frontend icon name, defaulting to "folder".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocCategory {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
}

/// DocAccessLog
///
/// Append-only record of every touch on a document, including anonymous
/// passive views (`user_id` is nullable for those).
/// Action is one of VIEW, EDIT, CREATE, VIEW_CREDENTIAL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocAccessLog {
    pub id: i64,
    pub document_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}

/// BackupRoutine
///
/// A recurring backup job being tracked. `status` mirrors the status of the
/// most recent BackupLog ("Sucesso", "Erro" or "Pendente"); `last_run` is
/// refreshed in the same transaction that appends a log entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BackupRoutine {
    pub id: Uuid,
    pub name: String,

    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub routine_type: String,

    pub frequency: String,
    pub responsible: Option<String>,
    pub status: String,
    #[ts(type = "string | null")]
    pub last_run: Option<DateTime<Utc>>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// BackupLog
///
/// Append-only execution record for a routine.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BackupLog {
    pub id: i64,
    pub routine_id: Uuid,
    pub status: String,
    pub evidence: Option<String>,
    pub log_output: Option<String>,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}

/// AuditLogEntry
///
/// Audit row enriched with the acting user's name and email (joined from
/// `users`), as rendered on the admin review screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditLogEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub action: String,
    pub resource: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Credentials for POST /auth/login. Email matching is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Bearer token plus the sanitized user it authenticates.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// CreateAssetRequest
///
/// Input payload for POST /assets. The asset tag (`id`) is supplied by the
/// client and becomes the immutable primary key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateAssetRequest {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub location: String,
    pub status: String,
    pub ip: Option<String>,
}

/// UpdateAssetRequest
///
/// Partial update payload for PUT /assets/{id}. Only `Some` fields are
/// applied; the asset tag itself cannot change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAssetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// CreateDocumentRequest
///
/// Input payload for POST /docs. `cred_user`/`cred_pass` are only honored
/// when `type` is "Credencial"; the secret is hashed before storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub category_id: Uuid,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub cred_user: Option<String>,
    pub cred_pass: Option<String>,
    pub responsible: Option<String>,
}

/// UpdateDocumentRequest
///
/// Partial update payload for PUT /docs/{id}. A `cred_pass` equal to the
/// mask sentinel means "keep the stored secret".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateDocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_pass: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
}

/// CreateCategoryRequest
///
/// Input payload for POST /docs/categories. Icon falls back to "folder".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub icon: Option<String>,
}

/// UpdateCategoryRequest
///
/// Partial update payload for PUT /docs/categories/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// CreateRoutineRequest
///
/// Input payload for POST /backups. New routines start as "Pendente" with
/// no `last_run` until the first execution is posted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateRoutineRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub routine_type: String,
    pub frequency: String,
    pub responsible: Option<String>,
}

/// CreateBackupLogRequest
///
/// Input payload for POST /backups/{id}/logs. The posted status becomes the
/// parent routine's status in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateBackupLogRequest {
    pub status: String,
    pub evidence: Option<String>,
    pub log_output: Option<String>,
}

// --- Output Schemas ---

/// DocumentDetail
///
/// Document plus its most recent access trail, returned by GET /docs/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub access_logs: Vec<DocAccessLog>,
}

/// AssetDetail
///
/// Asset plus its recent history trail, returned by GET /assets/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: Asset,
    pub history: Vec<AssetHistory>,
}

/// RevealResponse
///
/// Output of POST /docs/{id}/reveal. The stored secret is a one-way hash,
/// so `cred_pass` is always null: reveal acknowledges and logs credential
/// access, it does not recover plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RevealResponse {
    pub cred_user: Option<String>,
    pub cred_pass: Option<String>,
}

/// OkResponse
///
/// Bare `{ok: true}` acknowledgment used by the delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct OkResponse {
    pub ok: bool,
}

/// DashboardStats
///
/// Counters for the administrative dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_assets: i64,
    pub assets_in_maintenance: i64,
    pub assets_inactive: i64,
    pub total_documents: i64,
    pub total_routines: i64,
    pub routines_ok: i64,
    pub routines_failing: i64,
}
