use crate::{
    AppState,
    auth::{AuthUser, MaybeUser, authorize, create_token},
    error::{ApiError, ApiResult},
    models::{
        Asset, AssetDetail, AuditLogEntry, BackupLog, BackupRoutine, CRED_MASK,
        CreateAssetRequest, CreateBackupLogRequest, CreateCategoryRequest, CreateDocumentRequest,
        CreateRoutineRequest, DashboardStats, DocCategory, Document, DocumentDetail,
        LoginRequest, LoginResponse, OkResponse, RevealResponse, Role, UpdateAssetRequest,
        UpdateCategoryRequest, UpdateDocumentRequest, User,
    },
    password,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// DocumentFilter
///
/// Accepted query parameters for GET /docs. The literal "all" (used by the
/// frontend dropdowns) disables the corresponding filter, as does omission.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct DocumentFilter {
    /// Category id filter.
    pub category: Option<String>,
    /// Document type filter (e.g. "Credencial").
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    /// Case-insensitive substring matched against title, description or tags.
    pub search: Option<String>,
}

fn active(filter: Option<String>) -> Option<String> {
    filter.filter(|v| !v.is_empty() && v != "all")
}

// --- Auth Handlers ---

/// login
///
/// [Public Route] Verifies email + password against the stored hash and
/// issues a signed session token. Invalid email and invalid password are
/// indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 403, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let record = state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .map_err(ApiError::db("Erro ao autenticar"))?
        .ok_or_else(|| ApiError::forbidden("Credenciais inválidas"))?;

    let valid = password::verify_secret(&payload.password, &record.password)
        .map_err(|e| {
            tracing::error!("password verification error: {}", e);
            ApiError::internal("Erro ao autenticar")
        })?;

    if !valid {
        return Err(ApiError::forbidden("Credenciais inválidas"));
    }

    let token = create_token(record.id, &state.config.jwt_secret).map_err(|e| {
        tracing::error!("token signing error: {:?}", e);
        ApiError::internal("Erro ao autenticar")
    })?;

    Ok(Json(LoginResponse {
        token,
        user: record.sanitized(),
    }))
}

/// get_me
///
/// [Authenticated Route] Profile of the resolved session user.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Profile", body = User))
)]
pub async fn get_me(auth: AuthUser, State(state): State<AppState>) -> ApiResult<Json<User>> {
    let user = state
        .repo
        .get_user(auth.id)
        .await
        .map_err(ApiError::db("Erro ao buscar usuário"))?
        .ok_or_else(|| ApiError::forbidden("Não autorizado"))?;
    Ok(Json(user))
}

// --- Asset Handlers ---

/// list_assets
///
/// [Public Route] All inventoried assets, most recently updated first.
#[utoipa::path(
    get,
    path = "/assets",
    responses((status = 200, description = "Assets", body = [Asset]))
)]
pub async fn list_assets(State(state): State<AppState>) -> ApiResult<Json<Vec<Asset>>> {
    let assets = state
        .repo
        .list_assets()
        .await
        .map_err(ApiError::db("Erro ao buscar ativos"))?;
    Ok(Json(assets))
}

/// create_asset
///
/// [Authenticated Route] Registers a new asset under its client-assigned tag.
///
/// *Authorization*: ADMIN or TI. One creation event produces three rows: the
/// asset plus its "Criação" history entry (transactional) and a CREATE_ASSET
/// audit entry (post-commit, best-effort).
#[utoipa::path(
    post,
    path = "/assets",
    request_body = CreateAssetRequest,
    responses(
        (status = 200, description = "Created", body = Asset),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn create_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAssetRequest>,
) -> ApiResult<Json<Asset>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let asset = state
        .repo
        .create_asset(payload)
        .await
        .map_err(ApiError::db("Erro ao criar ativo"))?;

    state.audit.record(auth.id, "CREATE_ASSET", &asset.id).await;

    Ok(Json(asset))
}

/// get_asset_detail
///
/// [Public Route] Single asset plus its recent history trail.
#[utoipa::path(
    get,
    path = "/assets/{id}",
    params(("id" = String, Path, description = "Asset tag")),
    responses(
        (status = 200, description = "Found", body = AssetDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_asset_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AssetDetail>> {
    let asset = state
        .repo
        .get_asset(&id)
        .await
        .map_err(ApiError::db("Erro ao buscar ativo"))?
        .ok_or_else(|| ApiError::not_found("Não encontrado"))?;

    let history = state
        .repo
        .get_asset_history(&id, 20)
        .await
        .map_err(ApiError::db("Erro ao buscar ativo"))?;

    Ok(Json(AssetDetail { asset, history }))
}

/// update_asset
///
/// [Authenticated Route] Partial update of an asset; the tag itself is
/// immutable. ADMIN or TI. Appends an "Atualização" history row in the same
/// transaction and an UPDATE_ASSET audit entry after commit.
#[utoipa::path(
    put,
    path = "/assets/{id}",
    params(("id" = String, Path, description = "Asset tag")),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Updated", body = Asset),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAssetRequest>,
) -> ApiResult<Json<Asset>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let asset = state
        .repo
        .update_asset(&id, payload)
        .await
        .map_err(ApiError::db("Erro ao atualizar ativo"))?
        .ok_or_else(|| ApiError::not_found("Não encontrado"))?;

    state.audit.record(auth.id, "UPDATE_ASSET", &asset.id).await;

    Ok(Json(asset))
}

// --- Document Handlers ---

/// list_documents
///
/// [Public Route] Filtered document listing. Every row is masked: a stored
/// credential surfaces as the fixed sentinel, never the hash.
#[utoipa::path(
    get,
    path = "/docs",
    params(DocumentFilter),
    responses((status = 200, description = "Documents", body = [Document]))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> ApiResult<Json<Vec<Document>>> {
    let category = match active(filter.category) {
        // A present but unparseable category id can match nothing.
        Some(raw) => match Uuid::parse_str(&raw) {
            Ok(id) => Some(id),
            Err(_) => return Ok(Json(vec![])),
        },
        None => None,
    };

    let docs = state
        .repo
        .list_documents(category, active(filter.doc_type), filter.search)
        .await
        .map_err(ApiError::db("Erro ao buscar documentos"))?;

    Ok(Json(docs.into_iter().map(Document::masked).collect()))
}

/// create_document
///
/// [Authenticated Route] Creates a document. ADMIN or TI. When the type is
/// "Credencial" and a secret was supplied, only its salted one-way hash is
/// stored; the response is already masked. Records a CREATE access row.
#[utoipa::path(
    post,
    path = "/docs",
    request_body = CreateDocumentRequest,
    responses(
        (status = 200, description = "Created", body = Document),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn create_document(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateDocumentRequest>,
) -> ApiResult<Json<Document>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let cred_pass_hash = match payload.cred_pass.as_deref() {
        Some(secret) if !secret.is_empty() && payload.doc_type == "Credencial" => {
            Some(password::hash_secret(secret).map_err(|e| {
                tracing::error!("credential hashing error: {}", e);
                ApiError::internal("Erro ao criar documento")
            })?)
        }
        _ => None,
    };

    let doc = state
        .repo
        .create_document(payload, cred_pass_hash, auth.id)
        .await
        .map_err(ApiError::db("Erro ao criar documento"))?;

    state
        .audit
        .record_doc_access(doc.id, Some(auth.id), "CREATE")
        .await;

    Ok(Json(doc.masked()))
}

/// get_document
///
/// [Public Route] Document detail with its ten most recent access rows.
/// Every read is itself recorded as a VIEW — anonymous ones included, with
/// no user attached. The credential field is masked.
#[utoipa::path(
    get,
    path = "/docs/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Found", body = DocumentDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_document(
    MaybeUser(identity): MaybeUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DocumentDetail>> {
    let doc = state
        .repo
        .get_document(id)
        .await
        .map_err(ApiError::db("Erro"))?
        .ok_or_else(|| ApiError::not_found("Não encontrado"))?;

    let access_logs = state
        .repo
        .recent_doc_access(id, 10)
        .await
        .map_err(ApiError::db("Erro"))?;

    state
        .audit
        .record_doc_access(doc.id, identity.map(|u| u.id), "VIEW")
        .await;

    Ok(Json(DocumentDetail {
        document: doc.masked(),
        access_logs,
    }))
}

/// update_document
///
/// [Authenticated Route] Partial update. ADMIN or TI. The stored secret only
/// changes when the client sends a new non-empty value different from the
/// mask sentinel for a "Credencial" document; echoing the mask back keeps
/// the stored hash. Records an EDIT access row.
#[utoipa::path(
    put,
    path = "/docs/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Updated", body = Document),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_document(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> ApiResult<Json<Document>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let cred_pass_hash = match payload.cred_pass.as_deref() {
        Some(secret)
            if !secret.is_empty()
                && secret != CRED_MASK
                && payload.doc_type.as_deref() == Some("Credencial") =>
        {
            Some(password::hash_secret(secret).map_err(|e| {
                tracing::error!("credential hashing error: {}", e);
                ApiError::internal("Erro ao atualizar")
            })?)
        }
        _ => None,
    };

    let doc = state
        .repo
        .update_document(id, payload, cred_pass_hash)
        .await
        .map_err(ApiError::db("Erro ao atualizar"))?
        .ok_or_else(|| ApiError::not_found("Não encontrado"))?;

    state
        .audit
        .record_doc_access(doc.id, Some(auth.id), "EDIT")
        .await;

    Ok(Json(doc.masked()))
}

/// delete_document
///
/// [Authenticated Route] Removes a document and (by cascade) its access
/// trail. ADMIN only.
#[utoipa::path(
    delete,
    path = "/docs/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Deleted", body = OkResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_document(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    if !authorize(Some(&auth), &[Role::Admin]) {
        return Err(ApiError::forbidden("Apenas Admin pode excluir"));
    }

    let deleted = state
        .repo
        .delete_document(id)
        .await
        .map_err(ApiError::db("Erro ao excluir"))?;

    if !deleted {
        return Err(ApiError::not_found("Não encontrado"));
    }

    Ok(Json(OkResponse { ok: true }))
}

/// reveal_credential
///
/// [Authenticated Route] Credential access acknowledgment. ADMIN or TI, and
/// the target must be of type "Credencial". The stored secret is a one-way
/// hash, so no plaintext exists to return: the endpoint records a
/// VIEW_CREDENTIAL access row and answers with the username only
/// (`credPass` is always null).
#[utoipa::path(
    post,
    path = "/docs/{id}/reveal",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Access logged", body = RevealResponse),
        (status = 400, description = "Not a credential"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn reveal_credential(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RevealResponse>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Sem permissão para ver credencial"));
    }

    let doc = state
        .repo
        .get_document(id)
        .await
        .map_err(ApiError::db("Erro"))?;

    let doc = match doc {
        Some(d) if d.doc_type == "Credencial" => d,
        _ => return Err(ApiError::bad_request("Documento não é uma credencial")),
    };

    state
        .audit
        .record_doc_access(doc.id, Some(auth.id), "VIEW_CREDENTIAL")
        .await;

    Ok(Json(RevealResponse {
        cred_user: doc.cred_user,
        cred_pass: None,
    }))
}

// --- Category Handlers ---

/// list_categories
///
/// [Public Route] Document categories, alphabetical.
#[utoipa::path(
    get,
    path = "/docs/categories",
    responses((status = 200, description = "Categories", body = [DocCategory]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DocCategory>>> {
    let categories = state
        .repo
        .list_categories()
        .await
        .map_err(ApiError::db("Erro ao buscar categorias"))?;
    Ok(Json(categories))
}

/// create_category
///
/// [Authenticated Route] ADMIN or TI. Icon falls back to "folder".
#[utoipa::path(
    post,
    path = "/docs/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Created", body = DocCategory),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<Json<DocCategory>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let icon = payload.icon.unwrap_or_else(|| "folder".to_string());
    let category = state
        .repo
        .create_category(payload.name, icon)
        .await
        .map_err(ApiError::db("Erro ao criar categoria"))?;

    Ok(Json(category))
}

/// update_category
///
/// [Authenticated Route] ADMIN or TI.
#[utoipa::path(
    put,
    path = "/docs/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = DocCategory),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<DocCategory>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let category = state
        .repo
        .update_category(id, payload)
        .await
        .map_err(ApiError::db("Erro ao atualizar categoria"))?
        .ok_or_else(|| ApiError::not_found("Não encontrado"))?;

    Ok(Json(category))
}

/// delete_category
///
/// [Authenticated Route] ADMIN only.
#[utoipa::path(
    delete,
    path = "/docs/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = OkResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    if !authorize(Some(&auth), &[Role::Admin]) {
        return Err(ApiError::forbidden("Apenas Admin pode excluir"));
    }

    let deleted = state
        .repo
        .delete_category(id)
        .await
        .map_err(ApiError::db("Erro ao excluir categoria"))?;

    if !deleted {
        return Err(ApiError::not_found("Não encontrado"));
    }

    Ok(Json(OkResponse { ok: true }))
}

// --- Backup Handlers ---

/// list_routines
///
/// [Public Route] Tracked backup routines, most recently updated first.
#[utoipa::path(
    get,
    path = "/backups",
    responses((status = 200, description = "Routines", body = [BackupRoutine]))
)]
pub async fn list_routines(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BackupRoutine>>> {
    let routines = state
        .repo
        .list_routines()
        .await
        .map_err(ApiError::db("Erro ao buscar rotinas"))?;
    Ok(Json(routines))
}

/// create_routine
///
/// [Authenticated Route] ADMIN or TI. New routines start "Pendente".
#[utoipa::path(
    post,
    path = "/backups",
    request_body = CreateRoutineRequest,
    responses(
        (status = 200, description = "Created", body = BackupRoutine),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn create_routine(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateRoutineRequest>,
) -> ApiResult<Json<BackupRoutine>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let routine = state
        .repo
        .create_routine(payload)
        .await
        .map_err(ApiError::db("Erro ao criar rotina"))?;

    Ok(Json(routine))
}

/// list_backup_logs
///
/// [Public Route] Up to fifty most recent execution logs of a routine.
#[utoipa::path(
    get,
    path = "/backups/{id}/logs",
    params(("id" = Uuid, Path, description = "Routine ID")),
    responses((status = 200, description = "Logs", body = [BackupLog]))
)]
pub async fn list_backup_logs(
    State(state): State<AppState>,
    Path(routine_id): Path<Uuid>,
) -> ApiResult<Json<Vec<BackupLog>>> {
    let logs = state
        .repo
        .list_backup_logs(routine_id, 50)
        .await
        .map_err(ApiError::db("Erro ao buscar logs"))?;
    Ok(Json(logs))
}

/// create_backup_log
///
/// [Authenticated Route] Records a routine execution. ADMIN or TI. The log
/// row and the parent routine's status/lastRun refresh are one transaction:
/// a reader never sees the log without the routine reflecting it.
#[utoipa::path(
    post,
    path = "/backups/{id}/logs",
    params(("id" = Uuid, Path, description = "Routine ID")),
    request_body = CreateBackupLogRequest,
    responses(
        (status = 200, description = "Recorded", body = BackupLog),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn create_backup_log(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(routine_id): Path<Uuid>,
    Json(payload): Json<CreateBackupLogRequest>,
) -> ApiResult<Json<BackupLog>> {
    if !authorize(Some(&auth), &[Role::Admin, Role::Ti]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let log = state
        .repo
        .append_backup_log(routine_id, payload)
        .await
        .map_err(ApiError::db("Erro ao registrar execução"))?
        .ok_or_else(|| ApiError::not_found("Rotina não encontrada"))?;

    Ok(Json(log))
}

// --- Admin Handlers ---

/// get_audit_logs
///
/// [Admin Route] The hundred most recent audit rows, newest first, with the
/// acting user's name and email joined in.
#[utoipa::path(
    get,
    path = "/admin/logs",
    responses(
        (status = 200, description = "Audit trail", body = [AuditLogEntry]),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_audit_logs(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AuditLogEntry>>> {
    if !authorize(Some(&auth), &[Role::Admin]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let entries = state
        .repo
        .list_audit_entries(100)
        .await
        .map_err(ApiError::db("Erro ao buscar auditoria"))?;

    Ok(Json(entries))
}

/// get_dashboard_stats
///
/// [Admin Route] Aggregated counters for the dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_dashboard_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<DashboardStats>> {
    if !authorize(Some(&auth), &[Role::Admin]) {
        return Err(ApiError::forbidden("Não autorizado"));
    }

    let stats = state
        .repo
        .dashboard_stats()
        .await
        .map_err(ApiError::db("Erro ao calcular estatísticas"))?;

    Ok(Json(stats))
}
