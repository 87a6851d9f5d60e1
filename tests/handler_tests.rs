use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use fgreat_portal::{
    AppState,
    audit::MockAuditRecorder,
    auth::{AuthUser, MaybeUser},
    config::AppConfig,
    handlers::{self, DocumentFilter},
    models::{
        Asset, AssetHistory, AuditLogEntry, BackupLog, BackupRoutine, CRED_MASK,
        CreateAssetRequest, CreateBackupLogRequest, CreateDocumentRequest, CreateRoutineRequest,
        DashboardStats, DocAccessLog, DocCategory, Document, LoginRequest, Role,
        UpdateAssetRequest, UpdateCategoryRequest, UpdateDocumentRequest, User, UserRecord,
    },
    password,
    repository::Repository,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// Central control point for handler tests: canned outputs per entity, plus
// a write counter so tests can assert that denied requests touched nothing.
#[derive(Default)]
pub struct MockRepoControl {
    pub user_to_return: Option<User>,
    pub user_record_to_return: Option<UserRecord>,

    pub assets_to_return: Vec<Asset>,
    pub asset_to_return: Option<Asset>,
    pub history_to_return: Vec<AssetHistory>,

    pub documents_to_return: Vec<Document>,
    pub document_to_return: Option<Document>,
    pub access_logs_to_return: Vec<DocAccessLog>,

    pub categories_to_return: Vec<DocCategory>,
    pub category_to_return: Option<DocCategory>,

    pub routines_to_return: Vec<BackupRoutine>,
    pub routine_to_return: Option<BackupRoutine>,
    pub backup_logs_to_return: Vec<BackupLog>,
    pub backup_log_to_return: Option<BackupLog>,

    pub audit_entries_to_return: Vec<AuditLogEntry>,
    pub stats_to_return: DashboardStats,
    pub delete_result: bool,

    // Number of mutating repository calls the handlers performed.
    pub write_calls: Mutex<usize>,
    // The cred_pass_hash argument the last document write received.
    pub last_cred_hash: Mutex<Option<Option<String>>>,
}

impl MockRepoControl {
    fn count_write(&self) {
        *self.write_calls.lock().unwrap() += 1;
    }

    pub fn writes(&self) -> usize {
        *self.write_calls.lock().unwrap()
    }

    pub fn captured_cred_hash(&self) -> Option<Option<String>> {
        self.last_cred_hash.lock().unwrap().clone()
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn get_user(&self, _id: Uuid) -> sqlx::Result<Option<User>> {
        Ok(self.user_to_return.clone())
    }
    async fn find_user_by_email(&self, _email: &str) -> sqlx::Result<Option<UserRecord>> {
        Ok(self.user_record_to_return.clone())
    }

    async fn list_assets(&self) -> sqlx::Result<Vec<Asset>> {
        Ok(self.assets_to_return.clone())
    }
    async fn get_asset(&self, _id: &str) -> sqlx::Result<Option<Asset>> {
        Ok(self.asset_to_return.clone())
    }
    async fn get_asset_history(&self, _id: &str, _limit: i64) -> sqlx::Result<Vec<AssetHistory>> {
        Ok(self.history_to_return.clone())
    }
    async fn create_asset(&self, req: CreateAssetRequest) -> sqlx::Result<Asset> {
        self.count_write();
        Ok(Asset {
            id: req.id,
            name: req.name,
            asset_type: req.asset_type,
            location: req.location,
            status: req.status,
            ip: req.ip,
            ..Asset::default()
        })
    }
    async fn update_asset(
        &self,
        _id: &str,
        _req: UpdateAssetRequest,
    ) -> sqlx::Result<Option<Asset>> {
        self.count_write();
        Ok(self.asset_to_return.clone())
    }

    async fn list_documents(
        &self,
        _category: Option<Uuid>,
        _doc_type: Option<String>,
        _search: Option<String>,
    ) -> sqlx::Result<Vec<Document>> {
        Ok(self.documents_to_return.clone())
    }
    async fn get_document(&self, _id: Uuid) -> sqlx::Result<Option<Document>> {
        Ok(self.document_to_return.clone())
    }
    async fn recent_doc_access(&self, _id: Uuid, _limit: i64) -> sqlx::Result<Vec<DocAccessLog>> {
        Ok(self.access_logs_to_return.clone())
    }
    async fn create_document(
        &self,
        req: CreateDocumentRequest,
        cred_pass_hash: Option<String>,
        created_by: Uuid,
    ) -> sqlx::Result<Document> {
        self.count_write();
        *self.last_cred_hash.lock().unwrap() = Some(cred_pass_hash.clone());
        Ok(Document {
            id: Uuid::new_v4(),
            title: req.title,
            category_id: req.category_id,
            doc_type: req.doc_type,
            cred_user: req.cred_user,
            cred_pass: cred_pass_hash,
            created_by: Some(created_by),
            ..Document::default()
        })
    }
    async fn update_document(
        &self,
        _id: Uuid,
        _req: UpdateDocumentRequest,
        cred_pass_hash: Option<String>,
    ) -> sqlx::Result<Option<Document>> {
        self.count_write();
        *self.last_cred_hash.lock().unwrap() = Some(cred_pass_hash);
        Ok(self.document_to_return.clone())
    }
    async fn delete_document(&self, _id: Uuid) -> sqlx::Result<bool> {
        self.count_write();
        Ok(self.delete_result)
    }

    async fn list_categories(&self) -> sqlx::Result<Vec<DocCategory>> {
        Ok(self.categories_to_return.clone())
    }
    async fn create_category(&self, name: String, icon: String) -> sqlx::Result<DocCategory> {
        self.count_write();
        Ok(DocCategory {
            id: Uuid::new_v4(),
            name,
            icon,
        })
    }
    async fn update_category(
        &self,
        _id: Uuid,
        _req: UpdateCategoryRequest,
    ) -> sqlx::Result<Option<DocCategory>> {
        self.count_write();
        Ok(self.category_to_return.clone())
    }
    async fn delete_category(&self, _id: Uuid) -> sqlx::Result<bool> {
        self.count_write();
        Ok(self.delete_result)
    }

    async fn list_routines(&self) -> sqlx::Result<Vec<BackupRoutine>> {
        Ok(self.routines_to_return.clone())
    }
    async fn get_routine(&self, _id: Uuid) -> sqlx::Result<Option<BackupRoutine>> {
        Ok(self.routine_to_return.clone())
    }
    async fn create_routine(&self, req: CreateRoutineRequest) -> sqlx::Result<BackupRoutine> {
        self.count_write();
        Ok(BackupRoutine {
            id: Uuid::new_v4(),
            name: req.name,
            routine_type: req.routine_type,
            frequency: req.frequency,
            responsible: req.responsible,
            status: "Pendente".to_string(),
            ..BackupRoutine::default()
        })
    }
    async fn list_backup_logs(
        &self,
        _routine_id: Uuid,
        _limit: i64,
    ) -> sqlx::Result<Vec<BackupLog>> {
        Ok(self.backup_logs_to_return.clone())
    }
    async fn append_backup_log(
        &self,
        _routine_id: Uuid,
        _req: CreateBackupLogRequest,
    ) -> sqlx::Result<Option<BackupLog>> {
        self.count_write();
        Ok(self.backup_log_to_return.clone())
    }

    async fn list_audit_entries(&self, _limit: i64) -> sqlx::Result<Vec<AuditLogEntry>> {
        Ok(self.audit_entries_to_return.clone())
    }

    async fn dashboard_stats(&self) -> sqlx::Result<DashboardStats> {
        Ok(self.stats_to_return.clone())
    }
}

// --- TEST UTILITIES ---

const TEST_ADMIN_ID: Uuid = Uuid::from_u128(1);
const TEST_TI_ID: Uuid = Uuid::from_u128(2);
const TEST_VIEWER_ID: Uuid = Uuid::from_u128(3);

// Builds an AppState around shared mock handles so tests keep their own
// references for post-call assertions.
fn test_state(repo: Arc<MockRepoControl>, audit: Arc<MockAuditRecorder>) -> AppState {
    AppState {
        repo,
        audit,
        config: AppConfig::default(),
    }
}

fn mocks(repo: MockRepoControl) -> (Arc<MockRepoControl>, Arc<MockAuditRecorder>, AppState) {
    let repo = Arc::new(repo);
    let audit = Arc::new(MockAuditRecorder::new());
    let state = test_state(repo.clone(), audit.clone());
    (repo, audit, state)
}

fn admin_user() -> AuthUser {
    AuthUser {
        id: TEST_ADMIN_ID,
        role: Role::Admin,
    }
}
fn ti_user() -> AuthUser {
    AuthUser {
        id: TEST_TI_ID,
        role: Role::Ti,
    }
}
fn viewer_user() -> AuthUser {
    AuthUser {
        id: TEST_VIEWER_ID,
        role: Role::Viewer,
    }
}

fn credential_doc() -> Document {
    Document {
        id: Uuid::from_u128(42),
        title: "VPN Matriz".to_string(),
        doc_type: "Credencial".to_string(),
        cred_user: Some("vpn.admin".to_string()),
        cred_pass: Some("$argon2id$v=19$m=19456,t=2,p=1$fake$fake".to_string()),
        ..Document::default()
    }
}

fn no_filter() -> DocumentFilter {
    DocumentFilter {
        category: None,
        doc_type: None,
        search: None,
    }
}

// --- ASSET HANDLER TESTS ---

#[tokio::test]
async fn test_create_asset_forbidden_for_viewer() {
    let (repo, audit, state) = mocks(MockRepoControl::default());

    let result = handlers::create_asset(
        viewer_user(),
        State(state),
        Json(CreateAssetRequest {
            id: "SRV-001".to_string(),
            name: "Servidor Arquivos".to_string(),
            asset_type: "Servidor".to_string(),
            location: "Matriz".to_string(),
            status: "Ativo".to_string(),
            ip: None,
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
    // Denied before any repository write or audit row.
    assert_eq!(repo.writes(), 0);
    assert!(audit.recorded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_asset_records_audit_event() {
    let (repo, audit, state) = mocks(MockRepoControl::default());

    let result = handlers::create_asset(
        ti_user(),
        State(state),
        Json(CreateAssetRequest {
            id: "SW-010".to_string(),
            name: "Switch Core".to_string(),
            asset_type: "Rede".to_string(),
            location: "Datacenter".to_string(),
            status: "Ativo".to_string(),
            ip: Some("10.0.0.2".to_string()),
        }),
    )
    .await;

    let Json(asset) = result.expect("TI must be allowed to create assets");
    assert_eq!(asset.id, "SW-010");
    assert_eq!(repo.writes(), 1);

    let recorded = audit.recorded.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded[0],
        (TEST_TI_ID, "CREATE_ASSET".to_string(), "SW-010".to_string())
    );
}

#[tokio::test]
async fn test_update_asset_not_found() {
    let (_repo, audit, state) = mocks(MockRepoControl {
        asset_to_return: None,
        ..MockRepoControl::default()
    });

    let result = handlers::update_asset(
        admin_user(),
        State(state),
        Path("NOPE-1".to_string()),
        Json(UpdateAssetRequest::default()),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::NOT_FOUND);
    // No audit row for a write that never landed.
    assert!(audit.recorded.lock().unwrap().is_empty());
}

// --- DOCUMENT HANDLER TESTS ---

#[tokio::test]
async fn test_list_documents_masks_credentials() {
    let plain_doc = Document {
        id: Uuid::from_u128(7),
        title: "Manual de rede".to_string(),
        doc_type: "Procedimento".to_string(),
        ..Document::default()
    };
    let (_repo, _audit, state) = mocks(MockRepoControl {
        documents_to_return: vec![credential_doc(), plain_doc],
        ..MockRepoControl::default()
    });

    let Json(docs) = handlers::list_documents(State(state), Query(no_filter()))
        .await
        .expect("listing must succeed");

    assert_eq!(docs.len(), 2);
    // Stored hash must never appear; it is either the mask or null.
    assert_eq!(docs[0].cred_pass.as_deref(), Some(CRED_MASK));
    assert_eq!(docs[1].cred_pass, None);
}

#[tokio::test]
async fn test_get_document_records_anonymous_view() {
    let doc = credential_doc();
    let (_repo, audit, state) = mocks(MockRepoControl {
        document_to_return: Some(doc.clone()),
        ..MockRepoControl::default()
    });

    let Json(detail) = handlers::get_document(MaybeUser(None), State(state), Path(doc.id))
        .await
        .expect("document read must succeed");

    assert_eq!(detail.document.cred_pass.as_deref(), Some(CRED_MASK));

    let access = audit.doc_access.lock().unwrap();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0], (doc.id, None, "VIEW".to_string()));
}

#[tokio::test]
async fn test_get_document_attributes_view_to_session_user() {
    let doc = credential_doc();
    let (_repo, audit, state) = mocks(MockRepoControl {
        document_to_return: Some(doc.clone()),
        ..MockRepoControl::default()
    });

    handlers::get_document(MaybeUser(Some(ti_user())), State(state), Path(doc.id))
        .await
        .expect("document read must succeed");

    let access = audit.doc_access.lock().unwrap();
    assert_eq!(access[0], (doc.id, Some(TEST_TI_ID), "VIEW".to_string()));
}

#[tokio::test]
async fn test_get_document_not_found() {
    let (_repo, audit, state) = mocks(MockRepoControl::default());

    let result =
        handlers::get_document(MaybeUser(None), State(state), Path(Uuid::from_u128(99))).await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::NOT_FOUND);
    // A miss is not a view.
    assert!(audit.doc_access.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_document_hashes_credential_secret() {
    let (repo, audit, state) = mocks(MockRepoControl::default());

    let Json(doc) = handlers::create_document(
        admin_user(),
        State(state),
        Json(CreateDocumentRequest {
            title: "Firewall admin".to_string(),
            category_id: Uuid::from_u128(5),
            doc_type: "Credencial".to_string(),
            cred_user: Some("fw.admin".to_string()),
            cred_pass: Some("s3nh4-forte".to_string()),
            ..CreateDocumentRequest::default()
        }),
    )
    .await
    .expect("ADMIN must be allowed to create documents");

    // Response is masked: never the hash, never the plaintext.
    assert_eq!(doc.cred_pass.as_deref(), Some(CRED_MASK));

    // The repository received a salted hash that verifies the original
    // plaintext and is not the plaintext itself.
    let stored = repo
        .captured_cred_hash()
        .expect("create_document was called")
        .expect("a credential secret must be hashed, not dropped");
    assert_ne!(stored, "s3nh4-forte");
    assert!(password::verify_secret("s3nh4-forte", &stored).unwrap());

    let access = audit.doc_access.lock().unwrap();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].2, "CREATE");
}

#[tokio::test]
async fn test_create_document_ignores_secret_for_non_credential() {
    let (repo, _audit, state) = mocks(MockRepoControl::default());

    handlers::create_document(
        ti_user(),
        State(state),
        Json(CreateDocumentRequest {
            title: "Contrato de suporte".to_string(),
            category_id: Uuid::from_u128(5),
            doc_type: "Contrato".to_string(),
            cred_pass: Some("nao-deveria-persistir".to_string()),
            ..CreateDocumentRequest::default()
        }),
    )
    .await
    .expect("creation must succeed");

    assert_eq!(repo.captured_cred_hash(), Some(None));
}

#[tokio::test]
async fn test_update_document_mask_sentinel_keeps_stored_secret() {
    let (repo, audit, state) = mocks(MockRepoControl {
        document_to_return: Some(credential_doc()),
        ..MockRepoControl::default()
    });

    handlers::update_document(
        ti_user(),
        State(state),
        Path(Uuid::from_u128(42)),
        Json(UpdateDocumentRequest {
            doc_type: Some("Credencial".to_string()),
            cred_pass: Some(CRED_MASK.to_string()),
            ..UpdateDocumentRequest::default()
        }),
    )
    .await
    .expect("TI must be allowed to update documents");

    // The mask sentinel means "unchanged": no new hash reaches the repository.
    assert_eq!(repo.captured_cred_hash(), Some(None));

    let access = audit.doc_access.lock().unwrap();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].2, "EDIT");
}

#[tokio::test]
async fn test_update_document_rehashes_new_secret() {
    let (repo, _audit, state) = mocks(MockRepoControl {
        document_to_return: Some(credential_doc()),
        ..MockRepoControl::default()
    });

    handlers::update_document(
        admin_user(),
        State(state),
        Path(Uuid::from_u128(42)),
        Json(UpdateDocumentRequest {
            doc_type: Some("Credencial".to_string()),
            cred_pass: Some("novo-segredo".to_string()),
            ..UpdateDocumentRequest::default()
        }),
    )
    .await
    .expect("update must succeed");

    let stored = repo.captured_cred_hash().unwrap().expect("new secret must be hashed");
    assert!(password::verify_secret("novo-segredo", &stored).unwrap());
}

#[tokio::test]
async fn test_delete_document_rejected_for_ti() {
    let (repo, _audit, state) = mocks(MockRepoControl {
        delete_result: true,
        ..MockRepoControl::default()
    });

    let result =
        handlers::delete_document(ti_user(), State(state), Path(Uuid::from_u128(42))).await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
    assert_eq!(repo.writes(), 0);
}

#[tokio::test]
async fn test_delete_document_as_admin() {
    let (_repo, _audit, state) = mocks(MockRepoControl {
        delete_result: true,
        ..MockRepoControl::default()
    });

    let Json(response) =
        handlers::delete_document(admin_user(), State(state), Path(Uuid::from_u128(42)))
            .await
            .expect("ADMIN delete must succeed");

    assert!(response.ok);
}

// --- REVEAL HANDLER TESTS ---

#[tokio::test]
async fn test_reveal_rejects_non_credential() {
    let doc = Document {
        doc_type: "Contrato".to_string(),
        ..credential_doc()
    };
    let (_repo, audit, state) = mocks(MockRepoControl {
        document_to_return: Some(doc),
        ..MockRepoControl::default()
    });

    let result =
        handlers::reveal_credential(admin_user(), State(state), Path(Uuid::from_u128(42))).await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    assert!(audit.doc_access.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reveal_logs_access_and_withholds_secret() {
    let doc = credential_doc();
    let (_repo, audit, state) = mocks(MockRepoControl {
        document_to_return: Some(doc.clone()),
        ..MockRepoControl::default()
    });

    let Json(revealed) = handlers::reveal_credential(ti_user(), State(state), Path(doc.id))
        .await
        .expect("TI must be allowed to reveal");

    assert_eq!(revealed.cred_user.as_deref(), Some("vpn.admin"));
    // The stored value is a one-way hash; there is no plaintext to return.
    assert_eq!(revealed.cred_pass, None);

    let access = audit.doc_access.lock().unwrap();
    assert_eq!(access.len(), 1);
    assert_eq!(
        access[0],
        (doc.id, Some(TEST_TI_ID), "VIEW_CREDENTIAL".to_string())
    );
}

#[tokio::test]
async fn test_reveal_forbidden_for_viewer() {
    let (_repo, _audit, state) = mocks(MockRepoControl {
        document_to_return: Some(credential_doc()),
        ..MockRepoControl::default()
    });

    let result =
        handlers::reveal_credential(viewer_user(), State(state), Path(Uuid::from_u128(42))).await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

// --- BACKUP HANDLER TESTS ---

#[tokio::test]
async fn test_create_backup_log_unknown_routine() {
    let (_repo, _audit, state) = mocks(MockRepoControl {
        backup_log_to_return: None,
        ..MockRepoControl::default()
    });

    let result = handlers::create_backup_log(
        ti_user(),
        State(state),
        Path(Uuid::from_u128(77)),
        Json(CreateBackupLogRequest {
            status: "Sucesso".to_string(),
            evidence: None,
            log_output: None,
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_backup_log_forbidden_for_viewer() {
    let (repo, _audit, state) = mocks(MockRepoControl::default());

    let result = handlers::create_backup_log(
        viewer_user(),
        State(state),
        Path(Uuid::from_u128(77)),
        Json(CreateBackupLogRequest {
            status: "Sucesso".to_string(),
            evidence: None,
            log_output: None,
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
    assert_eq!(repo.writes(), 0);
}

#[tokio::test]
async fn test_create_backup_log_success() {
    let routine_id = Uuid::from_u128(77);
    let (_repo, _audit, state) = mocks(MockRepoControl {
        backup_log_to_return: Some(BackupLog {
            id: 1,
            routine_id,
            status: "Sucesso".to_string(),
            ..BackupLog::default()
        }),
        ..MockRepoControl::default()
    });

    let Json(log) = handlers::create_backup_log(
        admin_user(),
        State(state),
        Path(routine_id),
        Json(CreateBackupLogRequest {
            status: "Sucesso".to_string(),
            evidence: Some("s3://evidencias/2026-08.tar".to_string()),
            log_output: None,
        }),
    )
    .await
    .expect("backup log post must succeed");

    assert_eq!(log.routine_id, routine_id);
    assert_eq!(log.status, "Sucesso");
}

// --- ADMIN HANDLER TESTS ---

#[tokio::test]
async fn test_audit_logs_forbidden_for_ti() {
    let (_repo, _audit, state) = mocks(MockRepoControl::default());

    let result = handlers::get_audit_logs(ti_user(), State(state)).await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_audit_logs_for_admin() {
    let (_repo, _audit, state) = mocks(MockRepoControl {
        audit_entries_to_return: vec![AuditLogEntry {
            id: 1,
            user_id: TEST_ADMIN_ID,
            action: "CREATE_ASSET".to_string(),
            resource: "SRV-001".to_string(),
            user_name: Some("Alice".to_string()),
            user_email: Some("alice@fgreat.com".to_string()),
            ..AuditLogEntry::default()
        }],
        ..MockRepoControl::default()
    });

    let Json(entries) = handlers::get_audit_logs(admin_user(), State(state))
        .await
        .expect("ADMIN must read the audit trail");

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_email.as_deref(), Some("alice@fgreat.com"));
}

#[tokio::test]
async fn test_dashboard_stats_admin_only() {
    let (_repo, _audit, state) = mocks(MockRepoControl::default());
    let result = handlers::get_dashboard_stats(viewer_user(), State(state)).await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

// --- LOGIN HANDLER TESTS ---

fn ti_record(hash: String) -> UserRecord {
    UserRecord {
        id: TEST_TI_ID,
        email: "ti@fgreat.com".to_string(),
        name: "Time TI".to_string(),
        role: "TI".to_string(),
        password: hash,
    }
}

#[tokio::test]
async fn test_login_wrong_password_denied() {
    let hash = password::hash_secret("senha-correta").unwrap();
    let (_repo, _audit, state) = mocks(MockRepoControl {
        user_record_to_return: Some(ti_record(hash)),
        ..MockRepoControl::default()
    });

    let result = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "ti@fgreat.com".to_string(),
            password: "senha-errada".to_string(),
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_unknown_email_denied() {
    let (_repo, _audit, state) = mocks(MockRepoControl::default());

    let result = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "quem@fgreat.com".to_string(),
            password: "tanto-faz".to_string(),
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_issues_token_and_sanitizes_user() {
    let hash = password::hash_secret("senha-correta").unwrap();
    let (_repo, _audit, state) = mocks(MockRepoControl {
        user_record_to_return: Some(ti_record(hash)),
        ..MockRepoControl::default()
    });

    let Json(response) = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "ti@fgreat.com".to_string(),
            password: "senha-correta".to_string(),
        }),
    )
    .await
    .expect("valid credentials must log in");

    assert!(!response.token.is_empty());
    assert_eq!(response.user.role, "TI");
    // The serialized user shape has no password field at all.
    let json = serde_json::to_value(&response.user).unwrap();
    assert!(json.get("password").is_none());
}
