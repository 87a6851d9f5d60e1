use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::SystemTime;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::Role,
    repository::RepositoryState,
};

/// Session lifetime baked into issued tokens: 30 days.
const TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Claims
///
/// Payload of the session JWT. Only the subject travels in the token; the
/// role is re-read from the database on every request so a role change or a
/// deleted account takes effect immediately.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID.
    pub sub: Uuid,
    /// Expiration time (exp): seconds since epoch after which the token is dead.
    pub exp: usize,
    /// Issued at (iat).
    pub iat: usize,
}

/// Signs a session token for the given user.
pub fn create_token(user_id: Uuid, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs();

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + TOKEN_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// AuthUser
///
/// The resolved identity of an authenticated request: who is calling and
/// with which role. Produced by the extractor below; handlers receive it as
/// a plain argument.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// authorize
///
/// The authorization gate: pure function mapping (identity, required roles)
/// to a yes/no decision. A missing identity never satisfies any requirement;
/// an empty requirement list admits any authenticated identity.
pub fn authorize(identity: Option<&AuthUser>, required: &[Role]) -> bool {
    match identity {
        None => false,
        Some(user) => required.is_empty() || required.contains(&user.role),
    }
}

/// AuthUser Extractor Implementation
///
/// Resolution order:
/// 1. Local bypass: in `Env::Local` only, a `x-user-id` header naming an
///    existing user authenticates directly (development convenience).
/// 2. Bearer token extraction and JWT validation (signature + expiry).
/// 3. Database lookup, so tokens for since-deleted users are rejected and
///    the current role is always fresh.
///
/// Rejection: a 403 permission-denied response. Both "no session" and
/// "insufficient role" surface identically to the client.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let denied = || ApiError::forbidden("Não autorizado");

        if config.env == Env::Local {
            if let Some(header_value) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = header_value.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        // The bypass still requires a matching user row so the
                        // resolved role is real.
                        if let Ok(Some(user)) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                role: Role::parse(&user.role),
                            });
                        }
                    }
                }
            }
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(denied)?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(denied)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).map_err(|_| denied())?;

        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .map_err(|e| {
                tracing::error!("identity lookup failed: {:?}", e);
                denied()
            })?
            .ok_or_else(denied)?;

        Ok(AuthUser {
            id: user.id,
            role: Role::parse(&user.role),
        })
    }
}

/// MaybeUser
///
/// Optional-identity extractor for endpoints readable without a session.
/// Never rejects: any resolution failure becomes `None`, which callers must
/// treat as "unauthenticated".
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
