use crate::{
    errors::AppError,
    models::{Claims, UserRole},
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

/// Which branches an authenticated user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorScope {
    Unrestricted,
    Branch(Uuid),
}

impl ActorScope {
    /// Accountants work inside a single branch; everyone else sees all of them.
    pub fn for_role(role: UserRole, branch_id: Option<Uuid>) -> Result<Self, AppError> {
        match role {
            UserRole::Admin | UserRole::Manager => Ok(ActorScope::Unrestricted),
            UserRole::Accountant => branch_id
                .map(ActorScope::Branch)
                .ok_or(AppError::InvalidToken),
        }
    }
}

/// Authenticated user extractor.
/// Add `auth: AuthUser` as a parameter in any handler that requires authentication.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
    pub scope: ActorScope,
}

impl AuthUser {
    pub fn can_access_branch(&self, branch_id: Uuid) -> bool {
        match self.scope {
            ActorScope::Unrestricted => true,
            ActorScope::Branch(own) => own == branch_id,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers: &HeaderMap = &parts.headers;

        let auth_header = headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization format".to_string()))?;

        let secret = state.config.jwt_secret.as_bytes();
        let token_data =
            decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
                .map_err(|_| AppError::InvalidToken)?;

        let claims = token_data.claims;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        Ok(AuthUser {
            id: user_id,
            role: claims.role,
            scope: ActorScope::for_role(claims.role, claims.branch_id)?,
        })
    }
}

pub fn generate_token(
    user_id: Uuid,
    role: UserRole,
    branch_id: Option<Uuid>,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, AppError> {
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    let now = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + chrono::Duration::hours(expiry_hours)).timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        branch_id,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}
