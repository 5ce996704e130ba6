//! Authentication extractors.
//!
//! Identity comes from `Authorization: Bearer <jwt>` or the session cookie.
//! The token subject must still exist; a token for a deleted account reads
//! as anonymous. Handlers that take [`Identity`] send anonymous visitors to
//! the login page.

use std::future::Future;
use std::pin::Pin;

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header, web};

use yatube_core::domain::User;
use yatube_core::ports::AuthError;
use yatube_shared::ErrorResponse;

use crate::state::AppState;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "yatube_session";

pub const LOGIN_PATH: &str = "/auth/login/";

/// Login page URL that returns to `next` afterwards. Slashes stay readable.
pub fn login_url(next: &str) -> String {
    format!(
        "{LOGIN_PATH}?next={}",
        urlencoding::encode(next).replace("%2F", "/")
    )
}

/// `next` if it is a path on this site, otherwise `None`.
pub fn local_path(next: Option<&str>) -> Option<String> {
    let next = next?;
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then(|| next.to_string())
}

/// Authenticated user identity extractor.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            roles: user.roles(),
            user_id: user.id,
            username: user.username,
        }
    }
}

/// Authentication failure on a protected route.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct AuthenticationError {
    pub error: AuthError,
    /// Path and query of the request that was refused.
    pub next: String,
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.error {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::MissingAuth
            | AuthError::UnknownUser => actix_web::http::StatusCode::FOUND,
            AuthError::InsufficientPermissions => actix_web::http::StatusCode::FORBIDDEN,
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match &self.error {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::MissingAuth
            | AuthError::UnknownUser => {
                HttpResponse::Found()
                    .insert_header((header::LOCATION, login_url(&self.next)))
                    .finish()
            }
            AuthError::InsufficientPermissions => {
                HttpResponse::Forbidden().json(ErrorResponse::forbidden())
            }
            _ => HttpResponse::InternalServerError().json(ErrorResponse::internal_error()),
        }
    }
}

/// Raw token from the Authorization header, else from the session cookie.
fn request_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
        return value
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()));
    }

    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::MissingAuth)
}

/// Validate the request token and load the account it names.
async fn authenticate(req: HttpRequest) -> Result<Identity, AuthError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AuthError::Misconfigured("AppState missing".to_string())
    })?;

    let token = request_token(&req)?;
    let claims = state.tokens.validate_token(&token)?;

    let user = state
        .users()
        .find_by_id(claims.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load session user");
            AuthError::Lookup(e.to_string())
        })?
        .ok_or_else(|| {
            tracing::debug!(user_id = %claims.user_id, "Token names a missing user");
            AuthError::UnknownUser
        })?;

    Ok(Identity::from(user))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            authenticate(req.clone()).await.map_err(|error| {
                tracing::debug!(path = %req.path(), error = %error, "Anonymous access to protected page");
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                AuthenticationError { error, next }
            })
        })
    }
}

/// Optional identity extractor - never fails; bad tokens read as anonymous.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(OptionalIdentity(authenticate(req).await.ok())) })
    }
}
