//! Authentication handlers: signup, login and logout.

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::{Either, HttpResponse, web};

use yatube_core::domain::User;
use yatube_infra::Argon2PasswordService;
use yatube_shared::dto::{AuthResponse, LoginPage, LoginRequest, NextQuery, SignupRequest};

use super::redirect;
use crate::middleware::auth::{SESSION_COOKIE, local_path};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// JSON or urlencoded body.
type Body<T> = Either<web::Json<T>, web::Form<T>>;

fn into_inner<T>(body: Body<T>) -> T {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

fn session_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .finish()
}

fn issue_token(state: &AppState, user: &User) -> AppResult<(String, i64)> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((token, state.tokens.expiration_seconds()))
}

/// GET /auth/login/
pub async fn login_page(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginPage::new(local_path(query.next.as_deref())))
}

/// POST /auth/signup/
pub async fn signup(state: web::Data<AppState>, body: Body<SignupRequest>) -> AppResult<HttpResponse> {
    let req = into_inner(body);
    let username = req.username.trim().to_string();

    User::validate_username(&username).map_err(AppError::BadRequest)?;
    Argon2PasswordService::check_strength(&req.password).map_err(AppError::BadRequest)?;

    if state.users().find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = state
        .passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let user = state
        .users()
        .insert(User::new(username, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

    let (token, expires_in) = issue_token(&state, &user)?;
    Ok(HttpResponse::Created()
        .cookie(session_cookie(&token, expires_in))
        .json(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: expires_in.max(0) as u64,
            next: "/".to_string(),
        }))
}

/// POST /auth/login/
///
/// Redirects to a local `next` (body or query) when one is given.
pub async fn login(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
    body: Body<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = into_inner(body);

    let user = state
        .users()
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        tracing::debug!(username = %user.username, "Login rejected");
        return Err(AppError::Unauthorized);
    }

    let (token, expires_in) = issue_token(&state, &user)?;
    let cookie = session_cookie(&token, expires_in);
    tracing::info!(user_id = %user.id, "User logged in");

    let next = local_path(req.next.as_deref()).or_else(|| local_path(query.next.as_deref()));
    if let Some(next) = next {
        let mut response = redirect(next);
        response
            .add_cookie(&cookie)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        return Ok(response);
    }

    Ok(HttpResponse::Ok().cookie(cookie).json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: expires_in.max(0) as u64,
        next: "/".to_string(),
    }))
}

/// POST /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    let mut response = redirect("/");
    if let Err(e) = response.add_cookie(&cookie) {
        tracing::warn!(error = %e, "Failed to clear session cookie");
    }
    response
}
