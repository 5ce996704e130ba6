//! Subscriptions and the feed of followed authors.

use actix_web::{HttpResponse, web};

use yatube_shared::dto::PageQuery;

use super::{profile_url, redirect};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /follow/
pub async fn follow_index(
    identity: Identity,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .blog
        .follow_index(identity.user_id, query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET|POST /profile/{username}/follow/
pub async fn profile_follow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (author, outcome) = state.blog.follow(identity.user_id, &path).await?;
    tracing::debug!(author = %author.username, outcome = ?outcome, "Follow requested");
    Ok(redirect(profile_url(&author.username)))
}

/// GET|POST /profile/{username}/unfollow/
pub async fn profile_unfollow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (author, _) = state.blog.unfollow(identity.user_id, &path).await?;
    Ok(redirect(profile_url(&author.username)))
}
