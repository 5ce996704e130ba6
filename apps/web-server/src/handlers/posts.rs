//! Listings, post detail and the post create/edit forms.

use actix_web::{HttpResponse, http::header, web};

use yatube_core::forms::PostInput;
use yatube_core::pagination::Paginator;
use yatube_core::service::{CreateOutcome, EditOutcome};
use yatube_shared::dto::PageQuery;

use super::{parse_post_id, post_url, profile_url, redirect};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Set on index responses: `hit` when served from the page cache.
pub const PAGE_CACHE_HEADER: &str = "X-Page-Cache";

/// GET /
///
/// Malformed page values share page 1's cache entry. Pages past the end are
/// rendered but never cached.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let raw_page = query.page.as_deref();
    let requested = Paginator::parse_page(raw_page).max(1) as u64;

    if let Some(body) = state.page_cache.index(requested).await {
        return Ok(HttpResponse::Ok()
            .content_type(header::ContentType::json())
            .insert_header((PAGE_CACHE_HEADER, "hit"))
            .body(body));
    }

    let page = state.blog.index(raw_page).await?;
    let body = serde_json::to_string(&page).map_err(|e| AppError::Internal(e.to_string()))?;
    if page.posts.meta.number == requested {
        state.page_cache.store_index(requested, &body).await;
    }

    Ok(HttpResponse::Ok()
        .content_type(header::ContentType::json())
        .insert_header((PAGE_CACHE_HEADER, "miss"))
        .body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .blog
        .group_posts(&path, query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let viewer_id = viewer.0.map(|identity| identity.user_id);
    let page = state
        .blog
        .profile(&path, query.page.as_deref(), viewer_id)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let detail = state.blog.post_detail(post_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// GET /create/
pub async fn create_form(_identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let page = state.blog.new_post_form().await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /create/
pub async fn create_post(
    identity: Identity,
    state: web::Data<AppState>,
    form: web::Form<PostInput>,
) -> AppResult<HttpResponse> {
    match state
        .blog
        .create_post(identity.user_id, form.into_inner())
        .await?
    {
        CreateOutcome::Created(_) => {
            state.page_cache.invalidate_index().await;
            Ok(redirect(profile_url(&identity.username)))
        }
        CreateOutcome::Invalid(page) => Ok(HttpResponse::Ok().json(page)),
    }
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    edit_response(&state, state.blog.edit_post(identity.user_id, post_id, None).await?).await
}

/// POST /posts/{post_id}/edit/
pub async fn edit_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<PostInput>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let outcome = state
        .blog
        .edit_post(identity.user_id, post_id, Some(form.into_inner()))
        .await?;
    edit_response(&state, outcome).await
}

async fn edit_response(state: &AppState, outcome: EditOutcome) -> AppResult<HttpResponse> {
    match outcome {
        EditOutcome::Saved(post) => {
            state.page_cache.invalidate_index().await;
            Ok(redirect(post_url(post.id)))
        }
        EditOutcome::NotAuthor(post) => Ok(redirect(post_url(post.id))),
        EditOutcome::Form(page) => Ok(HttpResponse::Ok().json(page)),
    }
}
