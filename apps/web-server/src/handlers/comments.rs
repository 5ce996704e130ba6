//! Comment submission.

use actix_web::{HttpResponse, web};

use yatube_core::forms::CommentInput;
use yatube_core::service::CommentOutcome;

use super::{parse_post_id, post_url, redirect};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /posts/{post_id}/comment/
///
/// Always lands back on the post; invalid comments are dropped.
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<CommentInput>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let outcome = state
        .blog
        .add_comment(identity.user_id, post_id, form.into_inner())
        .await?;

    if let CommentOutcome::Rejected(form) = outcome {
        tracing::debug!(post_id = %post_id, errors = ?form.errors, "Comment rejected");
    }
    Ok(redirect(post_url(post_id)))
}
