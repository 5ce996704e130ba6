//! Group administration.

use actix_web::{HttpResponse, web};

use yatube_shared::ApiResponse;
use yatube_shared::dto::CreateGroupRequest;

use crate::middleware::auth::Identity;
use crate::observability::RequestId;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /admin/groups/ - staff only.
pub async fn create_group(
    identity: Identity,
    request_id: RequestId,
    state: web::Data<AppState>,
    body: web::Json<CreateGroupRequest>,
) -> AppResult<HttpResponse> {
    if !identity.has_role("admin") {
        tracing::warn!(
            user_id = %identity.user_id,
            request_id = %request_id.as_str(),
            "Non-staff group creation refused"
        );
        return Err(AppError::Forbidden);
    }

    let req = body.into_inner();
    let group = state
        .blog
        .create_group(req.title, req.slug, req.description)
        .await?;
    tracing::info!(
        group = %group.slug,
        by = %identity.username,
        request_id = %request_id.as_str(),
        "Group created by admin"
    );

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(group, "Group created")))
}
