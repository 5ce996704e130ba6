//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod comments;
mod follow;
mod health;
mod posts;

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .service(
            web::resource("/profile/{username}/follow/")
                .route(web::get().to(follow::profile_follow))
                .route(web::post().to(follow::profile_follow)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .route(web::get().to(follow::profile_unfollow))
                .route(web::post().to(follow::profile_unfollow)),
        )
        .route("/follow/", web::get().to(follow::follow_index))
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create_post)),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit_post)),
        )
        .route(
            "/posts/{post_id}/comment/",
            web::post().to(comments::add_comment),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_page))
                        .route(web::post().to(auth::login)),
                )
                .route("/signup/", web::post().to(auth::signup))
                .route("/logout/", web::post().to(auth::logout)),
        )
        .route("/admin/groups/", web::post().to(admin::create_group))
        .route("/health/", web::get().to(health::health_check));
}

fn redirect(location: impl Into<String>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.into()))
        .finish()
}

fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

fn post_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

/// Post ids in paths that do not parse are unknown posts.
fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Post '{raw}' not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_urls_are_ascii() {
        assert_eq!(profile_url("leo"), "/profile/leo/");
        assert_eq!(profile_url("Лев"), "/profile/%D0%9B%D0%B5%D0%B2/");
    }

    #[test]
    fn malformed_post_id_is_not_found() {
        assert!(matches!(parse_post_id("42"), Err(AppError::NotFound(_))));
    }
}
