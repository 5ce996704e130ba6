//! End-to-end HTTP behaviour over in-memory storage.

use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::Value;
use uuid::Uuid;

use web_server::middleware::auth::SESSION_COOKIE;
use web_server::observability::RequestIdMiddleware;
use web_server::{AppState, configure_routes};
use yatube_core::domain::{Group, Post, User};
use yatube_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, PostFilter, PostRepository, TokenService,
};
use yatube_infra::JwtConfig;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn state() -> AppState {
    AppState::in_memory(
        Duration::from_secs(20),
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "yatube-test".to_string(),
        },
    )
}

async fn user(state: &AppState, username: &str) -> User {
    state
        .users()
        .insert(User::new(username.to_string(), "unused".to_string()))
        .await
        .unwrap()
}

async fn group(state: &AppState, slug: &str) -> Group {
    state
        .blog
        .repositories()
        .groups
        .insert(Group::new(
            "Тестовая группа".to_string(),
            slug.to_string(),
            "Тестовое описание".to_string(),
        ))
        .await
        .unwrap()
}

async fn post(state: &AppState, author: &User, text: &str, group: Option<&Group>) -> Post {
    state
        .blog
        .repositories()
        .posts
        .insert(Post::new(
            author.id,
            text.to_string(),
            group.map(|g| g.id),
            None,
        ))
        .await
        .unwrap()
}

fn bearer(state: &AppState, user: &User) -> (header::HeaderName, String) {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())
        .unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn post_count(state: &AppState) -> u64 {
    state
        .blog
        .repositories()
        .posts
        .count(PostFilter::All)
        .await
        .unwrap()
}

#[actix_web::test]
async fn anonymous_authoring_redirects_to_login() {
    let state = state();
    let author = user(&state, "author").await;
    let post = post(&state, &author, "text", None).await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/create/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");

    let edit = format!("/posts/{}/edit/", post.id);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&edit).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={edit}"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/follow/").to_request()).await;
    assert_eq!(location(&resp), "/auth/login/?next=/follow/");
}

#[actix_web::test]
async fn token_for_a_missing_account_reads_as_anonymous() {
    let state = state();
    let gone = user(&state, "gone").await;
    let stale = bearer(&state, &gone);
    state.users().delete(gone.id).await.unwrap();
    let app = app!(state);

    let ghost = state
        .tokens
        .generate_token(Uuid::new_v4(), "ghost", vec!["user".to_string()])
        .unwrap();
    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {ghost}")))
        .set_form([("text", "hello")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(stale)
        .set_form([("text", "hello")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
    assert_eq!(post_count(&state).await, 0);
}

#[actix_web::test]
async fn create_post_adds_one_and_redirects_to_profile() {
    let state = state();
    let author = user(&state, "author").await;
    let group = group(&state, "test-slug").await;
    let app = app!(state);
    let group_id = group.id.to_string();

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&state, &author))
        .set_form([("text", "Тестовый текст"), ("group", group_id.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/author/");
    assert_eq!(post_count(&state).await, 1);

    let posts = state
        .blog
        .repositories()
        .posts
        .list(PostFilter::All, 0, 10)
        .await
        .unwrap();
    assert_eq!(posts[0].author_id, author.id);
    assert_eq!(posts[0].group_id, Some(group.id));
}

#[actix_web::test]
async fn invalid_post_rerenders_form_with_errors() {
    let state = state();
    let author = user(&state, "author").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&state, &author))
        .set_form([("text", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["form"]["errors"]["text"][0], "This field is required.");
    assert_eq!(body["is_edit"], false);
    assert_eq!(post_count(&state).await, 0);
}

#[actix_web::test]
async fn only_the_author_can_edit() {
    let state = state();
    let author = user(&state, "author").await;
    let other = user(&state, "other").await;
    let post = post(&state, &author, "original", None).await;
    let app = app!(state);
    let edit = format!("/posts/{}/edit/", post.id);

    let req = test::TestRequest::post()
        .uri(&edit)
        .insert_header(bearer(&state, &other))
        .set_form([("text", "hijacked")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let repos = state.blog.repositories();
    let stored = repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "original");

    let req = test::TestRequest::get()
        .uri(&edit)
        .insert_header(bearer(&state, &author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["is_edit"], true);
    assert_eq!(body["form"]["text"], "original");

    let req = test::TestRequest::post()
        .uri(&edit)
        .insert_header(bearer(&state, &author))
        .set_form([("text", "edited")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let stored = repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "edited");
    assert_eq!(post_count(&state).await, 1);
}

#[actix_web::test]
async fn comments_need_login_and_always_redirect_to_the_post() {
    let state = state();
    let author = user(&state, "author").await;
    let post = post(&state, &author, "text", None).await;
    let app = app!(state);
    let uri = format!("/posts/{}/comment/", post.id);
    let comments = state.blog.repositories().comments.clone();

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form([("text", "anonymous")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
    assert_eq!(comments.count_for_post(post.id).await.unwrap(), 0);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&state, &author))
        .set_form([("text", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(comments.count_for_post(post.id).await.unwrap(), 0);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&state, &author))
        .set_form([("text", "Тестовый комментарий")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(comments.count_for_post(post.id).await.unwrap(), 1);

    let detail = format!("/posts/{}/", post.id);
    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&detail).to_request())
            .await;
    assert_eq!(body["comments"][0]["text"], "Тестовый комментарий");
    assert_eq!(body["author_posts_count"], 1);
}

#[actix_web::test]
async fn group_page_and_unknown_group() {
    let state = state();
    let author = user(&state, "author").await;
    let group = group(&state, "test_slug").await;
    post(&state, &author, "group post", Some(&group)).await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/group/test_slug/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["group"]["slug"], "test_slug");
    assert_eq!(body["posts"]["items"][0]["text"], "group post");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/group/unknown_slug/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
}

#[actix_web::test]
async fn malformed_post_id_is_not_found() {
    let state = state();
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/posts/42/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let missing = format!("/posts/{}/", Uuid::new_v4());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&missing).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn listings_paginate_by_ten() {
    let state = state();
    let author = user(&state, "author").await;
    let group = group(&state, "test-slug").await;
    for i in 0..13 {
        post(&state, &author, &format!("post {i}"), Some(&group)).await;
    }
    let app = app!(state);

    for base in ["/", "/group/test-slug/", "/profile/author/"] {
        let first: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(base).to_request())
                .await;
        assert_eq!(first["posts"]["items"].as_array().unwrap().len(), 10, "{base}");
        assert_eq!(first["posts"]["num_pages"], 2);

        let uri = format!("{base}?page=2");
        let second: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request())
                .await;
        assert_eq!(second["posts"]["items"].as_array().unwrap().len(), 3, "{base}");
    }
}

#[actix_web::test]
async fn index_is_cached_until_a_post_is_written() {
    let state = state();
    let author = user(&state, "author").await;
    post(&state, &author, "first", None).await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.headers().get("x-page-cache").unwrap(), "miss");
    let cached = test::read_body(resp).await;

    // Written behind the handlers' back: the cached page stays.
    post(&state, &author, "second", None).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.headers().get("x-page-cache").unwrap(), "hit");
    assert_eq!(test::read_body(resp).await, cached);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&state, &author))
        .set_form([("text", "third")])
        .to_request();
    test::call_service(&app, req).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.headers().get("x-page-cache").unwrap(), "miss");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["posts"]["count"], 3);
    assert_eq!(body["posts"]["items"][0]["text"], "third");
}

#[actix_web::test]
async fn index_cache_entries_are_bounded_by_existing_pages() {
    let state = state();
    let author = user(&state, "author").await;
    for i in 0..13 {
        post(&state, &author, &format!("post {i}"), None).await;
    }
    let app = app!(state);

    for i in 0..200 {
        let uri = format!("/?page=x{i}");
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    for page in ["2", "3", "-1", "99999999999999999999"] {
        let uri = format!("/?page={page}");
        test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    }

    let cache = state.memory_cache.as_ref().unwrap();
    assert_eq!(cache.len().await, 2);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=7").to_request()).await;
    assert_eq!(resp.headers().get("x-page-cache").unwrap(), "miss");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["posts"]["number"], 2);
}

#[actix_web::test]
async fn follow_unfollow_and_feed() {
    let state = state();
    let reader = user(&state, "reader").await;
    let author = user(&state, "author").await;
    post(&state, &author, "followed post", None).await;
    let app = app!(state);
    let follows = state.blog.repositories().follows.clone();

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/profile/author/follow/")
            .insert_header(bearer(&state, &reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/profile/author/");
    }
    assert!(follows.is_following(reader.id, author.id).await.unwrap());

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header(bearer(&state, &reader))
        .to_request();
    let feed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(feed["posts"]["count"], 1);

    let req = test::TestRequest::get()
        .uri("/profile/author/")
        .insert_header(bearer(&state, &reader))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["following"], true);

    let req = test::TestRequest::get()
        .uri("/profile/author/follow/")
        .insert_header(bearer(&state, &author))
        .to_request();
    test::call_service(&app, req).await;
    assert!(!follows.is_following(author.id, author.id).await.unwrap());

    let req = test::TestRequest::post()
        .uri("/profile/author/unfollow/")
        .insert_header(bearer(&state, &reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/profile/author/");
    assert!(!follows.is_following(reader.id, author.id).await.unwrap());

    let req = test::TestRequest::post()
        .uri("/profile/nobody/follow/")
        .insert_header(bearer(&state, &reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn signup_then_login_through_the_session_cookie() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([("username", "newbie"), ("password", "s3cret-pass")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.response().cookies().any(|c| c.name() == SESSION_COOKIE));

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_json(serde_json::json!({"username": "newbie", "password": "another-pass"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([("username", "short"), ("password", "1234")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/auth/login/?next=/create/")
        .set_form([("username", "newbie"), ("password", "wrong-pass")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login/?next=/create/")
        .set_form([("username", "newbie"), ("password", "s3cret-pass")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/create/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn login_ignores_offsite_next() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([("username", "newbie"), ("password", "s3cret-pass")])
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/auth/login/?next=https://evil.example/")
        .set_form([("username", "newbie"), ("password", "s3cret-pass")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/auth/login/?next=/follow/")
            .to_request(),
    )
    .await;
    assert_eq!(page["next"], "/follow/");
}

#[actix_web::test]
async fn group_administration_is_staff_only() {
    let state = state();
    let member = user(&state, "member").await;
    let admin = state
        .users()
        .insert(User::new("admin".to_string(), "unused".to_string()).staff())
        .await
        .unwrap();
    let app = app!(state);
    let body = serde_json::json!({"title": "Cats", "slug": "cats"});

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(bearer(&state, &member))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(bearer(&state, &admin))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/admin/groups/")
        .insert_header(bearer(&state, &admin))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/group/cats/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn health_reports_memory_storage_and_request_id() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/health/")
        .insert_header(("X-Request-ID", "req-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-123");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}
