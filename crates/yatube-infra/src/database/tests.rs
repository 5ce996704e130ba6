use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use yatube_core::domain::{Post, User};
use yatube_core::error::RepoError;
use yatube_core::ports::{BaseRepository, FollowRepository, PostFilter, PostRepository, UserRepository};

use super::entity::{post, user};
use super::postgres_base::write_error;
use super::postgres_repo::{PostgresFollowRepository, PostgresPostRepository, PostgresUserRepository};

fn post_model(author_id: Uuid, text: &str) -> post::Model {
    post::Model {
        id: Uuid::new_v4(),
        text: text.to_owned(),
        pub_date: Utc::now().into(),
        author_id,
        group_id: None,
        image: None,
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

#[tokio::test]
async fn find_post_by_id_maps_model() {
    let author_id = Uuid::new_v4();
    let model = post_model(author_id, "Тестовый пост");
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[model]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let found: Option<Post> = repo.find_by_id(post_id).await.unwrap();
    let post = found.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
    assert_eq!(post.text, "Тестовый пост");
    assert_eq!(post.group_id, None);
}

#[tokio::test]
async fn find_user_by_username() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[user::Model {
            id: Uuid::new_v4(),
            username: "leo".to_owned(),
            password_hash: "hash".to_owned(),
            is_staff: true,
            created_at: now.into(),
        }]])
        .into_connection();
    let repo = PostgresUserRepository::new(db);

    let user: User = repo.find_by_username("leo").await.unwrap().unwrap();
    assert_eq!(user.username, "leo");
    assert!(user.is_staff);
}

#[tokio::test]
async fn find_many_with_no_ids_skips_the_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = PostgresUserRepository::new(db);

    assert!(repo.find_many(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_returns_rows_in_query_order() {
    let author_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[
            post_model(author_id, "newer"),
            post_model(author_id, "older"),
        ]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let posts = repo.list(PostFilter::Author(author_id), 0, 10).await.unwrap();
    let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, ["newer", "older"]);
}

#[tokio::test]
async fn count_reads_num_items() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row(13)]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    assert_eq!(repo.count(PostFilter::All).await.unwrap(), 13);
}

#[tokio::test]
async fn delete_pair_reports_whether_a_row_went_away() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();
    let repo = PostgresFollowRepository::new(db);
    let (user_id, author_id) = (Uuid::new_v4(), Uuid::new_v4());

    assert!(repo.delete_pair(user_id, author_id).await.unwrap());
    assert!(!repo.delete_pair(user_id, author_id).await.unwrap());
}

#[tokio::test]
async fn delete_of_missing_row_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[test]
fn constraint_violations_are_classified() {
    let err = DbErr::Custom(
        "duplicate key value violates unique constraint \"follows_user_author_key\"".to_owned(),
    );
    assert!(matches!(write_error(err), RepoError::Constraint(_)));

    let err = DbErr::Custom(
        "insert or update on table \"posts\" violates foreign key constraint \"fk_posts_author\""
            .to_owned(),
    );
    assert!(matches!(write_error(err), RepoError::ForeignKey(_)));

    let err = DbErr::Custom("syntax error at or near".to_owned());
    assert!(matches!(write_error(err), RepoError::Query(_)));

    assert!(matches!(write_error(DbErr::RecordNotUpdated), RepoError::NotFound));
}
