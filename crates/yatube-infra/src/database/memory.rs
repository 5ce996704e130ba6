//! In-memory repositories - used when no database is configured, and in tests.
//!
//! All five repositories share one [`InMemoryStore`] so that foreign keys,
//! unique constraints and cascades behave like the PostgreSQL schema.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use yatube_core::domain::{Comment, Follow, Group, Post, User};
use yatube_core::error::RepoError;
use yatube_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostFilter,
    PostRepository, UserRepository,
};
use yatube_core::service::Repositories;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
}

impl Tables {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn group_exists(&self, id: Uuid) -> bool {
        self.groups.iter().any(|g| g.id == id)
    }

    fn post_exists(&self, id: Uuid) -> bool {
        self.posts.iter().any(|p| p.id == id)
    }

    fn check_post(&self, post: &Post) -> Result<(), RepoError> {
        if !self.user_exists(post.author_id) {
            return Err(foreign_key("posts.author_id"));
        }
        if let Some(group_id) = post.group_id {
            if !self.group_exists(group_id) {
                return Err(foreign_key("posts.group_id"));
            }
        }
        Ok(())
    }

    fn check_comment(&self, comment: &Comment) -> Result<(), RepoError> {
        if !self.post_exists(comment.post_id) {
            return Err(foreign_key("comments.post_id"));
        }
        if !self.user_exists(comment.author_id) {
            return Err(foreign_key("comments.author_id"));
        }
        Ok(())
    }

    fn check_follow(&self, follow: &Follow, ignore: Option<Uuid>) -> Result<(), RepoError> {
        if follow.user_id == follow.author_id {
            return Err(RepoError::Constraint(
                "check constraint follows_no_self_follow".to_string(),
            ));
        }
        if !self.user_exists(follow.user_id) || !self.user_exists(follow.author_id) {
            return Err(foreign_key("follows"));
        }
        let duplicate = self.follows.iter().any(|f| {
            Some(f.id) != ignore && f.user_id == follow.user_id && f.author_id == follow.author_id
        });
        if duplicate {
            return Err(unique("follows (user_id, author_id)"));
        }
        Ok(())
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn remove_post(&mut self, id: Uuid) {
        self.posts.retain(|p| p.id != id);
        self.comments.retain(|c| c.post_id != id);
    }
}

fn unique(what: &str) -> RepoError {
    RepoError::Constraint(format!("duplicate key value violates unique constraint on {what}"))
}

fn foreign_key(what: &str) -> RepoError {
    RepoError::ForeignKey(format!("foreign key violation on {what}"))
}

/// Replace the row with the same id as `row`, or fail with `NotFound`.
fn replace<T: Clone>(rows: &mut [T], row: &T, id_of: impl Fn(&T) -> Uuid) -> Result<T, RepoError> {
    let id = id_of(row);
    let slot = rows
        .iter_mut()
        .find(|r| id_of(r) == id)
        .ok_or(RepoError::NotFound)?;
    *slot = row.clone();
    Ok(row.clone())
}

/// Shared backing store for the in-memory repositories.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// One repository of each kind, all over this store.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: Arc::new(InMemoryUserRepository::new(self.clone())),
            groups: Arc::new(InMemoryGroupRepository::new(self.clone())),
            posts: Arc::new(InMemoryPostRepository::new(self.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(self.clone())),
            follows: Arc::new(InMemoryFollowRepository::new(self.clone())),
        }
    }
}

macro_rules! in_memory_repository {
    ($name:ident) => {
        pub struct $name {
            store: Arc<InMemoryStore>,
        }

        impl $name {
            pub fn new(store: Arc<InMemoryStore>) -> Self {
                Self { store }
            }
        }
    };
}

in_memory_repository!(InMemoryUserRepository);
in_memory_repository!(InMemoryGroupRepository);
in_memory_repository!(InMemoryPostRepository);
in_memory_repository!(InMemoryCommentRepository);
in_memory_repository!(InMemoryFollowRepository);

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(unique("users.username"));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(unique("users.username"));
        }
        replace(&mut tables.users, &user, |u| u.id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.user_exists(id) {
            return Err(RepoError::NotFound);
        }
        tables.users.retain(|u| u.id != id);

        let owned: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|c| c.author_id != id);
        tables
            .follows
            .retain(|f| f.user_id != id && f.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn insert(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(unique("groups.slug"));
        }
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn update(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .groups
            .iter()
            .any(|g| g.id != group.id && g.slug == group.slug)
        {
            return Err(unique("groups.slug"));
        }
        replace(&mut tables.groups, &group, |g| g.id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.group_exists(id) {
            return Err(RepoError::NotFound);
        }
        tables.groups.retain(|g| g.id != id);
        for post in tables.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.check_post(&post)?;
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.check_post(&post)?;
        replace(&mut tables.posts, &post, |p| p.id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.post_exists(id) {
            return Err(RepoError::NotFound);
        }
        tables.remove_post(id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        // Stable sort: equal timestamps keep newest insert first. The SQL
        // listing breaks such ties by id, which is arbitrary but stable.
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .rev()
            .filter(|p| tables.matches(p, filter))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, filter))
            .count() as u64)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.check_comment(&comment)?;
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.check_comment(&comment)?;
        replace(&mut tables.comments, &comment, |c| c.id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created));
        Ok(comments)
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.comments.iter().filter(|c| c.post_id == post_id).count() as u64)
    }
}

#[async_trait]
impl BaseRepository<Follow, Uuid> for InMemoryFollowRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Follow>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.follows.iter().find(|f| f.id == id).cloned())
    }

    async fn insert(&self, follow: Follow) -> Result<Follow, RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.check_follow(&follow, None)?;
        tables.follows.push(follow.clone());
        Ok(follow)
    }

    async fn update(&self, follow: Follow) -> Result<Follow, RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.check_follow(&follow, Some(follow.id))?;
        replace(&mut tables.follows, &follow, |f| f.id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        let before = tables.follows.len();
        tables.follows.retain(|f| f.id != id);
        if tables.follows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl FollowRepository for InMemoryFollowRepository {
    async fn find_pair(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Follow>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .find(|f| f.user_id == user_id && f.author_id == author_id)
            .cloned())
    }

    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.store.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }
}
