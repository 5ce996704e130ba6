//! Page contexts produced by [`super::BlogService`].
//!
//! These are what a template would receive; the web layer serializes them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Comment, Group, Post, User};
use crate::forms::{CommentForm, PostForm};
use crate::pagination::Page;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for AuthorView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            slug: group.slug.clone(),
            title: group.title.clone(),
        }
    }
}

/// A post with its author and group resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorView,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
}

impl PostView {
    pub fn new(post: Post, author: AuthorView, group: Option<GroupRef>) -> Self {
        Self {
            id: post.id,
            text: post.text,
            pub_date: post.pub_date,
            author,
            group,
            image: post.image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: AuthorView,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorView) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            created: comment.created,
            author,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexPage {
    pub posts: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub posts: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub author: AuthorView,
    pub posts_count: u64,
    /// Whether the viewer follows this author.
    pub following: bool,
    pub posts: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowPage {
    pub posts: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub author_posts_count: u64,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
}

/// Create/edit form page.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormPage {
    pub form: PostForm,
    /// Choices for the group field.
    pub groups: Vec<GroupRef>,
    pub is_edit: bool,
    pub post_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum CreateOutcome {
    Created(Post),
    Invalid(PostFormPage),
}

#[derive(Debug)]
pub enum EditOutcome {
    Saved(Post),
    /// The editor is not the author; nothing was written.
    NotAuthor(Post),
    /// Unbound form on first visit, or bound form with errors.
    Form(PostFormPage),
}

#[derive(Debug)]
pub enum CommentOutcome {
    Added(Comment),
    Rejected(CommentForm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    SelfFollow,
}
