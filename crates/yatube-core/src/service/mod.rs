//! Request semantics of every blog page, independent of HTTP.

pub mod views;

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Comment, Follow, Group, Post, User};
use crate::error::{DomainError, RepoError};
use crate::forms::{CleanPost, CommentForm, CommentInput, INVALID_CHOICE, PostForm, PostInput};
use crate::pagination::{Page, Paginator};
use crate::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
    UserRepository,
};

pub use views::{
    AuthorView, CommentOutcome, CommentView, CreateOutcome, EditOutcome, FollowOutcome,
    FollowPage, GroupPage, GroupRef, IndexPage, PostDetail, PostFormPage, PostView, ProfilePage,
};

/// The repositories the blog reads and writes.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

/// Blog operations: listings, post detail, authoring, comments and follows.
#[derive(Clone)]
pub struct BlogService {
    repos: Repositories,
    paginator: Paginator,
}

impl BlogService {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            paginator: Paginator::default(),
        }
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// All posts, newest first.
    pub async fn index(&self, raw_page: Option<&str>) -> Result<IndexPage, DomainError> {
        let posts = self.list_page(PostFilter::All, raw_page).await?;
        Ok(IndexPage { posts })
    }

    pub async fn group_posts(
        &self,
        slug: &str,
        raw_page: Option<&str>,
    ) -> Result<GroupPage, DomainError> {
        let group = self
            .repos
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Group", slug))?;
        let posts = self.list_page(PostFilter::Group(group.id), raw_page).await?;
        Ok(GroupPage { group, posts })
    }

    /// An author's posts. `viewer` is the current user, if any.
    pub async fn profile(
        &self,
        username: &str,
        raw_page: Option<&str>,
        viewer: Option<Uuid>,
    ) -> Result<ProfilePage, DomainError> {
        let author = self.find_user(username).await?;
        let posts = self
            .list_page(PostFilter::Author(author.id), raw_page)
            .await?;

        let following = match viewer {
            Some(viewer_id) if viewer_id != author.id => {
                self.repos.follows.is_following(viewer_id, author.id).await?
            }
            _ => false,
        };

        Ok(ProfilePage {
            author: AuthorView::from(&author),
            posts_count: posts.meta.count,
            following,
            posts,
        })
    }

    /// Posts by the authors `user_id` follows.
    pub async fn follow_index(
        &self,
        user_id: Uuid,
        raw_page: Option<&str>,
    ) -> Result<FollowPage, DomainError> {
        let posts = self
            .list_page(PostFilter::FollowedBy(user_id), raw_page)
            .await?;
        Ok(FollowPage { posts })
    }

    pub async fn post_detail(&self, post_id: Uuid) -> Result<PostDetail, DomainError> {
        let post = self.find_post(post_id).await?;
        let author_posts_count = self
            .repos
            .posts
            .count(PostFilter::Author(post.author_id))
            .await?;

        let comments = self.repos.comments.list_for_post(post.id).await?;
        let comments = self.decorate_comments(comments).await?;

        let mut views = self.decorate_posts(vec![post]).await?;
        let post = views
            .pop()
            .ok_or_else(|| DomainError::Internal("post view missing".to_string()))?;

        Ok(PostDetail {
            post,
            author_posts_count,
            comments,
            form: CommentForm::blank(),
        })
    }

    /// Blank create form.
    pub async fn new_post_form(&self) -> Result<PostFormPage, DomainError> {
        self.form_page(PostForm::blank(), false, None).await
    }

    pub async fn create_post(
        &self,
        author_id: Uuid,
        input: PostInput,
    ) -> Result<CreateOutcome, DomainError> {
        let mut form = PostForm::bind(input);
        let Some(clean) = self.clean_post_form(&mut form).await? else {
            tracing::debug!(errors = ?form.errors, "Post form rejected");
            return Ok(CreateOutcome::Invalid(
                self.form_page(form, false, None).await?,
            ));
        };

        let post = Post::new(author_id, clean.text, clean.group_id, clean.image);
        let post = self.repos.posts.insert(post).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");

        Ok(CreateOutcome::Created(post))
    }

    /// Edit a post. `input` is `None` when the form is only being displayed.
    pub async fn edit_post(
        &self,
        editor_id: Uuid,
        post_id: Uuid,
        input: Option<PostInput>,
    ) -> Result<EditOutcome, DomainError> {
        let post = self.find_post(post_id).await?;
        if !post.is_authored_by(editor_id) {
            tracing::warn!(post_id = %post.id, editor_id = %editor_id, "Edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor(post));
        }

        let Some(input) = input else {
            let page = self
                .form_page(PostForm::from_post(&post), true, Some(post.id))
                .await?;
            return Ok(EditOutcome::Form(page));
        };

        let mut form = PostForm::bind(input);
        let Some(clean) = self.clean_post_form(&mut form).await? else {
            let page = self.form_page(form, true, Some(post.id)).await?;
            return Ok(EditOutcome::Form(page));
        };

        let image = clean.image.or_else(|| post.image.clone());
        let updated = Post {
            text: clean.text,
            group_id: clean.group_id,
            image,
            ..post
        };
        let saved = self.repos.posts.update(updated).await?;
        tracing::info!(post_id = %saved.id, "Post updated");

        Ok(EditOutcome::Saved(saved))
    }

    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        input: CommentInput,
    ) -> Result<CommentOutcome, DomainError> {
        let post = self.find_post(post_id).await?;

        let mut form = CommentForm::bind(input);
        let Some(text) = form.clean() else {
            return Ok(CommentOutcome::Rejected(form));
        };

        let comment = Comment::new(post.id, author_id, text);
        let comment = self.repos.comments.insert(comment).await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");

        Ok(CommentOutcome::Added(comment))
    }

    /// Subscribe `user_id` to `username`. Repeated or self follows are no-ops.
    pub async fn follow(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<(User, FollowOutcome), DomainError> {
        let author = self.find_user(username).await?;

        if author.id == user_id {
            return Ok((author, FollowOutcome::SelfFollow));
        }
        if self.repos.follows.is_following(user_id, author.id).await? {
            return Ok((author, FollowOutcome::AlreadyFollowing));
        }

        // A concurrent follow may win the unique (user, author) index.
        match self.repos.follows.insert(Follow::new(user_id, author.id)).await {
            Ok(_) => {
                tracing::info!(user_id = %user_id, author = %author.username, "Follow created");
                Ok((author, FollowOutcome::Followed))
            }
            Err(RepoError::Constraint(msg)) => {
                tracing::debug!(user_id = %user_id, error = %msg, "Follow already recorded");
                Ok((author, FollowOutcome::AlreadyFollowing))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove the subscription if present. Returns whether one existed.
    pub async fn unfollow(&self, user_id: Uuid, username: &str) -> Result<(User, bool), DomainError> {
        let author = self.find_user(username).await?;
        let removed = self.repos.follows.delete_pair(user_id, author.id).await?;
        if removed {
            tracing::info!(user_id = %user_id, author = %author.username, "Follow removed");
        }
        Ok((author, removed))
    }

    /// Admin-only group creation; the caller checks the role.
    pub async fn create_group(
        &self,
        title: String,
        slug: String,
        description: String,
    ) -> Result<Group, DomainError> {
        let slug = slug.trim().to_string();
        if slug.is_empty() {
            return Err(DomainError::Validation("slug must not be empty".to_string()));
        }
        if title.trim().is_empty() {
            return Err(DomainError::Validation("title must not be empty".to_string()));
        }
        if self.repos.groups.find_by_slug(&slug).await?.is_some() {
            return Err(DomainError::Duplicate(format!("group slug '{slug}' is taken")));
        }

        let group = self
            .repos
            .groups
            .insert(Group::new(title, slug, description))
            .await?;
        tracing::info!(group = %group.slug, "Group created");
        Ok(group)
    }

    async fn find_user(&self, username: &str) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }

    async fn list_page(
        &self,
        filter: PostFilter,
        raw_page: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        let count = self.repos.posts.count(filter).await?;
        let meta = self.paginator.locate(count, raw_page);
        let posts = self
            .repos
            .posts
            .list(filter, meta.offset(), meta.limit())
            .await?;

        Ok(Page {
            items: self.decorate_posts(posts).await?,
            meta,
        })
    }

    async fn clean_post_form(&self, form: &mut PostForm) -> Result<Option<CleanPost>, DomainError> {
        let Some(clean) = form.clean() else {
            return Ok(None);
        };

        if let Some(group_id) = clean.group_id {
            if self.repos.groups.find_by_id(group_id).await?.is_none() {
                form.add_error("group", INVALID_CHOICE);
                return Ok(None);
            }
        }

        Ok(Some(clean))
    }

    async fn form_page(
        &self,
        form: PostForm,
        is_edit: bool,
        post_id: Option<Uuid>,
    ) -> Result<PostFormPage, DomainError> {
        let groups = self.repos.groups.list_all().await?;
        Ok(PostFormPage {
            form,
            groups: groups.iter().map(GroupRef::from).collect(),
            is_edit,
            post_id,
        })
    }

    async fn authors_by_id(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, AuthorView>, DomainError> {
        let ids = unique(ids);
        let users = self.repos.users.find_many(&ids).await?;
        Ok(users
            .iter()
            .map(|user| (user.id, AuthorView::from(user)))
            .collect())
    }

    async fn decorate_posts(&self, posts: Vec<Post>) -> Result<Vec<PostView>, DomainError> {
        let authors = self
            .authors_by_id(posts.iter().map(|p| p.author_id).collect())
            .await?;

        let group_ids = unique(posts.iter().filter_map(|p| p.group_id).collect());
        let groups: HashMap<Uuid, GroupRef> = self
            .repos
            .groups
            .find_many(&group_ids)
            .await?
            .iter()
            .map(|group| (group.id, GroupRef::from(group)))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned().ok_or_else(|| {
                    DomainError::Internal(format!("author of post {} is missing", post.id))
                })?;
                let group = post.group_id.and_then(|id| groups.get(&id).cloned());
                Ok(PostView::new(post, author, group))
            })
            .collect()
    }

    async fn decorate_comments(
        &self,
        comments: Vec<Comment>,
    ) -> Result<Vec<CommentView>, DomainError> {
        let authors = self
            .authors_by_id(comments.iter().map(|c| c.author_id).collect())
            .await?;

        comments
            .into_iter()
            .map(|comment| {
                let author = authors.get(&comment.author_id).cloned().ok_or_else(|| {
                    DomainError::Internal(format!("author of comment {} is missing", comment.id))
                })?;
                Ok(CommentView::new(comment, author))
            })
            .collect()
    }
}

fn unique(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
