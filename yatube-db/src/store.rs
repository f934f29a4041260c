//! Repository traits the HTTP layer is written against.
//!
//! Each trait covers one table. [`Store`] bundles them so a single
//! `Arc<dyn Store>` can be handed to the router.

use crate::Result;
use async_trait::async_trait;
use yatube_common::model::{
    Id,
    auth::{AuthTokenHash, Authentication},
    comment::{Comment, CommentMarker, CreateComment},
    follow::{CreateFollow, Follow},
    group::{CreateGroup, Group, GroupMarker},
    post::{CreatePost, Post, PostContent, PostMarker},
    text::NonBlankText,
    user::{CreateUser, User, UserMarker, Username},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>>;

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>>;

    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>>;

    async fn create_auth(&self, authentication: &Authentication) -> Result<()>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts in id order.
    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    async fn create_post(&self, post: &CreatePost) -> Result<Post>;

    /// Replaces the content of a post. `None` if it does not exist.
    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>>;

    /// Deletes a post and its comments. `false` if it did not exist.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>>;

    async fn create_group(&self, group: &CreateGroup) -> Result<Group>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments under `post_id` in id order.
    async fn list_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>>;

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>>;

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment>;

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        text: &NonBlankText,
    ) -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool>;
}

#[async_trait]
pub trait FollowStore: Send + Sync {
    /// Follows made by `user`, optionally narrowed to followed usernames
    /// containing `search` (case-insensitive).
    async fn list_follows(
        &self,
        user: Id<UserMarker>,
        search: Option<&str>,
    ) -> Result<Vec<Follow>>;

    async fn follow_exists(&self, follow: CreateFollow) -> Result<bool>;

    /// Fails with [`crate::DbError::UniqueViolation`] if the pair already exists.
    async fn create_follow(&self, follow: CreateFollow) -> Result<Follow>;
}

pub trait Store: UserStore + PostStore + GroupStore + CommentStore + FollowStore {}

impl<T> Store for T where T: UserStore + PostStore + GroupStore + CommentStore + FollowStore {}
