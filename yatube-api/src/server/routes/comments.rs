//! Comments, always addressed through the post they belong to.

use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::Json,
    routes::posts::existing_post,
    validation::{FieldErrors, NON_FIELD_ERRORS, Nullable, explicit_null},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;
use yatube_common::{
    model::{
        Id,
        comment::{Comment, CommentMarker, CreateComment},
        post::PostMarker,
    },
    policy::can_modify,
};
use yatube_db::store::Store;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(create_comment)
        .typed_get(get_comment)
        .typed_put(update_comment)
        .typed_patch(partial_update_comment)
        .typed_delete(delete_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comments/", rejection(ServerError))]
struct CommentsPath {
    post_id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comments/{comment_id}/", rejection(ServerError))]
struct CommentPath {
    post_id: Id<PostMarker>,
    comment_id: Id<CommentMarker>,
}

/// Writable fields of a comment. `author`, `post` and the rest are read-only
/// and silently dropped.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct CommentBody {
    #[serde(default, deserialize_with = "explicit_null")]
    text: Nullable<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct CommentRepresentation {
    id: Id<CommentMarker>,
    author: String,
    post: Id<PostMarker>,
    text: String,
    #[serde(with = "time::serde::rfc3339")]
    created: OffsetDateTime,
}

impl From<Comment> for CommentRepresentation {
    fn from(value: Comment) -> Self {
        Self {
            id: value.id,
            author: value.author.username.into_inner(),
            post: value.post,
            text: value.text.into_inner(),
            created: value.created,
        }
    }
}

/// Looks a comment up by id, but only under the post named in the path.
async fn scoped_comment(store: &dyn Store, path: &CommentPath) -> Result<Comment> {
    let not_found = || ServerError::CommentByIdNotFound {
        post_id: path.post_id,
        comment_id: path.comment_id,
    };

    let comment = store
        .fetch_comment(path.comment_id)
        .await?
        .ok_or_else(not_found)?;

    if comment.post == path.post_id {
        Ok(comment)
    } else {
        debug!(
            comment = %comment.id,
            actual_post = %comment.post,
            requested_post = %path.post_id,
            "Comment requested under the wrong post"
        );
        Err(not_found())
    }
}

/// Fetches the comment and checks that `user` may change it.
///
/// A broken `Authorization` header only surfaces once the comment is known to exist.
async fn modifiable_comment(
    store: &dyn Store,
    path: &CommentPath,
    user: Result<Option<AuthenticatedUser>>,
) -> Result<Comment> {
    let comment = scoped_comment(store, path).await?;
    let user = user?;

    if can_modify(user.map(AuthenticatedUser::user_id), &comment) {
        Ok(comment)
    } else {
        Err(ServerError::PermissionDenied(
            "Changing someone else's content is forbidden.",
        ))
    }
}

async fn list_comments(
    CommentsPath { post_id }: CommentsPath,
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<Vec<CommentRepresentation>>> {
    existing_post(&*store, post_id).await?;

    let comments = store.list_comments(post_id).await?;

    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

async fn create_comment(
    CommentsPath { post_id }: CommentsPath,
    State(store): State<Arc<dyn Store>>,
    user: Result<Option<AuthenticatedUser>>,
    body: Result<Json<CommentBody>>,
) -> Result<(StatusCode, Json<CommentRepresentation>)> {
    existing_post(&*store, post_id).await?;
    let user = user?;
    let Json(body) = body?;

    let mut errors = FieldErrors::default();
    let text = errors.required_text("text", body.text);
    if user.is_none() {
        errors.add(
            NON_FIELD_ERRORS,
            "Authentication credentials were not provided.",
        );
    }
    let (Some(text), Some(user)) = (text, user) else {
        return Err(errors.into());
    };

    let comment = store
        .create_comment(&CreateComment {
            author: user.user_id(),
            post: post_id,
            text,
        })
        .await?;
    debug!(comment = %comment.id, post = %post_id, "Created comment");

    Ok((StatusCode::CREATED, Json(comment.into())))
}

async fn get_comment(
    path: CommentPath,
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<CommentRepresentation>> {
    let comment = scoped_comment(&*store, &path).await?;

    Ok(Json(comment.into()))
}

async fn update_comment(
    path: CommentPath,
    State(store): State<Arc<dyn Store>>,
    user: Result<Option<AuthenticatedUser>>,
    body: Result<Json<CommentBody>>,
) -> Result<Json<CommentRepresentation>> {
    modify_comment(&*store, &path, user, body).await
}

async fn partial_update_comment(
    path: CommentPath,
    State(store): State<Arc<dyn Store>>,
    user: Result<Option<AuthenticatedUser>>,
    body: Result<Json<CommentBody>>,
) -> Result<Json<CommentRepresentation>> {
    modify_comment(&*store, &path, user, body).await
}

/// Shared by PUT and PATCH: both merge only the fields that were sent.
async fn modify_comment(
    store: &dyn Store,
    path: &CommentPath,
    user: Result<Option<AuthenticatedUser>>,
    body: Result<Json<CommentBody>>,
) -> Result<Json<CommentRepresentation>> {
    let comment = modifiable_comment(store, path, user).await?;
    let Json(body) = body?;

    let mut errors = FieldErrors::default();
    let text = errors.optional_text("text", body.text);
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let Some(text) = text else {
        return Ok(Json(comment.into()));
    };
    let comment = store
        .update_comment(comment.id, &text)
        .await?
        .ok_or(ServerError::CommentByIdNotFound {
            post_id: path.post_id,
            comment_id: path.comment_id,
        })?;

    Ok(Json(comment.into()))
}

async fn delete_comment(
    path: CommentPath,
    State(store): State<Arc<dyn Store>>,
    user: Result<Option<AuthenticatedUser>>,
) -> Result<StatusCode> {
    let comment = modifiable_comment(&*store, &path, user).await?;

    if !store.delete_comment(comment.id).await? {
        return Err(ServerError::CommentByIdNotFound {
            post_id: path.post_id,
            comment_id: path.comment_id,
        });
    }
    debug!(comment = %comment.id, "Deleted comment");

    Ok(StatusCode::NO_CONTENT)
}
