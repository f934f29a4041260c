use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
    pagination::{LimitOffset, Listing},
    validation::{FieldErrors, Nullable, explicit_null},
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
        group::GroupMarker,
        post::{CreatePost, Post, PostContent, PostMarker},
    },
    policy::can_modify,
};
use yatube_db::store::Store;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_patch(partial_update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/")]
struct PostsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct PostBody {
    #[serde(default, deserialize_with = "explicit_null")]
    text: Nullable<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    group: Nullable<Id<GroupMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct PostRepresentation {
    id: Id<PostMarker>,
    text: String,
    author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub_date: OffsetDateTime,
    group: Option<Id<GroupMarker>>,
}

impl From<Post> for PostRepresentation {
    fn from(value: Post) -> Self {
        Self {
            id: value.id,
            text: value.content.text.into_inner(),
            author: value.author.username.into_inner(),
            pub_date: value.pub_date,
            group: value.content.group,
        }
    }
}

pub(super) async fn existing_post(store: &dyn Store, post_id: Id<PostMarker>) -> Result<Post> {
    store
        .fetch_post(post_id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(post_id))
}

/// Validates `body` into the content to store.
///
/// `current` is the post being edited, if any; fields missing from the body
/// keep its values. `text` may only be left out when `require_text` is false.
async fn validated_content(
    store: &dyn Store,
    body: PostBody,
    current: Option<&PostContent>,
    require_text: bool,
) -> Result<PostContent> {
    let mut errors = FieldErrors::default();

    let text = if require_text {
        errors.required_text("text", body.text)
    } else {
        errors.optional_text("text", body.text)
    };

    let group = match body.group {
        Some(Some(group_id)) => {
            if store.fetch_group(group_id).await?.is_none() {
                errors.add(
                    "group",
                    format!("Invalid pk \"{group_id}\" - object does not exist."),
                );
            }
            Some(group_id)
        }
        Some(None) => None,
        None => current.and_then(|content| content.group),
    };

    match text.or_else(|| current.map(|content| content.text.clone())) {
        Some(text) if errors.is_empty() => Ok(PostContent { text, group }),
        _ => Err(errors.into()),
    }
}

/// Fetches the post and checks that `user` may change it.
async fn modifiable_post(
    store: &dyn Store,
    post_id: Id<PostMarker>,
    user: AuthenticatedUser,
) -> Result<Post> {
    let post = existing_post(store, post_id).await?;

    if can_modify(Some(user.user_id()), &post) {
        Ok(post)
    } else {
        Err(ServerError::PermissionDenied(
            "Changing someone else's content is forbidden.",
        ))
    }
}

async fn list_posts(
    path: PostsPath,
    State(store): State<Arc<dyn Store>>,
    Query(window): Query<LimitOffset>,
) -> Result<Json<Listing<PostRepresentation>>> {
    let posts = store
        .list_posts()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(window.paginate(posts, &path.to_string())))
}

async fn create_post(
    PostsPath: PostsPath,
    State(store): State<Arc<dyn Store>>,
    user: AuthenticatedUser,
    Json(body): Json<PostBody>,
) -> Result<(StatusCode, Json<PostRepresentation>)> {
    let content = validated_content(&*store, body, None, true).await?;

    let post = store
        .create_post(&CreatePost {
            author: user.user_id(),
            content,
        })
        .await?;
    debug!(post = %post.id, author = %user.user_id(), "Created post");

    Ok((StatusCode::CREATED, Json(post.into())))
}

async fn get_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<PostRepresentation>> {
    let post = existing_post(&*store, id).await?;

    Ok(Json(post.into()))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
    user: AuthenticatedUser,
    body: Result<Json<PostBody>>,
) -> Result<Json<PostRepresentation>> {
    modify_post(&*store, id, user, body, true).await
}

async fn partial_update_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
    user: AuthenticatedUser,
    body: Result<Json<PostBody>>,
) -> Result<Json<PostRepresentation>> {
    modify_post(&*store, id, user, body, false).await
}

async fn modify_post(
    store: &dyn Store,
    post_id: Id<PostMarker>,
    user: AuthenticatedUser,
    body: Result<Json<PostBody>>,
    require_text: bool,
) -> Result<Json<PostRepresentation>> {
    let post = modifiable_post(store, post_id, user).await?;
    let Json(body) = body?;

    let content = validated_content(store, body, Some(&post.content), require_text).await?;
    let post = store
        .update_post(post.id, &content)
        .await?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;

    Ok(Json(post.into()))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    let post = modifiable_post(&*store, id, user).await?;

    if !store.delete_post(post.id).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }
    debug!(post = %id, "Deleted post");

    Ok(StatusCode::NO_CONTENT)
}
