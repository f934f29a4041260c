//! Follow relationships of the requesting user.

use crate::server::{
    Result, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
    validation::{FieldErrors, NON_FIELD_ERRORS, NOT_NULL, Nullable, REQUIRED, explicit_null},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use yatube_common::model::{
    Id,
    follow::{CreateFollow, Follow, FollowMarker},
    user::Username,
};
use yatube_db::store::Store;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_follows)
        .typed_post(create_follow)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follow/")]
struct FollowPath;

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct FollowSearch {
    search: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct FollowBody {
    #[serde(default, deserialize_with = "explicit_null")]
    following: Nullable<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct FollowRepresentation {
    id: Id<FollowMarker>,
    user: String,
    following: String,
}

impl From<Follow> for FollowRepresentation {
    fn from(value: Follow) -> Self {
        Self {
            id: value.id,
            user: value.user.username.into_inner(),
            following: value.following.username.into_inner(),
        }
    }
}

async fn list_follows(
    FollowPath: FollowPath,
    State(store): State<Arc<dyn Store>>,
    user: AuthenticatedUser,
    Query(FollowSearch { search }): Query<FollowSearch>,
) -> Result<Json<Vec<FollowRepresentation>>> {
    let search = search.as_deref().filter(|term| !term.is_empty());
    let follows = store.list_follows(user.user_id(), search).await?;

    Ok(Json(follows.into_iter().map(Into::into).collect()))
}

async fn create_follow(
    FollowPath: FollowPath,
    State(store): State<Arc<dyn Store>>,
    user: AuthenticatedUser,
    Json(body): Json<FollowBody>,
) -> Result<(StatusCode, Json<FollowRepresentation>)> {
    let following = match body.following {
        Some(Some(following)) => following,
        Some(None) => return Err(FieldErrors::single("following", NOT_NULL).into()),
        None => return Err(FieldErrors::single("following", REQUIRED).into()),
    };
    if following.trim().is_empty() {
        return Err(FieldErrors::single("following", "This field may not be blank.").into());
    }

    let target = match Username::new(following.clone()) {
        Ok(username) => store.fetch_user_by_username(&username).await?,
        Err(_) => None,
    }
    .ok_or_else(|| {
        FieldErrors::single(
            "following",
            format!("User \"{following}\" does not exist."),
        )
    })?;

    let follow = CreateFollow::new(user.user_id(), target.id)
        .map_err(|_| FieldErrors::single("following", "You cannot follow yourself."))?;

    // Early exit only; the store's unique constraint is what actually holds.
    if store.follow_exists(follow).await? {
        return Err(
            FieldErrors::single("following", format!("You already follow \"{following}\".")).into(),
        );
    }

    let follow = match store.create_follow(follow).await {
        Ok(follow) => follow,
        Err(err) => {
            warn!(error = %err, user = %user.user_id(), target = %target.id, "Store refused follow");
            return Err(FieldErrors::single(NON_FIELD_ERRORS, "Could not follow this user.").into());
        }
    };
    debug!(follow = %follow.id, "Created follow");

    Ok((StatusCode::CREATED, Json(follow.into())))
}
