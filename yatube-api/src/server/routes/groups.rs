//! Read-only access to groups. Other verbs fall through to 405.

use crate::server::{
    Result, ServerError, ServerRouter,
    extract::{Json, Query},
    pagination::{LimitOffset, Listing},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use yatube_common::model::{
    Id,
    group::{Group, GroupMarker},
};
use yatube_db::store::Store;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_groups)
        .typed_get(get_group)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/groups/")]
struct GroupsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/groups/{id}/", rejection(ServerError))]
struct GroupPath {
    id: Id<GroupMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct GroupRepresentation {
    id: Id<GroupMarker>,
    title: String,
    slug: String,
    description: String,
}

impl From<Group> for GroupRepresentation {
    fn from(value: Group) -> Self {
        Self {
            id: value.id,
            title: value.title.get().to_owned(),
            slug: value.slug.get().to_owned(),
            description: value.description,
        }
    }
}

async fn list_groups(
    path: GroupsPath,
    State(store): State<Arc<dyn Store>>,
    Query(window): Query<LimitOffset>,
) -> Result<Json<Listing<GroupRepresentation>>> {
    let groups = store
        .list_groups()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(window.paginate(groups, &path.to_string())))
}

async fn get_group(
    GroupPath { id }: GroupPath,
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<GroupRepresentation>> {
    let group = store
        .fetch_group(id)
        .await?
        .ok_or(ServerError::GroupByIdNotFound(id))?;

    Ok(Json(group.into()))
}
