use crate::server::ServerRouter;
use axum::Router;

mod comments;
mod follows;
mod groups;
mod posts;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(groups::routes())
        .merge(follows::routes())
}
