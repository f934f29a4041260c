use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use extract::Json;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use validation::FieldErrors;
use yatube_common::model::{
    Id,
    auth::{AuthTokenDecodeError, AuthTokenHashError, TokenRejection},
    comment::CommentMarker,
    group::GroupMarker,
    post::PostMarker,
};
use yatube_db::{DbError, store::Store};

pub mod auth;
mod extract;
mod pagination;
mod routes;
mod validation;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub store: Arc<dyn Store>,
}

impl ServerState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes()
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(fallback)
}

/// The complete application, ready to be served.
pub fn app(state: ServerState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub async fn method_not_allowed(request: Request) -> ServerError {
    let parts = request.into_parts().0;
    ServerError::MethodNotAllowed(parts.method, parts.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Method {0} is not allowed on {1}")]
    MethodNotAllowed(Method, Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided auth token could not be decoded: {0}")]
    InvalidAuthToken(#[from] AuthTokenDecodeError),
    #[error("The auth token could not be hashed: {0}")]
    AuthTokenHash(#[from] AuthTokenHashError),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error("Provided token was refused: {0}")]
    RejectedToken(#[from] TokenRejection),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Group with id {0} was not found.")]
    GroupByIdNotFound(Id<GroupMarker>),
    #[error("Comment with id {comment_id} was not found under post {post_id}.")]
    CommentByIdNotFound {
        post_id: Id<PostMarker>,
        comment_id: Id<CommentMarker>,
    },
    #[error("{0}")]
    PermissionDenied(&'static str),
    #[error("Request failed validation: {0:?}")]
    Validation(FieldErrors),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::GroupByIdNotFound(_)
            | ServerError::CommentByIdNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed(..) => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::InvalidToken | ServerError::RejectedToken(_) => StatusCode::UNAUTHORIZED,
            ServerError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidAuthToken(_)
            | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::AuthTokenHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Store and hashing failures stay in the logs.
            ServerError::Database(_) | ServerError::AuthTokenHash(_) => {
                "Internal server error".to_owned()
            }
            ServerError::Validation(_) => "Invalid input".to_owned(),
            _ => self.to_string(),
        }
    }
}

impl From<FieldErrors> for ServerError {
    fn from(value: FieldErrors) -> Self {
        ServerError::Validation(value)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            warn!(error = %self, %status, "Replying with error");
        }

        let message = self.public_message();
        let fields = match self {
            ServerError::Validation(fields) => Some(fields),
            _ => None,
        };
        let error_response = ErrorResponse {
            status: status.as_u16(),
            message,
            fields,
        };
        (status, Json(error_response)).into_response()
    }
}
