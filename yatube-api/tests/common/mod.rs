#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use time::UtcDateTime;
use tower::ServiceExt;
use yatube_api::server::{self, ServerState};
use yatube_common::model::{
    Id,
    auth::{AuthToken, Authentication, TokenLifetime},
    group::{CreateGroup, Group, GroupSlug, GroupTitle},
    post::{CreatePost, Post, PostContent},
    text::NonBlankText,
    user::{CreateUser, UserMarker, Username},
};
use yatube_db::{
    memory::MemoryStore,
    store::{GroupStore, PostStore, UserStore},
};

/// The real router on top of a fresh in-memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct TestUser {
    pub id: Id<UserMarker>,
    pub username: String,
    pub token: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let router = server::app(ServerState::new(store.clone()));

        Self { router, store }
    }

    pub async fn create_user(&self, username: &str) -> TestUser {
        let user = self
            .store
            .create_user(&CreateUser {
                username: Username::new(username.to_owned()).unwrap(),
            })
            .await
            .unwrap();

        let token = AuthToken::generate_random(user.id);
        self.store
            .create_auth(&Authentication::issue(&token, UtcDateTime::now(), None).unwrap())
            .await
            .unwrap();

        TestUser {
            id: user.id,
            username: username.to_owned(),
            token: token.encode(),
        }
    }

    /// Stores another token for `user`, issued at `issued_at`.
    pub async fn issue_token(
        &self,
        user: &TestUser,
        issued_at: UtcDateTime,
        lifetime: Option<TokenLifetime>,
    ) -> String {
        let token = AuthToken::generate_random(user.id);
        self.store
            .create_auth(&Authentication::issue(&token, issued_at, lifetime).unwrap())
            .await
            .unwrap();

        token.encode()
    }

    pub async fn create_post(&self, author: &TestUser, text: &str) -> Post {
        self.store
            .create_post(&CreatePost {
                author: author.id,
                content: PostContent {
                    text: NonBlankText::new(text).unwrap(),
                    group: None,
                },
            })
            .await
            .unwrap()
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        self.store
            .create_group(&CreateGroup {
                title: GroupTitle::new(title.to_owned()).unwrap(),
                slug: GroupSlug::new(slug.to_owned()).unwrap(),
                description: format!("All about {title}"),
            })
            .await
            .unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put_json(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch_json(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }
}
