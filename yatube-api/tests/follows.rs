mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn follow_then_list() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    app.create_user("bob").await;

    let resp = app
        .post_json("/follow/", json!({ "following": "bob" }), Some(&alice.token))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let created = resp.json();
    assert_eq!(created["user"], "alice");
    assert_eq!(created["following"], "bob");
    assert!(created["id"].is_u64());

    let resp = app.get("/follow/", Some(&alice.token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!([created]));
}

#[tokio::test]
async fn user_field_comes_from_the_token() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    app.create_user("carol").await;

    let resp = app
        .post_json(
            "/follow/",
            json!({ "following": "carol", "user": "bob" }),
            Some(&alice.token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.json()["user"], "alice");

    let resp = app.get("/follow/", Some(&bob.token)).await;
    assert_eq!(resp.json(), json!([]));
}

#[tokio::test]
async fn duplicate_follow_is_rejected() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    app.create_user("bob").await;

    let resp = app
        .post_json("/follow/", json!({ "following": "bob" }), Some(&alice.token))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app
        .post_json("/follow/", json!({ "following": "bob" }), Some(&alice.token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["fields"]["following"].is_array());

    let resp = app.get("/follow/", Some(&alice.token)).await;
    assert_eq!(resp.json().as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invalid_targets_are_rejected() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    for body in [
        json!({ "following": "alice" }),
        json!({ "following": "nonexistent_user" }),
        json!({ "following": "" }),
        json!({ "following": null }),
        json!({}),
    ] {
        let resp = app.post_json("/follow/", body.clone(), Some(&alice.token)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(
            resp.json()["fields"]["following"].is_array(),
            "body: {body}"
        );
    }

    let resp = app.get("/follow/", Some(&alice.token)).await;
    assert_eq!(resp.json(), json!([]));
}

#[tokio::test]
async fn anonymous_requests_are_unauthorized() {
    let app = TestApp::new();
    app.create_user("bob").await;

    let resp = app.get("/follow/", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.post_json("/follow/", json!({ "following": "bob" }), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn search_filters_by_followed_username() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    app.create_user("Fyodor").await;
    app.create_user("anton").await;

    for target in ["Fyodor", "anton"] {
        let resp = app
            .post_json("/follow/", json!({ "following": target }), Some(&alice.token))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }
    let resp = app
        .post_json("/follow/", json!({ "following": "Fyodor" }), Some(&bob.token))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app.get("/follow/?search=fyo", Some(&alice.token)).await;
    let found = resp.json();
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    assert_eq!(found[0]["following"], "Fyodor");
    assert_eq!(found[0]["user"], "alice");

    let resp = app.get("/follow/?search=", Some(&alice.token)).await;
    assert_eq!(resp.json().as_array().map(Vec::len), Some(2));

    let resp = app.get("/follow/?search=zzz", Some(&alice.token)).await;
    assert_eq!(resp.json(), json!([]));
}

#[tokio::test]
async fn only_list_and_create_are_routed() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    let resp = app.delete("/follow/", Some(&alice.token)).await;
    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);

    let resp = app.get("/follow/1/", Some(&alice.token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
