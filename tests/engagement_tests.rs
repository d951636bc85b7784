// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Likes, saves and lists through the HTTP API.

use axum::http::StatusCode;
use holyscroll::db::Repository;
use std::time::Duration;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, request, seed_figure, seed_quote, token_for};

/// App with one followed figure, `quotes` quotes and a signed-in user.
async fn signed_in_app(
    quotes: usize,
) -> (axum::Router, holyscroll::db::MemoryDb, String, Vec<String>) {
    let (app, state, db) = create_test_app();
    let figure = seed_figure(&db, "augustine", "Augustine");
    let quote_ids = (0..quotes)
        .map(|i| seed_quote(&db, &figure.id, &format!("Quote {}", i)).id)
        .collect();
    let token = token_for(&state, "alice", "alice@example.com");

    let response = app
        .clone()
        .oneshot(request("POST", "/api/session", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    (app, db, token, quote_ids)
}

#[tokio::test]
async fn test_like_and_unlike_write_once_each() {
    let (app, db, token, quotes) = signed_in_app(1).await;
    let uri = format!("/api/quotes/{}/like", quotes[0]);
    let before = db.write_attempts();

    let response = app
        .clone()
        .oneshot(request("PUT", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["liked"], true);
    assert_eq!(body["joined"], false);
    assert_eq!(db.liked_quote_ids("alice").await.unwrap(), quotes);

    // Liking again is a no-op
    app.clone()
        .oneshot(request("PUT", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(db.write_attempts() - before, 1);

    let response = app
        .oneshot(request("DELETE", &uri, &token, None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["liked"], false);
    assert!(db.liked_quote_ids("alice").await.unwrap().is_empty());
    assert_eq!(db.write_attempts() - before, 2);
}

#[tokio::test]
async fn test_concurrent_likes_join_the_pending_write() {
    let (app, db, token, quotes) = signed_in_app(1).await;
    let uri = format!("/api/quotes/{}/like", quotes[0]);
    db.set_write_latency(Some(Duration::from_millis(200)));
    let before = db.write_attempts();

    let (first, second) = tokio::join!(
        app.clone().oneshot(request("PUT", &uri, &token, None)),
        app.clone().oneshot(request("PUT", &uri, &token, None)),
    );
    let first = body_json(first.unwrap()).await;
    let second = body_json(second.unwrap()).await;

    assert_eq!(first["liked"], true);
    assert_eq!(second["liked"], true);
    assert_ne!(first["joined"], second["joined"]);
    assert_eq!(db.write_attempts() - before, 1);
}

#[tokio::test]
async fn test_failed_like_leaves_state_unchanged() {
    let (app, db, token, quotes) = signed_in_app(1).await;
    let uri = format!("/api/quotes/{}/like", quotes[0]);
    db.set_fail_writes(true);

    let response = app
        .clone()
        .oneshot(request("PUT", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    db.set_fail_writes(false);
    let response = app
        .oneshot(request("GET", "/api/engagement", &token, None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["liked_quote_ids"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_like_unknown_quote_is_404() {
    let (app, _, token, _) = signed_in_app(0).await;

    let response = app
        .oneshot(request("PUT", "/api/quotes/nope/like", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_move_and_remove_bookmark() {
    let (app, _, token, quotes) = signed_in_app(1).await;
    let uri = format!("/api/quotes/{}/save", quotes[0]);

    let response = app
        .clone()
        .oneshot(request("PUT", &uri, &token, Some(serde_json::json!({}))))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["saved"], true);
    assert!(body["list_id"].is_null());

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/lists",
            &token,
            Some(serde_json::json!({ "name": "Morning" })),
        ))
        .await
        .unwrap();
    let list = body_json(response).await;
    let list_id = list["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            &token,
            Some(serde_json::json!({ "list_id": list_id })),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["list_id"], list_id.as_str());

    let response = app
        .clone()
        .oneshot(request("GET", "/api/lists", &token, None))
        .await
        .unwrap();
    let lists = body_json(response).await;
    assert_eq!(lists[0]["count"], 1);

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, &token, None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["saved"], false);

    let response = app
        .oneshot(request("GET", "/api/saved", &token, None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_save_to_unknown_list_is_404() {
    let (app, _, token, quotes) = signed_in_app(1).await;

    let response = app
        .oneshot(request(
            "PUT",
            &format!("/api/quotes/{}/save", quotes[0]),
            &token,
            Some(serde_json::json!({ "list_id": "missing" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_list_moves_saves_to_quick_save() {
    let (app, db, token, quotes) = signed_in_app(3).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/lists",
            &token,
            Some(serde_json::json!({ "name": "Evening" })),
        ))
        .await
        .unwrap();
    let list_id = body_json(response).await["id"].as_str().unwrap().to_string();

    for quote_id in &quotes[..2] {
        app.clone()
            .oneshot(request(
                "PUT",
                &format!("/api/quotes/{}/save", quote_id),
                &token,
                Some(serde_json::json!({ "list_id": list_id })),
            ))
            .await
            .unwrap();
    }
    app.clone()
        .oneshot(request(
            "PUT",
            &format!("/api/quotes/{}/save", quotes[2]),
            &token,
            Some(serde_json::json!({ "list_id": null })),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/saved?list={}", list_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["items"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/lists/{}", list_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["moved_to_quick_save"], 2);

    // Every save survives, now unfiled
    let saved = db.saved_quotes("alice").await.unwrap();
    assert_eq!(saved.len(), 3);
    assert!(saved.iter().all(|s| s.list_id.is_none()));

    let response = app
        .clone()
        .oneshot(request("GET", "/api/saved?list=quick", &token, None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert!(body["lists"].as_array().unwrap().is_empty());

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/saved?list={}", list_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_delete_failure_keeps_list() {
    let (app, db, token, quotes) = signed_in_app(1).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/lists",
            &token,
            Some(serde_json::json!({ "name": "Keep" })),
        ))
        .await
        .unwrap();
    let list_id = body_json(response).await["id"].as_str().unwrap().to_string();
    app.clone()
        .oneshot(request(
            "PUT",
            &format!("/api/quotes/{}/save", quotes[0]),
            &token,
            Some(serde_json::json!({ "list_id": list_id })),
        ))
        .await
        .unwrap();

    db.set_fail_writes(true);
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/lists/{}", list_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    db.set_fail_writes(false);

    assert_eq!(db.lists("alice").await.unwrap().len(), 1);
    let response = app
        .oneshot(request("GET", "/api/lists", &token, None))
        .await
        .unwrap();
    let lists = body_json(response).await;
    assert_eq!(lists[0]["id"], list_id.as_str());
    assert_eq!(lists[0]["count"], 1);
}

#[tokio::test]
async fn test_list_name_is_validated() {
    let (app, _, token, _) = signed_in_app(0).await;

    let too_long = "x".repeat(51);
    for name in ["", too_long.as_str()] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/lists",
                &token,
                Some(serde_json::json!({ "name": name })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_share_text() {
    let (app, _, token, quotes) = signed_in_app(1).await;

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/quotes/{}/share", quotes[0]),
            &token,
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert!(body["text"].as_str().unwrap().contains("Quote 0"));
    assert!(body["text"].as_str().unwrap().contains("Augustine"));
}
