// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::Utc;
use holyscroll::config::Config;
use holyscroll::db::{FirestoreDb, MemoryDb};
use holyscroll::middleware::auth::create_jwt;
use holyscroll::models::quote::SEED_AUTHOR;
use holyscroll::models::{Figure, FigureKind, Identity, Quote};
use holyscroll::routes::create_router;
use holyscroll::AppState;
use std::sync::Arc;

/// Email on the admin allowlist of `Config::test_default()`.
#[allow(dead_code)]
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by an in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    let config = Config::test_default();
    let db = MemoryDb::new();
    let state = Arc::new(AppState::new(config, Arc::new(db.clone())));

    (create_router(state.clone()), state, db)
}

#[allow(dead_code)]
pub fn identity(uid: &str, email: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: Some(format!("User {}", uid)),
        photo_url: None,
    }
}

/// Bearer token for a signed-in user.
#[allow(dead_code)]
pub fn token_for(state: &AppState, uid: &str, email: &str) -> String {
    create_jwt(&identity(uid, email), &state.config.jwt_signing_key).expect("jwt")
}

/// Authenticated request with an optional JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[allow(dead_code)]
pub fn seed_figure(db: &MemoryDb, handle: &str, name: &str) -> Figure {
    db.seed_figure(Figure {
        id: String::new(),
        handle: handle.to_string(),
        display_name: name.to_string(),
        kind: FigureKind::Person,
        bio: String::new(),
        profile_pic_url: String::new(),
        tradition: "Christian".to_string(),
        external_links: Vec::new(),
        created_at: Utc::now(),
    })
}

#[allow(dead_code)]
pub fn seed_quote(db: &MemoryDb, figure_id: &str, text: &str) -> Quote {
    db.seed_quote(Quote {
        id: String::new(),
        figure_id: figure_id.to_string(),
        text: text.to_string(),
        source_citation: String::new(),
        tags: Vec::new(),
        added_by: SEED_AUTHOR.to_string(),
        created_at: Utc::now(),
    })
}
