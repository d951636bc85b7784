// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Home feed routes: current feed, infinite-scroll batches and refresh.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::FeedItem;
use crate::routes::current_session;
use crate::routes::views::FeedItemResponse;
use crate::services::{Engagement, LOOKAHEAD_MARGIN_PX};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/feed/more", post(load_more))
        .route("/api/feed/refresh", post(refresh))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedResponse {
    /// No followed quotes or no figures: render the empty state
    pub empty: bool,
    /// Items of this response (retained batches, or only the appended batch)
    pub items: Vec<FeedItemResponse>,
    /// Batches generated so far
    pub batches: u32,
    /// Request the next batch once the end is this close (pixels)
    pub lookahead_margin_px: u32,
}

fn feed_response(
    empty: bool,
    items: &[FeedItem],
    batches: u32,
    engagement: &Engagement,
) -> FeedResponse {
    FeedResponse {
        empty,
        items: items
            .iter()
            .map(|item| FeedItemResponse::new(item, engagement))
            .collect(),
        batches,
        lookahead_margin_px: LOOKAHEAD_MARGIN_PX,
    }
}

/// Get the feed's retained batches.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FeedResponse>> {
    let session = current_session(&state, &user).await?;
    let feed = session.feed();

    Ok(Json(feed_response(
        feed.is_empty(),
        feed.items(),
        feed.batches(),
        session.engagement(),
    )))
}

#[derive(Deserialize)]
struct LoadMoreQuery {
    /// Distance from the viewport to the end-of-feed sentinel; omitted means
    /// the sentinel is visible.
    distance_px: Option<u32>,
}

/// Append one more shuffled batch. Returns only the appended items.
async fn load_more(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(request): Query<LoadMoreQuery>,
) -> Result<Json<FeedResponse>> {
    let session = current_session(&state, &user).await?;
    let mut feed = session.feed();

    let appended = feed.on_sentinel(request.distance_px.unwrap_or(0)).to_vec();

    tracing::debug!(
        user_id = %user.uid(),
        distance_px = ?request.distance_px,
        appended = appended.len(),
        batches = feed.batches(),
        "Feed load more"
    );

    Ok(Json(feed_response(
        feed.is_empty(),
        &appended,
        feed.batches(),
        session.engagement(),
    )))
}

/// Discard appended batches and reshuffle into a new batch 0.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FeedResponse>> {
    let session = current_session(&state, &user).await?;
    let mut feed = session.feed();
    feed.refresh();

    Ok(Json(feed_response(
        feed.is_empty(),
        feed.items(),
        feed.batches(),
        session.engagement(),
    )))
}
