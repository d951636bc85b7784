// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Suggestion submission.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::SuggestionDetails;
use crate::services::suggestions;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/suggestions", post(submit_suggestion))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SuggestionResponse {
    pub id: String,
    pub status: String,
}

/// Submit a figure or quote suggestion for admin review.
///
/// Body: `{"type": "figure", "figureName", "figureDescription", "figureWhy"}`
/// or `{"type": "quote", "quoteFigure", "quoteText", "quoteSource"}`.
async fn submit_suggestion(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(details): Json<SuggestionDetails>,
) -> Result<Json<SuggestionResponse>> {
    let id = suggestions::submit(state.db.as_ref(), &user.identity, &details).await?;
    Ok(Json(SuggestionResponse {
        id,
        status: "pending".to_string(),
    }))
}
