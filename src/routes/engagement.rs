// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Likes, saves, lists and the saved view.
//!
//! Every route takes the stored quote ID, never a feed key.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::quote::format_share_text;
use crate::routes::current_session;
use crate::routes::views::{api_timestamp, ListResponse, QuoteResponse, SavedQuoteResponse};
use crate::services::{ListFilter, SaveState, Settled};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/engagement", get(get_engagement))
        .route("/api/quotes/{id}/like", put(like).delete(unlike))
        .route("/api/quotes/{id}/save", put(save).delete(remove_bookmark))
        .route("/api/quotes/{id}/share", get(share))
        .route("/api/saved", get(get_saved))
        .route("/api/lists", get(get_lists).post(create_list))
        .route("/api/lists/{id}", delete(delete_list))
}

/// 404 unless the quote exists.
async fn ensure_quote(state: &AppState, quote_id: &str) -> Result<()> {
    match state.db.get_quote(quote_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Quote {}", quote_id))),
    }
}

// ─── Engagement State ────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EngagementResponse {
    pub liked_quote_ids: Vec<String>,
    /// Newest first
    pub saved: Vec<SavedQuoteResponse>,
}

async fn get_engagement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<EngagementResponse>> {
    let session = current_session(&state, &user).await?;
    let engagement = session.engagement();

    Ok(Json(EngagementResponse {
        liked_quote_ids: engagement.liked_quote_ids(),
        saved: engagement
            .saved_quotes()
            .iter()
            .map(SavedQuoteResponse::from)
            .collect(),
    }))
}

// ─── Likes ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeResponse {
    pub quote_id: String,
    pub liked: bool,
    /// The request joined a toggle already in flight for this quote
    pub joined: bool,
}

fn like_response(quote_id: String, settled: Settled<bool>) -> Json<LikeResponse> {
    Json(LikeResponse {
        quote_id,
        liked: settled.value,
        joined: settled.joined,
    })
}

async fn like(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quote_id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let session = current_session(&state, &user).await?;
    if !session.engagement().is_liked(&quote_id) {
        ensure_quote(&state, &quote_id).await?;
    }
    let settled = session.engagement().like(&quote_id).await?;
    Ok(like_response(quote_id, settled))
}

async fn unlike(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quote_id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let session = current_session(&state, &user).await?;
    let settled = session.engagement().unlike(&quote_id).await?;
    Ok(like_response(quote_id, settled))
}

// ─── Saves ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct SaveRequest {
    /// Target list; omitted or null saves to Quick Save
    #[serde(default)]
    list_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveResponse {
    pub quote_id: String,
    pub saved: bool,
    pub list_id: Option<String>,
    pub saved_at: Option<String>,
    /// The request joined a save already in flight for this quote
    pub joined: bool,
}

fn save_response(quote_id: String, settled: Settled<SaveState>) -> Json<SaveResponse> {
    let (saved, list_id, saved_at) = match settled.value {
        SaveState::Saved(s) => (true, s.list_id, Some(api_timestamp(s.saved_at))),
        SaveState::NotSaved => (false, None, None),
    };
    Json(SaveResponse {
        quote_id,
        saved,
        list_id,
        saved_at,
        joined: settled.joined,
    })
}

/// Save a quote to a list or Quick Save, moving it if already saved.
async fn save(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quote_id): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>> {
    let session = current_session(&state, &user).await?;
    if session.engagement().saved_quote(&quote_id).is_none() {
        ensure_quote(&state, &quote_id).await?;
    }
    let settled = session
        .organizer()
        .save_to_list(&quote_id, request.list_id)
        .await?;
    Ok(save_response(quote_id, settled))
}

/// Delete the save entirely.
async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(quote_id): Path<String>,
) -> Result<Json<SaveResponse>> {
    let session = current_session(&state, &user).await?;
    let settled = session.engagement().remove_bookmark(&quote_id).await?;
    Ok(save_response(quote_id, settled))
}

// ─── Share ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShareResponse {
    pub text: String,
}

async fn share(
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<String>,
) -> Result<Json<ShareResponse>> {
    let quote = state
        .db
        .get_quote(&quote_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quote {}", quote_id)))?;
    let figure = state
        .db
        .get_figure(&quote.figure_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Figure {}", quote.figure_id)))?;

    Ok(Json(ShareResponse {
        text: format_share_text(&figure.display_name, &quote.text, &quote.source_citation),
    }))
}

// ─── Saved View ──────────────────────────────────────────────

#[derive(Deserialize)]
struct SavedQuery {
    /// "all" (default), "quick" or a list ID
    #[serde(default)]
    list: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavedItemResponse {
    pub saved_at: String,
    pub list_id: Option<String>,
    pub quote: QuoteResponse,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavedResponse {
    pub items: Vec<SavedItemResponse>,
    /// Lists for the filter tabs
    pub lists: Vec<ListResponse>,
}

/// Saved quotes, newest first, filtered by All / Quick Save / one list.
async fn get_saved(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SavedQuery>,
) -> Result<Json<SavedResponse>> {
    let filter: ListFilter = params
        .list
        .as_deref()
        .unwrap_or("all")
        .parse()
        .unwrap_or(ListFilter::All);

    let session = current_session(&state, &user).await?;
    let organizer = session.organizer();
    if let ListFilter::List(id) = &filter {
        if !organizer.has_list(id) {
            return Err(AppError::NotFound(format!("List {}", id)));
        }
    }

    let view = organizer.saved_view(&filter, session.figure_map()).await?;

    tracing::debug!(
        user_id = %user.uid(),
        filter = ?filter,
        items = view.len(),
        "Fetched saved view"
    );

    Ok(Json(SavedResponse {
        items: view
            .iter()
            .map(|v| SavedItemResponse {
                saved_at: api_timestamp(v.saved.saved_at),
                list_id: v.saved.list_id.clone(),
                quote: QuoteResponse::new(&v.quote, session.engagement()),
            })
            .collect(),
        lists: list_responses(&session),
    }))
}

// ─── Lists ───────────────────────────────────────────────────

fn list_responses(session: &crate::services::UserSession) -> Vec<ListResponse> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for saved in session.engagement().saved_quotes() {
        if let Some(list_id) = saved.list_id {
            *counts.entry(list_id).or_default() += 1;
        }
    }
    session
        .organizer()
        .lists()
        .iter()
        .map(|l| ListResponse::new(l, counts.get(&l.id).copied().unwrap_or(0)))
        .collect()
}

async fn get_lists(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ListResponse>>> {
    let session = current_session(&state, &user).await?;
    Ok(Json(list_responses(&session)))
}

#[derive(Deserialize, Validate)]
struct CreateListRequest {
    #[validate(length(min = 1, max = 50))]
    name: String,
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateListRequest>,
) -> Result<Json<ListResponse>> {
    body.validate()?;
    let session = current_session(&state, &user).await?;
    let list = session.organizer().create_list(&body.name).await?;
    Ok(Json(ListResponse::new(&list, 0)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteListResponse {
    pub deleted: bool,
    /// Saves moved to Quick Save
    pub moved_to_quick_save: u32,
}

async fn delete_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(list_id): Path<String>,
) -> Result<Json<DeleteListResponse>> {
    let session = current_session(&state, &user).await?;
    let moved = session.organizer().delete_list(&list_id).await?;
    Ok(Json(DeleteListResponse {
        deleted: true,
        moved_to_quick_save: moved as u32,
    }))
}
