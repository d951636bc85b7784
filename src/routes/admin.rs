// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin curation routes (figure and quote CRUD).
//!
//! Auth and the admin allowlist are applied in routes/mod.rs.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{FigureDraft, Quote, QuoteDraft};
use crate::routes::views::{api_timestamp, FigureResponse};
use crate::services::curation;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/figures", get(list_figures).post(create_figure))
        .route(
            "/api/admin/figures/{id}",
            put(update_figure).delete(delete_figure),
        )
        .route("/api/admin/quote-counts", get(quote_counts))
        .route("/api/admin/quotes", post(create_quote))
        .route(
            "/api/admin/quotes/{id}",
            put(update_quote).delete(delete_quote),
        )
}

// ─── Figures ─────────────────────────────────────────────────

async fn list_figures(State(state): State<Arc<AppState>>) -> Result<Json<Vec<FigureResponse>>> {
    let mut figures = state.db.list_figures().await?;
    figures.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(Json(figures.iter().map(FigureResponse::from).collect()))
}

async fn create_figure(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(draft): Json<FigureDraft>,
) -> Result<Json<FigureResponse>> {
    let figure = curation::create_figure(state.db.as_ref(), &draft).await?;
    tracing::info!(admin = %admin.uid(), figure_id = %figure.id, "Admin created figure");
    Ok(Json(FigureResponse::from(&figure)))
}

async fn update_figure(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<FigureDraft>,
) -> Result<Json<FigureResponse>> {
    let figure = curation::update_figure(state.db.as_ref(), &id, &draft).await?;
    Ok(Json(FigureResponse::from(&figure)))
}

#[derive(Deserialize)]
struct DeleteFigureQuery {
    /// Also delete every quote of the figure
    #[serde(default)]
    cascade: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteFigureResponse {
    pub deleted: bool,
    pub deleted_quotes: u32,
}

async fn delete_figure(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(params): Query<DeleteFigureQuery>,
) -> Result<Json<DeleteFigureResponse>> {
    tracing::info!(
        admin = %admin.uid(),
        figure_id = %id,
        cascade = params.cascade,
        "Admin deleting figure"
    );
    let deleted_quotes = curation::delete_figure(state.db.as_ref(), &id, params.cascade).await?;

    Ok(Json(DeleteFigureResponse {
        deleted: true,
        deleted_quotes: deleted_quotes as u32,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct QuoteCountsResponse {
    /// Figure ID -> number of quotes
    pub counts: BTreeMap<String, u32>,
}

async fn quote_counts(State(state): State<Arc<AppState>>) -> Result<Json<QuoteCountsResponse>> {
    let counts = curation::quote_counts(state.db.as_ref()).await?;
    Ok(Json(QuoteCountsResponse {
        counts: counts.into_iter().map(|(k, v)| (k, v as u32)).collect(),
    }))
}

// ─── Quotes ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminQuoteResponse {
    pub id: String,
    pub figure_id: String,
    pub text: String,
    pub source_citation: String,
    pub tags: Vec<String>,
    pub added_by: String,
    pub created_at: String,
}

impl From<&Quote> for AdminQuoteResponse {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id.clone(),
            figure_id: quote.figure_id.clone(),
            text: quote.text.clone(),
            source_citation: quote.source_citation.clone(),
            tags: quote.tags.clone(),
            added_by: quote.added_by.clone(),
            created_at: api_timestamp(quote.created_at),
        }
    }
}

async fn create_quote(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(draft): Json<QuoteDraft>,
) -> Result<Json<AdminQuoteResponse>> {
    let quote = curation::create_quote(state.db.as_ref(), &draft, admin.uid()).await?;
    Ok(Json(AdminQuoteResponse::from(&quote)))
}

async fn update_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<QuoteDraft>,
) -> Result<Json<AdminQuoteResponse>> {
    let quote = curation::update_quote(state.db.as_ref(), &id, &draft).await?;
    Ok(Json(AdminQuoteResponse::from(&quote)))
}

async fn delete_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    curation::delete_quote(state.db.as_ref(), &id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
