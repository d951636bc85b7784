// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Figure browsing and profiles.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Figure;
use crate::routes::current_session;
use crate::routes::views::{FigureResponse, QuoteResponse};
use crate::services::enrich::{enrich, figure_map};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/figures", get(list_figures))
        .route("/api/figures/{id}", get(get_figure))
        .route("/api/figures/handle/{handle}", get(get_figure_by_handle))
        .route("/api/figures/{id}/quotes", get(get_figure_quotes))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FigureProfileResponse {
    pub figure: FigureResponse,
    pub followed: bool,
}

async fn list_figures(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FigureProfileResponse>>> {
    let session = current_session(&state, &user).await?;
    let mut figures = state.db.list_figures().await?;
    figures.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    Ok(Json(
        figures
            .iter()
            .map(|f| FigureProfileResponse {
                figure: FigureResponse::from(f),
                followed: session.following().contains(&f.id),
            })
            .collect(),
    ))
}

async fn profile_response(
    state: &AppState,
    user: &AuthUser,
    figure: Option<Figure>,
    missing: String,
) -> Result<Json<FigureProfileResponse>> {
    let figure = figure.ok_or(AppError::NotFound(missing))?;
    let session = current_session(state, user).await?;

    Ok(Json(FigureProfileResponse {
        followed: session.following().contains(&figure.id),
        figure: FigureResponse::from(&figure),
    }))
}

/// Figure profile by ID. A missing figure is a 404, never an empty page.
async fn get_figure(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<FigureProfileResponse>> {
    let figure = state.db.get_figure(&id).await?;
    profile_response(&state, &user, figure, format!("Figure {}", id)).await
}

async fn get_figure_by_handle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(handle): Path<String>,
) -> Result<Json<FigureProfileResponse>> {
    let figure = state.db.get_figure_by_handle(&handle.to_lowercase()).await?;
    profile_response(&state, &user, figure, format!("Figure @{}", handle)).await
}

/// A figure's quotes, enriched for display, newest first.
async fn get_figure_quotes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<QuoteResponse>>> {
    let (figure, mut quotes) = tokio::try_join!(
        state.db.get_figure(&id),
        state.db.quotes_by_figure(&id)
    )?;
    let figure = figure.ok_or_else(|| AppError::NotFound(format!("Figure {}", id)))?;
    quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let session = current_session(&state, &user).await?;
    let enriched = enrich(&quotes, &figure_map(std::slice::from_ref(&figure)));

    tracing::debug!(figure_id = %id, quotes = enriched.len(), "Fetched figure quotes");

    Ok(Json(
        enriched
            .iter()
            .map(|q| QuoteResponse::new(q, session.engagement()))
            .collect(),
    ))
}
