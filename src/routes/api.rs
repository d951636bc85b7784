// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the signed-in user: session, profile, onboarding, follows.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::ProfileUpdate;
use crate::routes::views::{FigureResponse, UserResponse};
use crate::services::onboarding::{complete_onboarding, destination_for, Destination};
use crate::services::profile::{self, sign_in};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", post(start_session).delete(end_session))
        .route("/api/me", get(get_me).patch(update_me))
        .route("/api/me/tutorial", post(mark_tutorial_seen))
        .route("/api/me/following", put(set_following))
        .route("/api/onboarding", get(get_onboarding))
        .route(
            "/api/figures/{id}/follow",
            put(follow_figure).delete(unfollow_figure),
        )
}

// ─── Session ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub user: UserResponse,
    /// True when this sign-in created the profile
    pub is_new_user: bool,
    pub destination: Destination,
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Sign in: create the profile on first visit, load the session and issue
/// a session cookie.
async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let (profile, is_new_user) = sign_in(state.db.as_ref(), &user.identity).await?;
    state.sessions.rebuild(&profile.id).await?;

    let token = create_jwt(&user.identity, &state.config.jwt_signing_key)?;
    let secure = !state.config.frontend_url.starts_with("http://localhost");

    tracing::info!(user_id = %profile.id, is_new_user, "User signed in");

    Ok((
        jar.add(session_cookie(token, secure)),
        Json(SessionResponse {
            destination: destination_for(&profile),
            user: UserResponse::from(&profile),
            is_new_user,
        }),
    ))
}

/// Sign out: drop the server-side session and clear the cookie.
async fn end_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> CookieJar {
    state.sessions.end(user.uid());
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = profile::load_user(state.db.as_ref(), user.uid()).await?;
    Ok(Json(UserResponse::from(&profile)))
}

#[derive(Deserialize, Validate)]
struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    display_name: Option<String>,
    #[validate(length(max = 160))]
    bio: Option<String>,
    #[validate(url)]
    profile_pic_url: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    body.validate()?;

    let update = ProfileUpdate {
        display_name: body.display_name,
        bio: body.bio,
        profile_pic_url: body.profile_pic_url,
    };
    let profile = profile::update_profile(state.db.as_ref(), user.uid(), &update).await?;

    Ok(Json(UserResponse::from(&profile)))
}

async fn mark_tutorial_seen(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = profile::mark_tutorial_seen(state.db.as_ref(), user.uid()).await?;
    Ok(Json(UserResponse::from(&profile)))
}

// ─── Onboarding & Follows ────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingResponse {
    /// Every figure, for the selection grid
    pub figures: Vec<FigureResponse>,
    /// Currently followed figure IDs (pre-selected)
    pub selected: Vec<String>,
}

async fn get_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<OnboardingResponse>> {
    let (figures, profile) = tokio::try_join!(
        state.db.list_figures(),
        profile::load_user(state.db.as_ref(), user.uid())
    )?;

    Ok(Json(OnboardingResponse {
        figures: figures.iter().map(FigureResponse::from).collect(),
        selected: profile.following,
    }))
}

#[derive(Deserialize)]
struct SetFollowingRequest {
    figure_ids: Vec<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FollowingResponse {
    pub following: Vec<String>,
    pub destination: Destination,
}

impl FollowingResponse {
    fn new(following: Vec<String>) -> Self {
        let destination = if following.is_empty() {
            Destination::Onboarding
        } else {
            Destination::Feed
        };
        Self {
            following,
            destination,
        }
    }
}

/// Complete onboarding: replace the whole follow set.
async fn set_following(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SetFollowingRequest>,
) -> Result<Json<FollowingResponse>> {
    let following = complete_onboarding(state.db.as_ref(), user.uid(), &body.figure_ids).await?;
    state.sessions.rebuild(user.uid()).await?;

    Ok(Json(FollowingResponse::new(following)))
}

async fn follow_figure(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(figure_id): Path<String>,
) -> Result<Json<FollowingResponse>> {
    let following = profile::follow(state.db.as_ref(), user.uid(), &figure_id).await?;
    state.sessions.rebuild(user.uid()).await?;

    Ok(Json(FollowingResponse::new(following)))
}

async fn unfollow_figure(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(figure_id): Path<String>,
) -> Result<Json<FollowingResponse>> {
    let following = profile::unfollow(state.db.as_ref(), user.uid(), &figure_id).await?;
    if following.is_empty() {
        tracing::info!(user_id = %user.uid(), "User unfollowed everyone");
    }
    state.sessions.rebuild(user.uid()).await?;

    Ok(Json(FollowingResponse::new(following)))
}
