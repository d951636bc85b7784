// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user session state and the registry that owns it.
//!
//! A session caches what one signed-in user sees: the figures and followed
//! quotes (fetched once), likes, saves, lists and the feed. Sessions are
//! never shared between users, and a user has at most one. Sessions idle
//! for longer than the registry's TTL are evicted.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{Figure, Identity, User};
use crate::services::engagement::Engagement;
use crate::services::enrich::{figure_map, FigureMap};
use crate::services::feed::Feed;
use crate::services::inflight::InFlight;
use crate::services::organizer::ListOrganizer;
use crate::services::profile::{load_user, sign_in};
use dashmap::DashMap;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Everything cached for one signed-in user.
pub struct UserSession {
    user_id: String,
    following: Vec<String>,
    figures: Vec<Figure>,
    figure_map: FigureMap,
    engagement: Engagement,
    organizer: Arc<ListOrganizer>,
    feed: Mutex<Feed>,
}

fn dedup_following(user: &User) -> Vec<String> {
    let mut seen = HashSet::new();
    user.following
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

impl UserSession {
    /// Fetch the user's reference data and engagement state concurrently.
    pub async fn load(repo: Arc<dyn Repository>, user: &User) -> Result<Self, AppError> {
        let following = dedup_following(user);

        let (figures, quotes, liked, saved, lists) = tokio::try_join!(
            repo.list_figures(),
            repo.quotes_for_figures(&following),
            repo.liked_quote_ids(&user.id),
            repo.saved_quotes(&user.id),
            repo.lists(&user.id),
        )?;

        tracing::debug!(
            user_id = %user.id,
            figures = figures.len(),
            quotes = quotes.len(),
            likes = liked.len(),
            saves = saved.len(),
            lists = lists.len(),
            "Session loaded"
        );

        let engagement = Engagement::new(Arc::clone(&repo), &user.id, liked, saved);
        let organizer = Arc::new(ListOrganizer::new(repo, engagement.clone(), lists));
        let feed = Feed::new(&quotes, &figures);

        Ok(Self {
            user_id: user.id.clone(),
            following,
            figure_map: figure_map(&figures),
            figures,
            engagement,
            organizer,
            feed: Mutex::new(feed),
        })
    }

    /// A copy of this session for `user`'s current follow set.
    ///
    /// Figures, quotes and the feed are fetched again; engagement and lists
    /// are carried over, so pending likes and saves stay serialized.
    pub async fn reload_feed(&self, repo: &dyn Repository, user: &User) -> Result<Self, AppError> {
        let following = dedup_following(user);
        let (figures, quotes) =
            tokio::try_join!(repo.list_figures(), repo.quotes_for_figures(&following))?;
        let feed = Feed::new(&quotes, &figures);

        tracing::debug!(
            user_id = %user.id,
            figures = figures.len(),
            quotes = quotes.len(),
            "Session feed reloaded"
        );

        Ok(Self {
            user_id: user.id.clone(),
            following,
            figure_map: figure_map(&figures),
            figures,
            engagement: self.engagement.clone(),
            organizer: Arc::clone(&self.organizer),
            feed: Mutex::new(feed),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Followed figure IDs, de-duplicated.
    pub fn following(&self) -> &[String] {
        &self.following
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn figure_map(&self) -> &FigureMap {
        &self.figure_map
    }

    pub fn engagement(&self) -> &Engagement {
        &self.engagement
    }

    pub fn organizer(&self) -> &ListOrganizer {
        &self.organizer
    }

    /// Exclusive access to the feed. Never hold across an await.
    pub fn feed(&self) -> MutexGuard<'_, Feed> {
        self.feed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for UserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSession")
            .field("user_id", &self.user_id)
            .field("following", &self.following)
            .finish_non_exhaustive()
    }
}

struct Tracked {
    session: Arc<UserSession>,
    last_seen: Instant,
}

impl Tracked {
    fn new(session: Arc<UserSession>) -> Self {
        Self {
            session,
            last_seen: Instant::now(),
        }
    }
}

/// Live sessions keyed by user ID.
pub struct SessionRegistry {
    repo: Arc<dyn Repository>,
    idle_ttl: Duration,
    sessions: Arc<DashMap<String, Tracked>>,
    loading: InFlight<Arc<UserSession>>,
}

impl SessionRegistry {
    pub fn new(repo: Arc<dyn Repository>, idle_ttl: Duration) -> Self {
        Self {
            repo,
            idle_ttl,
            sessions: Arc::new(DashMap::new()),
            loading: InFlight::new(),
        }
    }

    /// The caller's session, creating their profile and session as needed.
    ///
    /// Concurrent first requests for the same user share one sign-in and
    /// one load, so they all end up with the same session.
    pub async fn get_or_sign_in(&self, identity: &Identity) -> Result<Arc<UserSession>, AppError> {
        let repo = Arc::clone(&self.repo);
        let uid = identity.uid.clone();
        let identity = identity.clone();
        self.load_shared(&uid, async move {
            let (user, _) = sign_in(repo.as_ref(), &identity).await?;
            UserSession::load(repo, &user).await
        })
        .await
    }

    /// The user's session, loading it from the store if there is none.
    ///
    /// Fails with `NotFound` when the user has no profile.
    pub async fn get_or_load(&self, user_id: &str) -> Result<Arc<UserSession>, AppError> {
        let repo = Arc::clone(&self.repo);
        let uid = user_id.to_string();
        self.load_shared(user_id, async move {
            let user = load_user(repo.as_ref(), &uid).await?;
            UserSession::load(repo, &user).await
        })
        .await
    }

    async fn load_shared<F>(&self, user_id: &str, load: F) -> Result<Arc<UserSession>, AppError>
    where
        F: Future<Output = Result<UserSession, AppError>> + Send + 'static,
    {
        if let Some(session) = self.get(user_id) {
            return Ok(session);
        }

        let sessions = Arc::clone(&self.sessions);
        let uid = user_id.to_string();
        let settled = self
            .loading
            .run(user_id, async move {
                // A load that finished just before this one started
                if let Some(tracked) = sessions.get(&uid) {
                    return Ok(Arc::clone(&tracked.session));
                }
                let loaded = Arc::new(load.await?);
                let session = Arc::clone(
                    &sessions
                        .entry(uid.clone())
                        .or_insert_with(|| Tracked::new(loaded))
                        .session,
                );
                tracing::info!(user_id = %uid, "Session started");
                Ok(session)
            })
            .await?;

        Ok(settled.value)
    }

    /// The live session, if any. Counts as activity.
    pub fn get(&self, user_id: &str) -> Option<Arc<UserSession>> {
        let mut tracked = self.sessions.get_mut(user_id)?;
        if tracked.last_seen.elapsed() >= self.idle_ttl {
            drop(tracked);
            self.evict(user_id);
            return None;
        }
        tracked.last_seen = Instant::now();
        Some(Arc::clone(&tracked.session))
    }

    fn evict(&self, user_id: &str) {
        let idle_ttl = self.idle_ttl;
        if self
            .sessions
            .remove_if(user_id, |_, t| t.last_seen.elapsed() >= idle_ttl)
            .is_some()
        {
            tracing::debug!(user_id, "Idle session evicted");
        }
    }

    /// Drop every session idle for longer than the TTL. Returns how many.
    pub fn evict_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, t| t.last_seen.elapsed() < self.idle_ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Idle sessions evicted");
        }
        evicted
    }

    /// Drop the user's session, if any.
    pub fn end(&self, user_id: &str) {
        if self.sessions.remove(user_id).is_some() {
            tracing::info!(user_id, "Session ended");
        }
    }

    /// Rebuild the feed after the follow set changed or the user signed in
    /// again, keeping the session's engagement state.
    pub async fn rebuild(&self, user_id: &str) -> Result<Arc<UserSession>, AppError> {
        let previous = self.get_or_load(user_id).await?;
        let user = load_user(self.repo.as_ref(), user_id).await?;
        let session = Arc::new(previous.reload_feed(self.repo.as_ref(), &user).await?);
        self.sessions
            .insert(user_id.to_string(), Tracked::new(Arc::clone(&session)));
        Ok(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
