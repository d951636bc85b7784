// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user like and save state.
//!
//! Local state only advances after the store write succeeds, so a failed
//! write leaves it untouched and the action can be retried. Toggles for the
//! same quote are serialized through an `InFlight` guard: a request that
//! arrives while another is pending joins it instead of writing again.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::SavedQuote;
use crate::services::inflight::{InFlight, Settled};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Save state of one quote after a save/remove operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveState {
    Saved(SavedQuote),
    NotSaved,
}

struct EngagementInner {
    repo: Arc<dyn Repository>,
    user_id: String,
    liked: RwLock<HashSet<String>>,
    saved: RwLock<HashMap<String, SavedQuote>>,
    liking: InFlight<bool>,
    saving: InFlight<SaveState>,
}

impl EngagementInner {
    fn liked(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.liked.read().unwrap_or_else(|e| e.into_inner())
    }

    fn liked_mut(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.liked.write().unwrap_or_else(|e| e.into_inner())
    }

    fn saved(&self) -> RwLockReadGuard<'_, HashMap<String, SavedQuote>> {
        self.saved.read().unwrap_or_else(|e| e.into_inner())
    }

    fn saved_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, SavedQuote>> {
        self.saved.write().unwrap_or_else(|e| e.into_inner())
    }

    fn log_failure(&self, action: &'static str, quote_id: &str, err: &AppError) {
        tracing::warn!(
            user_id = %self.user_id,
            quote_id,
            action,
            error = %err,
            "Engagement write failed"
        );
    }
}

/// Likes and saves of one signed-in user. Clones share state.
#[derive(Clone)]
pub struct Engagement {
    inner: Arc<EngagementInner>,
}

impl Engagement {
    /// Build from already-fetched state.
    pub fn new(
        repo: Arc<dyn Repository>,
        user_id: &str,
        liked_quote_ids: Vec<String>,
        saved: Vec<SavedQuote>,
    ) -> Self {
        Self {
            inner: Arc::new(EngagementInner {
                repo,
                user_id: user_id.to_string(),
                liked: RwLock::new(liked_quote_ids.into_iter().collect()),
                saved: RwLock::new(
                    saved
                        .into_iter()
                        .map(|s| (s.quote_id.clone(), s))
                        .collect(),
                ),
                liking: InFlight::new(),
                saving: InFlight::new(),
            }),
        }
    }

    /// Load a user's likes and saves from the store.
    pub async fn load(repo: Arc<dyn Repository>, user_id: &str) -> Result<Self, AppError> {
        let (liked, saved) = tokio::try_join!(
            repo.liked_quote_ids(user_id),
            repo.saved_quotes(user_id)
        )?;
        Ok(Self::new(repo, user_id, liked, saved))
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    // ─── Reads ───────────────────────────────────────────────────

    pub fn is_liked(&self, quote_id: &str) -> bool {
        self.inner.liked().contains(quote_id)
    }

    /// Liked quote IDs, sorted.
    pub fn liked_quote_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.liked().iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn saved_quote(&self, quote_id: &str) -> Option<SavedQuote> {
        self.inner.saved().get(quote_id).cloned()
    }

    /// All saves, newest first.
    pub fn saved_quotes(&self) -> Vec<SavedQuote> {
        let mut saved: Vec<SavedQuote> = self.inner.saved().values().cloned().collect();
        saved.sort_by(|a, b| {
            b.saved_at
                .cmp(&a.saved_at)
                .then_with(|| a.quote_id.cmp(&b.quote_id))
        });
        saved
    }

    pub fn is_like_pending(&self, quote_id: &str) -> bool {
        self.inner.liking.is_pending(quote_id)
    }

    pub fn is_save_pending(&self, quote_id: &str) -> bool {
        self.inner.saving.is_pending(quote_id)
    }

    // ─── Likes ───────────────────────────────────────────────────

    /// Like a quote. Returns whether the quote is liked afterwards.
    pub async fn like(&self, quote_id: &str) -> Result<Settled<bool>, AppError> {
        let inner = Arc::clone(&self.inner);
        let id = quote_id.to_string();

        self.inner
            .liking
            .run(quote_id, async move {
                if inner.liked().contains(&id) {
                    return Ok(true);
                }
                if let Err(e) = inner.repo.add_like(&inner.user_id, &id).await {
                    inner.log_failure("like", &id, &e);
                    return Err(e);
                }
                inner.liked_mut().insert(id.clone());
                tracing::info!(user_id = %inner.user_id, quote_id = %id, "Quote liked");
                Ok(true)
            })
            .await
    }

    /// Unlike a quote. Unliking a quote that is not liked is a no-op.
    pub async fn unlike(&self, quote_id: &str) -> Result<Settled<bool>, AppError> {
        let inner = Arc::clone(&self.inner);
        let id = quote_id.to_string();

        self.inner
            .liking
            .run(quote_id, async move {
                if !inner.liked().contains(&id) {
                    return Ok(false);
                }
                if let Err(e) = inner.repo.remove_like(&inner.user_id, &id).await {
                    inner.log_failure("unlike", &id, &e);
                    return Err(e);
                }
                inner.liked_mut().remove(&id);
                tracing::info!(user_id = %inner.user_id, quote_id = %id, "Quote unliked");
                Ok(false)
            })
            .await
    }

    // ─── Saves ───────────────────────────────────────────────────

    /// Save a quote into `list_id`, or into Quick Save when `None`.
    ///
    /// Creates the save if absent, otherwise moves it.
    pub async fn save_to_list(
        &self,
        quote_id: &str,
        list_id: Option<String>,
    ) -> Result<Settled<SaveState>, AppError> {
        let inner = Arc::clone(&self.inner);
        let id = quote_id.to_string();

        self.inner
            .saving
            .run(quote_id, async move {
                if let Some(existing) = inner.saved().get(&id) {
                    if existing.list_id == list_id {
                        return Ok(SaveState::Saved(existing.clone()));
                    }
                }
                let saved = match inner
                    .repo
                    .upsert_saved_quote(&inner.user_id, &id, list_id.as_deref())
                    .await
                {
                    Ok(saved) => saved,
                    Err(e) => {
                        inner.log_failure("save", &id, &e);
                        return Err(e);
                    }
                };
                inner.saved_mut().insert(id.clone(), saved.clone());
                tracing::info!(
                    user_id = %inner.user_id,
                    quote_id = %id,
                    list_id = ?saved.list_id,
                    "Quote saved"
                );
                Ok(SaveState::Saved(saved))
            })
            .await
    }

    /// Delete the save entirely, which also removes it from any list.
    pub async fn remove_bookmark(&self, quote_id: &str) -> Result<Settled<SaveState>, AppError> {
        let inner = Arc::clone(&self.inner);
        let id = quote_id.to_string();

        self.inner
            .saving
            .run(quote_id, async move {
                if !inner.saved().contains_key(&id) {
                    return Ok(SaveState::NotSaved);
                }
                if let Err(e) = inner.repo.delete_saved_quote(&inner.user_id, &id).await {
                    inner.log_failure("remove_bookmark", &id, &e);
                    return Err(e);
                }
                inner.saved_mut().remove(&id);
                tracing::info!(user_id = %inner.user_id, quote_id = %id, "Bookmark removed");
                Ok(SaveState::NotSaved)
            })
            .await
    }

    /// Record locally that a save was moved to Quick Save by a list deletion.
    pub(crate) fn demote_locally(&self, quote_id: &str) {
        if let Some(saved) = self.inner.saved_mut().get_mut(quote_id) {
            saved.list_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use std::time::Duration;

    fn engagement(db: &MemoryDb) -> Engagement {
        Engagement::new(Arc::new(db.clone()), "u1", vec![], vec![])
    }

    #[tokio::test]
    async fn test_like_twice_writes_once() {
        let db = MemoryDb::new();
        let engagement = engagement(&db);

        engagement.like("q1").await.unwrap();
        engagement.like("q1").await.unwrap();

        assert_eq!(db.write_attempts(), 1);
        assert_eq!(db.liked_quote_ids("u1").await.unwrap(), vec!["q1"]);
        assert!(engagement.is_liked("q1"));
    }

    #[tokio::test]
    async fn test_unlike_not_liked_is_noop() {
        let db = MemoryDb::new();
        let engagement = engagement(&db);

        let settled = engagement.unlike("q1").await.unwrap();

        assert!(!settled.value);
        assert_eq!(db.write_attempts(), 0);
    }

    #[tokio::test]
    async fn test_unlike_while_like_pending_joins() {
        let db = MemoryDb::new();
        db.set_write_latency(Some(Duration::from_millis(30)));
        let engagement = engagement(&db);

        let (like, unlike) = tokio::join!(engagement.like("q1"), engagement.unlike("q1"));

        let like = like.unwrap();
        let unlike = unlike.unwrap();
        assert!(like.value && !like.joined);
        assert!(unlike.value && unlike.joined);
        assert_eq!(db.write_attempts(), 1);
        assert!(engagement.is_liked("q1"));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_and_allows_retry() {
        let db = MemoryDb::new();
        let engagement = engagement(&db);

        db.set_fail_writes(true);
        assert!(engagement.like("q1").await.is_err());
        assert!(!engagement.is_liked("q1"));
        assert!(!engagement.is_like_pending("q1"));

        db.set_fail_writes(false);
        assert!(engagement.like("q1").await.unwrap().value);
        assert!(engagement.is_liked("q1"));
    }

    #[tokio::test]
    async fn test_save_then_move_then_remove() {
        let db = MemoryDb::new();
        let engagement = engagement(&db);

        engagement.save_to_list("q1", None).await.unwrap();
        let moved = engagement
            .save_to_list("q1", Some("l1".to_string()))
            .await
            .unwrap();
        match moved.value {
            SaveState::Saved(saved) => assert_eq!(saved.list_id.as_deref(), Some("l1")),
            SaveState::NotSaved => panic!("expected saved"),
        }
        assert_eq!(db.saved_quotes("u1").await.unwrap().len(), 1);

        let removed = engagement.remove_bookmark("q1").await.unwrap();
        assert_eq!(removed.value, SaveState::NotSaved);
        assert!(engagement.saved_quote("q1").is_none());
        assert!(db.saved_quotes("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_same_list_skips_write() {
        let db = MemoryDb::new();
        let engagement = engagement(&db);

        engagement.save_to_list("q1", None).await.unwrap();
        engagement.save_to_list("q1", None).await.unwrap();

        assert_eq!(db.write_attempts(), 1);
    }
}
