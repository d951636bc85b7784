// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore layout (top-level collections plus per-user
//! subcollections) with per-document atomicity only. Used for local
//! development (`STORAGE=memory`) and by the test suite, which can slow
//! down or fail writes and count how many reached the store.

use crate::db::repository::Repository;
use crate::error::AppError;
use crate::models::{
    Figure, FigureDraft, Quote, QuoteDraft, QuoteList, SavedQuote, Suggestion, User,
};
use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Length of generated document IDs (same as Firestore auto-IDs).
const GENERATED_ID_LEN: usize = 20;

#[derive(Default)]
struct MemoryState {
    figures: BTreeMap<String, Figure>,
    quotes: BTreeMap<String, Quote>,
    users: HashMap<String, User>,
    likes: HashMap<String, BTreeSet<String>>,
    saved: HashMap<String, BTreeMap<String, SavedQuote>>,
    lists: HashMap<String, Vec<QuoteList>>,
    suggestions: Vec<(String, Suggestion)>,
}

#[derive(Default)]
struct MemoryInner {
    state: RwLock<MemoryState>,
    write_attempts: AtomicUsize,
    fail_writes: AtomicBool,
    write_latency: Mutex<Option<Duration>>,
}

/// In-memory `Repository`. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<MemoryInner>,
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Test Controls ───────────────────────────────────────────

    /// Make every subsequent write fail with `AppError::Database`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every subsequent write, simulating a slow network round trip.
    pub fn set_write_latency(&self, latency: Option<Duration>) {
        *self
            .inner
            .write_latency
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Number of write requests that reached the store, failed or not.
    pub fn write_attempts(&self) -> usize {
        self.inner.write_attempts.load(Ordering::SeqCst)
    }

    // ─── Seeding (no write accounting) ───────────────────────────

    /// Insert a figure as-is, generating an ID when empty.
    pub fn seed_figure(&self, mut figure: Figure) -> Figure {
        if figure.id.is_empty() {
            figure.id = generate_id();
        }
        self.write_state()
            .figures
            .insert(figure.id.clone(), figure.clone());
        figure
    }

    /// Insert a quote as-is, generating an ID when empty.
    pub fn seed_quote(&self, mut quote: Quote) -> Quote {
        if quote.id.is_empty() {
            quote.id = generate_id();
        }
        self.write_state()
            .quotes
            .insert(quote.id.clone(), quote.clone());
        quote
    }

    /// Suggestions stored so far, in submission order.
    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.read_state()
            .suggestions
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }

    // ─── Internals ───────────────────────────────────────────────

    fn read_state(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.inner.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.inner.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Account for one write round trip; errors when writes are failing.
    async fn begin_write(&self, op: &'static str) -> Result<(), AppError> {
        self.inner.write_attempts.fetch_add(1, Ordering::SeqCst);

        let latency = *self
            .inner
            .write_latency
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.inner.fail_writes.load(Ordering::SeqCst) {
            tracing::debug!(op, "Injected write failure");
            return Err(AppError::Database(format!("{} failed (injected)", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryDb {
    // ─── Figures ─────────────────────────────────────────────────

    async fn list_figures(&self) -> Result<Vec<Figure>, AppError> {
        Ok(self.read_state().figures.values().cloned().collect())
    }

    async fn get_figure(&self, id: &str) -> Result<Option<Figure>, AppError> {
        Ok(self.read_state().figures.get(id).cloned())
    }

    async fn get_figure_by_handle(&self, handle: &str) -> Result<Option<Figure>, AppError> {
        Ok(self
            .read_state()
            .figures
            .values()
            .find(|f| f.handle == handle)
            .cloned())
    }

    async fn create_figure(&self, draft: &FigureDraft) -> Result<Figure, AppError> {
        self.begin_write("create_figure").await?;
        let figure = Figure::from_draft(generate_id(), draft, Utc::now());
        self.write_state()
            .figures
            .insert(figure.id.clone(), figure.clone());
        Ok(figure)
    }

    async fn update_figure(&self, id: &str, draft: &FigureDraft) -> Result<Figure, AppError> {
        self.begin_write("update_figure").await?;
        let mut state = self.write_state();
        let existing = state
            .figures
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Figure {}", id)))?;
        *existing = Figure::from_draft(id.to_string(), draft, existing.created_at);
        Ok(existing.clone())
    }

    async fn delete_figure(&self, id: &str) -> Result<(), AppError> {
        self.begin_write("delete_figure").await?;
        self.write_state().figures.remove(id);
        Ok(())
    }

    // ─── Quotes ──────────────────────────────────────────────────

    async fn list_quotes(&self) -> Result<Vec<Quote>, AppError> {
        Ok(self.read_state().quotes.values().cloned().collect())
    }

    async fn get_quote(&self, id: &str) -> Result<Option<Quote>, AppError> {
        Ok(self.read_state().quotes.get(id).cloned())
    }

    async fn quotes_by_figure(&self, figure_id: &str) -> Result<Vec<Quote>, AppError> {
        Ok(self
            .read_state()
            .quotes
            .values()
            .filter(|q| q.figure_id == figure_id)
            .cloned()
            .collect())
    }

    async fn quotes_for_figures(&self, figure_ids: &[String]) -> Result<Vec<Quote>, AppError> {
        let state = self.read_state();
        let mut quotes = Vec::new();
        for chunk in crate::db::chunk_ids(figure_ids) {
            quotes.extend(
                state
                    .quotes
                    .values()
                    .filter(|q| chunk.contains(&q.figure_id))
                    .cloned(),
            );
        }
        Ok(quotes)
    }

    async fn create_quote(&self, draft: &QuoteDraft, added_by: &str) -> Result<Quote, AppError> {
        self.begin_write("create_quote").await?;
        let quote = Quote::from_draft(generate_id(), draft, added_by, Utc::now());
        self.write_state()
            .quotes
            .insert(quote.id.clone(), quote.clone());
        Ok(quote)
    }

    async fn update_quote(&self, id: &str, draft: &QuoteDraft) -> Result<Quote, AppError> {
        self.begin_write("update_quote").await?;
        let mut state = self.write_state();
        let existing = state
            .quotes
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Quote {}", id)))?;
        *existing = Quote::from_draft(
            id.to_string(),
            draft,
            &existing.added_by,
            existing.created_at,
        );
        Ok(existing.clone())
    }

    async fn delete_quote(&self, id: &str) -> Result<(), AppError> {
        self.begin_write("delete_quote").await?;
        self.write_state().quotes.remove(id);
        Ok(())
    }

    async fn delete_quotes(&self, ids: &[String]) -> Result<(), AppError> {
        self.begin_write("delete_quotes").await?;
        let mut state = self.write_state();
        for id in ids {
            state.quotes.remove(id);
        }
        Ok(())
    }

    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        Ok(self.read_state().users.get(uid).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.begin_write("create_user").await?;
        let mut state = self.write_state();
        if state.users.contains_key(&user.id) {
            return Err(AppError::Conflict(format!("User {} already exists", user.id)));
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.begin_write("upsert_user").await?;
        self.write_state()
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn set_following(&self, uid: &str, figure_ids: &[String]) -> Result<(), AppError> {
        self.begin_write("set_following").await?;
        let mut state = self.write_state();
        let user = state
            .users
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("User {}", uid)))?;
        user.following = figure_ids.to_vec();
        Ok(())
    }

    // ─── Likes ───────────────────────────────────────────────────

    async fn liked_quote_ids(&self, uid: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .read_state()
            .likes
            .get(uid)
            .map(|likes| likes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_like(&self, uid: &str, quote_id: &str) -> Result<(), AppError> {
        self.begin_write("add_like").await?;
        self.write_state()
            .likes
            .entry(uid.to_string())
            .or_default()
            .insert(quote_id.to_string());
        Ok(())
    }

    async fn remove_like(&self, uid: &str, quote_id: &str) -> Result<(), AppError> {
        self.begin_write("remove_like").await?;
        if let Some(likes) = self.write_state().likes.get_mut(uid) {
            likes.remove(quote_id);
        }
        Ok(())
    }

    // ─── Saved Quotes ────────────────────────────────────────────

    async fn saved_quotes(&self, uid: &str) -> Result<Vec<SavedQuote>, AppError> {
        Ok(self
            .read_state()
            .saved
            .get(uid)
            .map(|saved| saved.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn saved_quotes_in_list(
        &self,
        uid: &str,
        list_id: &str,
    ) -> Result<Vec<SavedQuote>, AppError> {
        Ok(self
            .read_state()
            .saved
            .get(uid)
            .map(|saved| {
                saved
                    .values()
                    .filter(|s| s.list_id.as_deref() == Some(list_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert_saved_quote(
        &self,
        uid: &str,
        quote_id: &str,
        list_id: Option<&str>,
    ) -> Result<SavedQuote, AppError> {
        self.begin_write("upsert_saved_quote").await?;
        let mut state = self.write_state();
        let saved = state
            .saved
            .entry(uid.to_string())
            .or_default()
            .entry(quote_id.to_string())
            .and_modify(|s| s.list_id = list_id.map(str::to_string))
            .or_insert_with(|| SavedQuote {
                quote_id: quote_id.to_string(),
                list_id: list_id.map(str::to_string),
                saved_at: Utc::now(),
            });
        Ok(saved.clone())
    }

    async fn delete_saved_quote(&self, uid: &str, quote_id: &str) -> Result<(), AppError> {
        self.begin_write("delete_saved_quote").await?;
        if let Some(saved) = self.write_state().saved.get_mut(uid) {
            saved.remove(quote_id);
        }
        Ok(())
    }

    // ─── Lists ───────────────────────────────────────────────────

    async fn lists(&self, uid: &str) -> Result<Vec<QuoteList>, AppError> {
        Ok(self
            .read_state()
            .lists
            .get(uid)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_list(&self, uid: &str, name: &str) -> Result<QuoteList, AppError> {
        self.begin_write("create_list").await?;
        let list = QuoteList {
            id: generate_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.write_state()
            .lists
            .entry(uid.to_string())
            .or_default()
            .push(list.clone());
        Ok(list)
    }

    async fn delete_list(&self, uid: &str, list_id: &str) -> Result<(), AppError> {
        self.begin_write("delete_list").await?;
        if let Some(lists) = self.write_state().lists.get_mut(uid) {
            lists.retain(|l| l.id != list_id);
        }
        Ok(())
    }

    // ─── Suggestions ─────────────────────────────────────────────

    async fn create_suggestion(&self, suggestion: &Suggestion) -> Result<String, AppError> {
        self.begin_write("create_suggestion").await?;
        let id = generate_id();
        self.write_state()
            .suggestions
            .push((id.clone(), suggestion.clone()));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_saved_quote_upsert_keeps_one_record_per_quote() {
        let db = MemoryDb::new();

        let first = db.upsert_saved_quote("u1", "q1", None).await.unwrap();
        let moved = db.upsert_saved_quote("u1", "q1", Some("l1")).await.unwrap();

        assert_eq!(moved.list_id.as_deref(), Some("l1"));
        assert_eq!(moved.saved_at, first.saved_at);
        assert_eq!(db.saved_quotes("u1").await.unwrap().len(), 1);
        assert_eq!(db.saved_quotes_in_list("u1", "l1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_still_counts_attempt() {
        let db = MemoryDb::new();
        db.set_fail_writes(true);

        let err = db.add_like("u1", "q1").await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(db.write_attempts(), 1);
        assert!(db.liked_quote_ids("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let db = MemoryDb::new();
        let a = db.create_list("u1", "Morning").await.unwrap();
        let b = db.create_list("u1", "Evening").await.unwrap();

        assert_eq!(a.id.len(), GENERATED_ID_LEN);
        assert_ne!(a.id, b.id);
        assert_eq!(db.lists("u1").await.unwrap(), vec![a, b]);
    }
}
