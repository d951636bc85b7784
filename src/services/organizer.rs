// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-defined lists of saved quotes.
//!
//! A save belongs to at most one list; `None` is Quick Save. Deleting a
//! list never deletes saves: every save filed under it is moved to Quick
//! Save before the list itself is removed. Saves into a list and list
//! deletion are mutually exclusive, so a deletion's snapshot of filed saves
//! is never missing one that lands mid-deletion.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::engagement::MAX_LIST_NAME_CHARS;
use crate::models::{Quote, QuoteList, QuoteWithFigure, SavedQuote};
use crate::services::engagement::{Engagement, SaveState};
use crate::services::enrich::{enrich, FigureMap};
use crate::services::inflight::Settled;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::RwLock as AsyncRwLock;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Which saves to show in the bookmarks view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    QuickSave,
    List(String),
}

impl ListFilter {
    pub fn matches(&self, saved: &SavedQuote) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::QuickSave => saved.list_id.is_none(),
            ListFilter::List(id) => saved.list_id.as_deref() == Some(id.as_str()),
        }
    }
}

impl FromStr for ListFilter {
    type Err = std::convert::Infallible;

    /// `"all"` (or empty), `"quick"`, otherwise a list ID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "all" => ListFilter::All,
            "quick" => ListFilter::QuickSave,
            id => ListFilter::List(id.to_string()),
        })
    }
}

/// A save joined with its quote and figure.
#[derive(Debug, Clone)]
pub struct SavedQuoteView {
    pub saved: SavedQuote,
    pub quote: QuoteWithFigure,
}

/// Trimmed list name, or an error if empty or too long.
pub fn validate_list_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("List name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_LIST_NAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "List name must be at most {} characters",
            MAX_LIST_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// Lists of one user, kept in sync with that user's saves.
pub struct ListOrganizer {
    repo: Arc<dyn Repository>,
    engagement: Engagement,
    lists: RwLock<Vec<QuoteList>>,
    /// Held shared by saves into a list, exclusively by list deletion
    filing: AsyncRwLock<()>,
}

impl ListOrganizer {
    pub fn new(repo: Arc<dyn Repository>, engagement: Engagement, lists: Vec<QuoteList>) -> Self {
        Self {
            repo,
            engagement,
            lists: RwLock::new(lists),
            filing: AsyncRwLock::new(()),
        }
    }

    fn read_lists(&self) -> RwLockReadGuard<'_, Vec<QuoteList>> {
        self.lists.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lists(&self) -> RwLockWriteGuard<'_, Vec<QuoteList>> {
        self.lists.write().unwrap_or_else(|e| e.into_inner())
    }

    fn user_id(&self) -> &str {
        self.engagement.user_id()
    }

    /// Lists in creation order.
    pub fn lists(&self) -> Vec<QuoteList> {
        self.read_lists().clone()
    }

    pub fn has_list(&self, list_id: &str) -> bool {
        self.read_lists().iter().any(|l| l.id == list_id)
    }

    pub async fn create_list(&self, name: &str) -> Result<QuoteList, AppError> {
        let name = validate_list_name(name)?;
        let list = self.repo.create_list(self.user_id(), &name).await?;
        self.write_lists().push(list.clone());

        tracing::info!(user_id = %self.user_id(), list_id = %list.id, "List created");
        Ok(list)
    }

    /// Delete a list, moving its saves to Quick Save first.
    ///
    /// Returns how many saves were moved. If any move fails the list is kept,
    /// so no save is ever left pointing at a deleted list.
    pub async fn delete_list(&self, list_id: &str) -> Result<usize, AppError> {
        let _filing = self.filing.write().await;
        if !self.has_list(list_id) {
            return Err(AppError::NotFound(format!("List {}", list_id)));
        }

        let filed = self
            .repo
            .saved_quotes_in_list(self.user_id(), list_id)
            .await?;

        let repo = &self.repo;
        let user_id = self.user_id();
        let results: Vec<(String, Result<SavedQuote, AppError>)> = stream::iter(filed)
            .map(|saved| async move {
                let result = repo
                    .upsert_saved_quote(user_id, &saved.quote_id, None)
                    .await;
                (saved.quote_id, result)
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut demoted = 0;
        let mut first_error = None;
        for (quote_id, result) in results {
            match result {
                Ok(_) => {
                    self.engagement.demote_locally(&quote_id);
                    demoted += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        user_id,
                        list_id,
                        quote_id = %quote_id,
                        error = %e,
                        "Failed to move save to Quick Save"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        self.repo.delete_list(user_id, list_id).await?;
        self.write_lists().retain(|l| l.id != list_id);

        tracing::info!(user_id, list_id, demoted, "List deleted");
        Ok(demoted)
    }

    /// Save a quote into one of this user's lists (or Quick Save).
    ///
    /// A save into a list waits for any list deletion in progress and is
    /// rejected if that deletion removed its list.
    pub async fn save_to_list(
        &self,
        quote_id: &str,
        list_id: Option<String>,
    ) -> Result<Settled<SaveState>, AppError> {
        let Some(id) = &list_id else {
            return self.engagement.save_to_list(quote_id, None).await;
        };

        let _filing = self.filing.read().await;
        if !self.has_list(id) {
            return Err(AppError::NotFound(format!("List {}", id)));
        }
        self.engagement.save_to_list(quote_id, list_id).await
    }

    /// Saves matching the filter, newest first.
    pub fn saved_in(&self, filter: &ListFilter) -> Vec<SavedQuote> {
        self.engagement
            .saved_quotes()
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect()
    }

    /// Saves matching the filter joined with their quotes and figures.
    ///
    /// Saves whose quote or figure no longer exists are skipped.
    pub async fn saved_view(
        &self,
        filter: &ListFilter,
        figures: &FigureMap,
    ) -> Result<Vec<SavedQuoteView>, AppError> {
        let saved = self.saved_in(filter);
        let quote_ids: Vec<String> = saved.iter().map(|s| s.quote_id.clone()).collect();

        let fetched: Vec<Result<Option<Quote>, AppError>> = stream::iter(quote_ids)
            .map(|quote_id| {
                let repo = Arc::clone(&self.repo);
                async move { repo.get_quote(&quote_id).await }
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut quotes: HashMap<String, Quote> = HashMap::new();
        for quote in fetched {
            if let Some(quote) = quote? {
                quotes.insert(quote.id.clone(), quote);
            }
        }

        Ok(saved
            .into_iter()
            .filter_map(|s| {
                let quote = quotes.remove(&s.quote_id)?;
                let enriched = enrich(std::slice::from_ref(&quote), figures).pop()?;
                Some(SavedQuoteView {
                    saved: s,
                    quote: enriched,
                })
            })
            .collect())
    }
}
