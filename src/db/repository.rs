// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repository trait - every document-store side effect goes through here.

use crate::error::AppError;
use crate::models::{
    Figure, FigureDraft, Quote, QuoteDraft, QuoteList, SavedQuote, Suggestion, User,
};
use async_trait::async_trait;

/// Firestore caps the operand count of an `in` filter at 30.
pub const IN_QUERY_LIMIT: usize = 30;

/// Split IDs into chunks small enough for one membership query.
pub fn chunk_ids(ids: &[String]) -> impl Iterator<Item = &[String]> {
    ids.chunks(IN_QUERY_LIMIT)
}

/// Typed operations over the document store.
///
/// Implementations decode every document into its schema type and report a
/// mismatch as `AppError::Database`.
#[async_trait]
pub trait Repository: Send + Sync {
    // ─── Figures ─────────────────────────────────────────────────

    async fn list_figures(&self) -> Result<Vec<Figure>, AppError>;

    async fn get_figure(&self, id: &str) -> Result<Option<Figure>, AppError>;

    async fn get_figure_by_handle(&self, handle: &str) -> Result<Option<Figure>, AppError>;

    /// Create a figure with a generated ID.
    async fn create_figure(&self, draft: &FigureDraft) -> Result<Figure, AppError>;

    /// Replace the editable fields; `created_at` is preserved.
    async fn update_figure(&self, id: &str, draft: &FigureDraft) -> Result<Figure, AppError>;

    async fn delete_figure(&self, id: &str) -> Result<(), AppError>;

    // ─── Quotes ──────────────────────────────────────────────────

    async fn list_quotes(&self) -> Result<Vec<Quote>, AppError>;

    async fn get_quote(&self, id: &str) -> Result<Option<Quote>, AppError>;

    async fn quotes_by_figure(&self, figure_id: &str) -> Result<Vec<Quote>, AppError>;

    /// Quotes owned by any of the given figures.
    ///
    /// Queried in chunks of `IN_QUERY_LIMIT` and concatenated without
    /// de-duplication; callers pass de-duplicated IDs.
    async fn quotes_for_figures(&self, figure_ids: &[String]) -> Result<Vec<Quote>, AppError>;

    async fn create_quote(&self, draft: &QuoteDraft, added_by: &str) -> Result<Quote, AppError>;

    async fn update_quote(&self, id: &str, draft: &QuoteDraft) -> Result<Quote, AppError>;

    async fn delete_quote(&self, id: &str) -> Result<(), AppError>;

    /// Delete quotes in committed batches. Returns once every batch committed.
    async fn delete_quotes(&self, ids: &[String]) -> Result<(), AppError>;

    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError>;

    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    /// Overwrite the stored user document.
    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    /// Replace the whole follow set.
    async fn set_following(&self, uid: &str, figure_ids: &[String]) -> Result<(), AppError>;

    // ─── Likes ───────────────────────────────────────────────────

    async fn liked_quote_ids(&self, uid: &str) -> Result<Vec<String>, AppError>;

    async fn add_like(&self, uid: &str, quote_id: &str) -> Result<(), AppError>;

    async fn remove_like(&self, uid: &str, quote_id: &str) -> Result<(), AppError>;

    // ─── Saved Quotes ────────────────────────────────────────────

    async fn saved_quotes(&self, uid: &str) -> Result<Vec<SavedQuote>, AppError>;

    /// Saves filed under the given list.
    async fn saved_quotes_in_list(
        &self,
        uid: &str,
        list_id: &str,
    ) -> Result<Vec<SavedQuote>, AppError>;

    /// Create the save if absent, otherwise move it to `list_id`.
    async fn upsert_saved_quote(
        &self,
        uid: &str,
        quote_id: &str,
        list_id: Option<&str>,
    ) -> Result<SavedQuote, AppError>;

    async fn delete_saved_quote(&self, uid: &str, quote_id: &str) -> Result<(), AppError>;

    // ─── Lists ───────────────────────────────────────────────────

    async fn lists(&self, uid: &str) -> Result<Vec<QuoteList>, AppError>;

    async fn create_list(&self, uid: &str, name: &str) -> Result<QuoteList, AppError>;

    async fn delete_list(&self, uid: &str, list_id: &str) -> Result<(), AppError>;

    // ─── Suggestions ─────────────────────────────────────────────

    /// Store a suggestion and return its generated ID.
    async fn create_suggestion(&self, suggestion: &Suggestion) -> Result<String, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_ids_respects_in_limit() {
        let ids: Vec<String> = (0..65).map(|i| format!("f{i}")).collect();
        let chunks: Vec<&[String]> = chunk_ids(&ids).collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 30);
        assert_eq!(chunks[2].len(), 5);
        assert_eq!(chunks.concat(), ids);
    }

    #[test]
    fn test_chunk_ids_empty() {
        assert_eq!(chunk_ids(&[]).count(), 0);
    }
}
