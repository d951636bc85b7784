// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user engagement documents: likes, saved quotes and lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest allowed list name, in characters.
pub const MAX_LIST_NAME_CHARS: usize = 50;

/// Saved quote stored at `users/{uid}/savedQuotes/{quoteId}`.
///
/// Keying by quote ID allows at most one save per (user, quote).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuote {
    pub quote_id: String,
    /// `None` is Quick Save (saved, not filed in a list)
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub saved_at: DateTime<Utc>,
}

/// User-defined list stored at `users/{uid}/lists/{listId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteList {
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub id: String,
    pub name: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Like marker stored at `users/{uid}/likes/{quoteId}`; existence means liked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRecord {
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub quote_id: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub liked_at: DateTime<Utc>,
}
