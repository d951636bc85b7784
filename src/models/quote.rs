// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quotes and their display-ready composite with the owning figure.

use crate::models::Figure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `addedBy` value for quotes loaded by the seed script.
pub const SEED_AUTHOR: &str = "seed";

/// Quote document stored in the `quotes` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Document ID
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub id: String,
    /// Owning figure (not enforced by the store)
    pub figure_id: String,
    pub text: String,
    #[serde(default)]
    pub source_citation: String,
    /// Lowercase tags, absent when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// "seed" or the uid of the user who added it
    pub added_by: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Admin-editable fields of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteDraft {
    pub figure_id: String,
    pub text: String,
    #[serde(default)]
    pub source_citation: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Quote {
    /// Build a stored quote from a draft.
    pub fn from_draft(
        id: String,
        draft: &QuoteDraft,
        added_by: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            figure_id: draft.figure_id.clone(),
            text: draft.text.clone(),
            source_citation: draft.source_citation.clone(),
            tags: draft.tags.clone(),
            added_by: added_by.to_string(),
            created_at,
        }
    }
}

/// Trim, lowercase, drop empties and duplicates, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// A quote joined with its figure for display. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteWithFigure {
    pub quote: Quote,
    pub figure: Figure,
    /// Cosmetic relative time ("3h", "1d"). Not related to `created_at`.
    pub fake_timestamp: &'static str,
}

impl QuoteWithFigure {
    /// Text suitable for the share sheet or clipboard.
    pub fn share_text(&self) -> String {
        format_share_text(
            &self.figure.display_name,
            &self.quote.text,
            &self.quote.source_citation,
        )
    }
}

/// `"<text>"\n\n— <figure>, <citation>`
pub fn format_share_text(figure_name: &str, quote_text: &str, source_citation: &str) -> String {
    format!("\"{quote_text}\"\n\n— {figure_name}, {source_citation}")
}
