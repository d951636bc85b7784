// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-submitted suggestions for new figures or quotes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

/// What is being suggested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuggestionDetails {
    #[serde(rename_all = "camelCase")]
    Figure {
        figure_name: String,
        figure_description: String,
        figure_why: String,
    },
    #[serde(rename_all = "camelCase")]
    Quote {
        quote_figure: String,
        quote_text: String,
        quote_source: String,
    },
}

/// Suggestion document stored in the `suggestions` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(flatten)]
    pub details: SuggestionDetails,
    pub submitted_by: String,
    pub submitted_by_email: String,
    pub status: SuggestionStatus,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}
