// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Figures: followable authors or texts that own quotes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a figure is a person or a scripture/text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureKind {
    Person,
    Text,
}

impl FigureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FigureKind::Person => "person",
            FigureKind::Text => "text",
        }
    }
}

/// A labelled outbound link shown on a figure profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExternalLink {
    pub label: String,
    pub url: String,
}

/// Figure document stored in the `figures` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Figure {
    /// Document ID
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub id: String,
    /// URL slug, unique, `[a-z0-9-]`
    pub handle: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: FigureKind,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_pic_url: String,
    /// Free-text category ("Christian", "Buddhist", ...)
    #[serde(default)]
    pub tradition: String,
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Admin-editable fields of a figure, used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureDraft {
    /// Empty means "derive from display name".
    #[serde(default)]
    pub handle: String,
    pub display_name: String,
    pub kind: FigureKind,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_pic_url: String,
    #[serde(default)]
    pub tradition: String,
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
}

impl Figure {
    /// Build a stored figure from a draft.
    pub fn from_draft(id: String, draft: &FigureDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            handle: draft.handle.clone(),
            display_name: draft.display_name.clone(),
            kind: draft.kind,
            bio: draft.bio.clone(),
            profile_pic_url: draft.profile_pic_url.clone(),
            tradition: draft.tradition.clone(),
            external_links: draft.external_links.clone(),
            created_at,
        }
    }
}

/// Whether a handle is non-empty and only uses `[a-z0-9-]`.
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Derive a URL slug from a display name ("Meister Eckhart" -> "meister-eckhart").
pub fn generate_handle(display_name: &str) -> String {
    let mut handle = String::with_capacity(display_name.len());
    for c in display_name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            handle.push(c);
        } else if (c == '-' || c.is_whitespace()) && !handle.ends_with('-') {
            handle.push('-');
        }
    }
    handle.trim_matches('-').to_string()
}
