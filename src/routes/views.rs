// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response types shared by several route modules.

use crate::models::{
    ExternalLink, FeedItem, Figure, QuoteList, QuoteWithFigure, SavedQuote, User,
};
use crate::services::onboarding::{destination_for, Destination};
use crate::services::Engagement;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// RFC3339 in UTC with millisecond precision, as every response renders
/// stored timestamps.
pub fn api_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ─── Figures ─────────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FigureResponse {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    /// "person" or "text"
    pub kind: String,
    pub bio: String,
    pub profile_pic_url: String,
    pub tradition: String,
    pub external_links: Vec<ExternalLink>,
    pub created_at: String,
}

impl From<&Figure> for FigureResponse {
    fn from(figure: &Figure) -> Self {
        Self {
            id: figure.id.clone(),
            handle: figure.handle.clone(),
            display_name: figure.display_name.clone(),
            kind: figure.kind.as_str().to_string(),
            bio: figure.bio.clone(),
            profile_pic_url: figure.profile_pic_url.clone(),
            tradition: figure.tradition.clone(),
            external_links: figure.external_links.clone(),
            created_at: api_timestamp(figure.created_at),
        }
    }
}

/// The part of a figure shown next to each quote.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FigureSummary {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    pub kind: String,
    pub profile_pic_url: String,
}

impl From<&Figure> for FigureSummary {
    fn from(figure: &Figure) -> Self {
        Self {
            id: figure.id.clone(),
            handle: figure.handle.clone(),
            display_name: figure.display_name.clone(),
            kind: figure.kind.as_str().to_string(),
            profile_pic_url: figure.profile_pic_url.clone(),
        }
    }
}

// ─── Quotes ──────────────────────────────────────────────────

/// A quote as rendered in the feed, profiles and the saved view.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct QuoteResponse {
    pub id: String,
    pub text: String,
    pub source_citation: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub figure: FigureSummary,
    /// Cosmetic relative time ("3h")
    pub fake_timestamp: String,
    pub liked: bool,
    pub saved: bool,
    /// List the save is filed under; `None` with `saved` is Quick Save
    pub list_id: Option<String>,
    pub share_text: String,
}

impl QuoteResponse {
    pub fn new(quote: &QuoteWithFigure, engagement: &Engagement) -> Self {
        let saved = engagement.saved_quote(&quote.quote.id);
        Self {
            id: quote.quote.id.clone(),
            text: quote.quote.text.clone(),
            source_citation: quote.quote.source_citation.clone(),
            tags: quote.quote.tags.clone(),
            created_at: api_timestamp(quote.quote.created_at),
            figure: FigureSummary::from(&quote.figure),
            fake_timestamp: quote.fake_timestamp.to_string(),
            liked: engagement.is_liked(&quote.quote.id),
            saved: saved.is_some(),
            list_id: saved.and_then(|s| s.list_id),
            share_text: quote.share_text(),
        }
    }
}

/// One appearance of a quote in the feed.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedItemResponse {
    /// Unique per appearance; use only as a rendering key
    pub key: String,
    /// Stored quote ID, for engagement calls
    pub quote_id: String,
    pub batch: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub position: usize,
    pub quote: QuoteResponse,
}

impl FeedItemResponse {
    pub fn new(item: &FeedItem, engagement: &Engagement) -> Self {
        Self {
            key: item.key.to_string(),
            quote_id: item.key.quote_id().to_string(),
            batch: item.key.batch(),
            position: item.key.position(),
            quote: QuoteResponse::new(&item.quote, engagement),
        }
    }
}

// ─── Engagement ──────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavedQuoteResponse {
    pub quote_id: String,
    pub list_id: Option<String>,
    pub saved_at: String,
}

impl From<&SavedQuote> for SavedQuoteResponse {
    fn from(saved: &SavedQuote) -> Self {
        Self {
            quote_id: saved.quote_id.clone(),
            list_id: saved.list_id.clone(),
            saved_at: api_timestamp(saved.saved_at),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ListResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
    /// Saves currently filed under this list
    pub count: u32,
}

impl ListResponse {
    pub fn new(list: &QuoteList, count: usize) -> Self {
        Self {
            id: list.id.clone(),
            name: list.name.clone(),
            created_at: api_timestamp(list.created_at),
            count: count as u32,
        }
    }
}

// ─── Users ───────────────────────────────────────────────────

/// Current user response.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub bio: String,
    pub profile_pic_url: String,
    pub following: Vec<String>,
    pub has_seen_tutorial: bool,
    pub created_at: String,
    /// Where the client should route this user
    pub destination: Destination,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            profile_pic_url: user.profile_pic_url.clone(),
            following: user.following.clone(),
            has_seen_tutorial: user.has_seen_tutorial,
            created_at: api_timestamp(user.created_at),
            destination: destination_for(user),
        }
    }
}
