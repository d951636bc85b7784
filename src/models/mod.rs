// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.
//!
//! Persisted types mirror the Firestore documents (camelCase fields,
//! timestamps stored natively). Derived types never touch the store.

pub mod engagement;
pub mod feed;
pub mod figure;
pub mod quote;
pub mod suggestion;
pub mod user;

pub use engagement::{LikeRecord, QuoteList, SavedQuote};
pub use feed::{FeedItem, FeedKey};
pub use figure::{ExternalLink, Figure, FigureDraft, FigureKind};
pub use quote::{Quote, QuoteDraft, QuoteWithFigure};
pub use suggestion::{Suggestion, SuggestionDetails, SuggestionStatus};
pub use user::{Identity, ProfileUpdate, User};
