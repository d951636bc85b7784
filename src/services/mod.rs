// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod curation;
pub mod engagement;
pub mod enrich;
pub mod feed;
pub mod inflight;
pub mod onboarding;
pub mod organizer;
pub mod profile;
pub mod session;
pub mod shuffle;
pub mod suggestions;

pub use engagement::{Engagement, SaveState};
pub use feed::{Feed, LOOKAHEAD_MARGIN_PX};
pub use inflight::{InFlight, Settled};
pub use onboarding::Destination;
pub use organizer::{ListFilter, ListOrganizer, SavedQuoteView};
pub use session::{SessionRegistry, UserSession};
