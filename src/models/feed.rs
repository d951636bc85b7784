// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed item identity.
//!
//! The same quote appears once per batch, so UI keys must distinguish
//! repeated appearances. The key is carried structurally; the quote ID is
//! always available without parsing.

use crate::models::QuoteWithFigure;
use std::fmt;

/// Position of one quote appearance in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    quote_id: String,
    batch: u32,
    position: usize,
}

impl FeedKey {
    pub fn new(quote_id: impl Into<String>, batch: u32, position: usize) -> Self {
        Self {
            quote_id: quote_id.into(),
            batch,
            position,
        }
    }

    /// The stored quote ID, for engagement operations.
    pub fn quote_id(&self) -> &str {
        &self.quote_id
    }

    pub fn batch(&self) -> u32 {
        self.batch
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for FeedKey {
    /// Batch 0 renders as the bare quote ID; later batches as `id-batchN-i`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.batch == 0 {
            write!(f, "{}", self.quote_id)
        } else {
            write!(f, "{}-batch{}-{}", self.quote_id, self.batch, self.position)
        }
    }
}

/// One rendered feed entry.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub key: FeedKey,
    pub quote: QuoteWithFigure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_key() {
        assert_eq!(FeedKey::new("q1", 0, 3).to_string(), "q1");
        assert_eq!(FeedKey::new("q1", 2, 7).to_string(), "q1-batch2-7");
    }

    #[test]
    fn test_quote_id_survives_hyphenated_ids() {
        let key = FeedKey::new("quote-batch-7", 4, 1);
        assert_eq!(key.to_string(), "quote-batch-7-batch4-1");
        assert_eq!(key.quote_id(), "quote-batch-7");
    }
}
