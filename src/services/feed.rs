// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Home feed batch generator.
//!
//! A small, finite quote set is turned into an endless feed by appending a
//! fresh shuffle of the same enriched set each time the reader nears the
//! end. Quotes repeat across batches; `FeedKey` keeps every appearance
//! distinct. Only the most recent `MAX_RETAINED_BATCHES` batches are held;
//! older ones have already been delivered to the client.

use crate::models::{FeedItem, FeedKey, Figure, Quote, QuoteWithFigure};
use crate::services::enrich::{enrich, figure_map};
use crate::services::shuffle::{fake_timestamp, shuffle};

/// Distance from the end of the feed, in pixels, at which the next batch
/// is generated.
pub const LOOKAHEAD_MARGIN_PX: u32 = 200;

/// Batches kept in memory per feed.
pub const MAX_RETAINED_BATCHES: usize = 5;

/// Feed state of one session.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    source: Vec<QuoteWithFigure>,
    items: Vec<FeedItem>,
    next_batch: u32,
}

impl Feed {
    /// Build the feed and generate batch 0, unless quotes or figures are empty.
    pub fn new(quotes: &[Quote], figures: &[Figure]) -> Self {
        let mut feed = Self::default();
        feed.set_source(quotes, figures);
        feed
    }

    /// Replace the underlying quote set and start over from batch 0.
    pub fn set_source(&mut self, quotes: &[Quote], figures: &[Figure]) {
        self.source = if quotes.is_empty() || figures.is_empty() {
            Vec::new()
        } else {
            enrich(quotes, &figure_map(figures))
        };
        self.refresh();
    }

    /// True when there is nothing to show; the client renders an empty state.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The retained batches, oldest first.
    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    /// Number of batches currently held in `items`.
    pub fn retained_batches(&self) -> usize {
        if self.source.is_empty() {
            0
        } else {
            self.items.len() / self.source.len()
        }
    }

    /// Number of batches generated so far.
    pub fn batches(&self) -> u32 {
        self.next_batch
    }

    /// Number of distinct quotes in one batch.
    pub fn batch_len(&self) -> usize {
        self.source.len()
    }

    /// Discard every appended batch and generate a new batch 0.
    pub fn refresh(&mut self) {
        self.items.clear();
        self.next_batch = 0;
        if !self.is_empty() {
            self.append_batch();
        }
    }

    /// Append one more shuffled batch and return it.
    pub fn load_more(&mut self) -> &[FeedItem] {
        if self.is_empty() {
            return &[];
        }
        let start = self.items.len();
        self.append_batch();
        &self.items[start..]
    }

    /// Report how far the end-of-feed sentinel is from the viewport.
    ///
    /// Loads a batch when within `LOOKAHEAD_MARGIN_PX`; returns the new items.
    pub fn on_sentinel(&mut self, distance_px: u32) -> &[FeedItem] {
        if distance_px > LOOKAHEAD_MARGIN_PX {
            return &[];
        }
        self.load_more()
    }

    fn append_batch(&mut self) {
        if self.retained_batches() >= MAX_RETAINED_BATCHES {
            self.items.drain(..self.source.len());
        }

        let batch = self.next_batch;
        self.items.extend(
            shuffle(&self.source)
                .into_iter()
                .enumerate()
                .map(|(position, quote)| FeedItem {
                    key: FeedKey::new(quote.quote.id.clone(), batch, position),
                    quote: QuoteWithFigure {
                        fake_timestamp: fake_timestamp(),
                        ..quote
                    },
                }),
        );
        self.next_batch += 1;

        tracing::debug!(batch, retained = self.items.len(), "Feed batch generated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::enrich::fixtures::{figure, quote};
    use std::collections::{HashMap, HashSet};

    fn sample() -> Feed {
        let figures = vec![figure("f1"), figure("f2")];
        let quotes = vec![
            quote("q1", "f1"),
            quote("q2", "f1"),
            quote("q3", "f2"),
            quote("q4", "f2"),
        ];
        Feed::new(&quotes, &figures)
    }

    #[test]
    fn test_initial_batch_is_permutation() {
        let feed = sample();

        let mut ids: Vec<&str> = feed.items().iter().map(|i| i.key.quote_id()).collect();
        ids.sort();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4"]);
        assert!(feed.items().iter().all(|i| i.key.batch() == 0));
        assert_eq!(feed.batches(), 1);
    }

    #[test]
    fn test_empty_source_renders_empty_state() {
        let no_quotes = Feed::new(&[], &[figure("f1")]);
        assert!(no_quotes.is_empty());
        assert!(no_quotes.items().is_empty());

        let mut no_figures = Feed::new(&[quote("q1", "f1")], &[]);
        assert!(no_figures.is_empty());
        assert!(no_figures.load_more().is_empty());
        assert_eq!(no_figures.batches(), 0);
    }

    #[test]
    fn test_load_more_appends_distinct_keys() {
        let mut feed = sample();

        let appended = feed.load_more().to_vec();
        feed.load_more();

        assert_eq!(appended.len(), 4);
        assert!(appended.iter().all(|i| i.key.batch() == 1));
        let positions: Vec<usize> = appended.iter().map(|i| i.key.position()).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);

        assert_eq!(feed.items().len(), 12);
        let keys: HashSet<String> = feed.items().iter().map(|i| i.key.to_string()).collect();
        assert_eq!(keys.len(), 12);

        let mut per_quote: HashMap<&str, usize> = HashMap::new();
        for item in feed.items() {
            assert_eq!(item.key.quote_id(), item.quote.quote.id);
            *per_quote.entry(item.key.quote_id()).or_default() += 1;
        }
        assert!(per_quote.values().all(|&n| n == 3));
    }

    #[test]
    fn test_refresh_resets_to_single_batch() {
        let mut feed = sample();
        feed.load_more();
        feed.load_more();

        feed.refresh();

        assert_eq!(feed.items().len(), 4);
        assert_eq!(feed.batches(), 1);
        assert!(feed.items().iter().all(|i| i.key.batch() == 0));
        assert_eq!(feed.load_more()[0].key.batch(), 1);
    }

    #[test]
    fn test_sentinel_respects_margin() {
        let mut feed = sample();

        assert!(feed.on_sentinel(LOOKAHEAD_MARGIN_PX + 1).is_empty());
        assert_eq!(feed.on_sentinel(LOOKAHEAD_MARGIN_PX).len(), 4);
        assert_eq!(feed.on_sentinel(0).len(), 4);
        assert_eq!(feed.batches(), 3);
    }

    #[test]
    fn test_retained_items_stay_bounded() {
        let figures = vec![figure("f1")];
        let quotes: Vec<Quote> = (0..50).map(|i| quote(&format!("q{i}"), "f1")).collect();
        let mut feed = Feed::new(&quotes, &figures);

        for _ in 0..2000 {
            feed.on_sentinel(0);
        }

        assert_eq!(feed.batches(), 2001);
        assert_eq!(feed.retained_batches(), MAX_RETAINED_BATCHES);
        assert_eq!(feed.items().len(), MAX_RETAINED_BATCHES * 50);
        let oldest = 2001 - MAX_RETAINED_BATCHES as u32;
        assert_eq!(feed.items()[0].key.batch(), oldest);
        assert_eq!(feed.items().last().unwrap().key.batch(), 2000);
    }

    #[test]
    fn test_each_batch_gets_fresh_timestamps() {
        let figures = vec![figure("f1")];
        let quotes: Vec<Quote> = (0..20).map(|i| quote(&format!("q{i}"), "f1")).collect();
        let mut feed = Feed::new(&quotes, &figures);
        feed.load_more();

        let stamps = |batch: u32| {
            feed.items()
                .iter()
                .filter(|i| i.key.batch() == batch)
                .map(|i| (i.key.quote_id(), i.quote.fake_timestamp))
                .collect::<HashMap<_, _>>()
        };
        let first = stamps(0);
        let second = stamps(1);

        // 20 independent draws agreeing everywhere is vanishingly unlikely
        assert!(first.iter().any(|(id, stamp)| second[id] != *stamp));
    }

    #[test]
    fn test_orphaned_quotes_are_not_shown() {
        let feed = Feed::new(&[quote("q1", "f1"), quote("q2", "gone")], &[figure("f1")]);

        assert_eq!(feed.batch_len(), 1);
        assert_eq!(feed.items()[0].key.quote_id(), "q1");
    }
}
