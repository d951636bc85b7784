// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Join quotes with their figures for display.

use crate::models::{Figure, Quote, QuoteWithFigure};
use crate::services::shuffle::fake_timestamp;
use std::collections::HashMap;

/// Figure lookup table keyed by figure ID.
pub type FigureMap = HashMap<String, Figure>;

/// Index figures by ID.
pub fn figure_map(figures: &[Figure]) -> FigureMap {
    figures.iter().map(|f| (f.id.clone(), f.clone())).collect()
}

/// Join each quote with its figure, assigning a fresh fake timestamp.
///
/// Quotes whose figure is missing (e.g. deleted) are dropped silently.
pub fn enrich(quotes: &[Quote], figures: &FigureMap) -> Vec<QuoteWithFigure> {
    quotes
        .iter()
        .filter_map(|quote| {
            let figure = figures.get(&quote.figure_id)?;
            Some(QuoteWithFigure {
                quote: quote.clone(),
                figure: figure.clone(),
                fake_timestamp: fake_timestamp(),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Figure, FigureKind, Quote};
    use chrono::Utc;

    pub fn figure(id: &str) -> Figure {
        Figure {
            id: id.to_string(),
            handle: id.to_string(),
            display_name: format!("Figure {id}"),
            kind: FigureKind::Person,
            bio: String::new(),
            profile_pic_url: String::new(),
            tradition: "Test".to_string(),
            external_links: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn quote(id: &str, figure_id: &str) -> Quote {
        Quote {
            id: id.to_string(),
            figure_id: figure_id.to_string(),
            text: format!("Text of {id}"),
            source_citation: "1:1".to_string(),
            tags: vec![],
            added_by: "seed".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{figure, quote};
    use super::*;

    #[test]
    fn test_enrich_joins_on_figure_id() {
        let figures = figure_map(&[figure("f1"), figure("f2")]);
        let quotes = vec![quote("q1", "f1"), quote("q2", "f2")];

        let enriched = enrich(&quotes, &figures);

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].figure.id, "f1");
        assert_eq!(enriched[1].figure.id, "f2");
        assert_eq!(enriched[1].quote.id, "q2");
    }

    #[test]
    fn test_enrich_drops_orphaned_quotes() {
        let figures = figure_map(&[figure("f1")]);
        let quotes = vec![quote("q1", "f1"), quote("q2", "deleted")];

        let enriched = enrich(&quotes, &figures);

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].quote.id, "q1");
    }
}
