// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin curation of figures and quotes.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::figure::{generate_handle, is_valid_handle};
use crate::models::quote::normalize_tags;
use crate::models::{Figure, FigureDraft, Quote, QuoteDraft};
use std::collections::BTreeMap;

/// Normalize a figure draft and check its handle is free.
///
/// `current_id` is the figure being edited, which may keep its own handle.
async fn prepare_figure(
    repo: &dyn Repository,
    draft: &FigureDraft,
    current_id: Option<&str>,
) -> Result<FigureDraft, AppError> {
    let mut draft = draft.clone();
    draft.display_name = draft.display_name.trim().to_string();
    if draft.display_name.is_empty() {
        return Err(AppError::BadRequest("Display name is required".to_string()));
    }

    draft.handle = draft.handle.trim().to_lowercase();
    if draft.handle.is_empty() {
        draft.handle = generate_handle(&draft.display_name);
    }
    if !is_valid_handle(&draft.handle) {
        return Err(AppError::BadRequest(format!(
            "Invalid handle '{}': use lowercase letters, digits and hyphens",
            draft.handle
        )));
    }

    if let Some(existing) = repo.get_figure_by_handle(&draft.handle).await? {
        if current_id != Some(existing.id.as_str()) {
            return Err(AppError::Conflict(format!(
                "Handle '{}' is already taken",
                draft.handle
            )));
        }
    }

    draft.bio = draft.bio.trim().to_string();
    draft.tradition = draft.tradition.trim().to_string();
    draft.profile_pic_url = draft.profile_pic_url.trim().to_string();
    Ok(draft)
}

pub async fn create_figure(repo: &dyn Repository, draft: &FigureDraft) -> Result<Figure, AppError> {
    let draft = prepare_figure(repo, draft, None).await?;
    let figure = repo.create_figure(&draft).await?;

    tracing::info!(figure_id = %figure.id, handle = %figure.handle, "Figure created");
    Ok(figure)
}

pub async fn update_figure(
    repo: &dyn Repository,
    id: &str,
    draft: &FigureDraft,
) -> Result<Figure, AppError> {
    if repo.get_figure(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Figure {}", id)));
    }
    let draft = prepare_figure(repo, draft, Some(id)).await?;
    let figure = repo.update_figure(id, &draft).await?;

    tracing::info!(figure_id = %id, "Figure updated");
    Ok(figure)
}

/// Delete a figure, optionally with all of its quotes.
///
/// With `cascade` the quotes are deleted first and the figure only once
/// every quote batch has committed; a failed batch leaves the figure in
/// place. Returns the number of quotes deleted.
pub async fn delete_figure(repo: &dyn Repository, id: &str, cascade: bool) -> Result<usize, AppError> {
    if repo.get_figure(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Figure {}", id)));
    }

    let mut deleted_quotes = 0;
    if cascade {
        let quote_ids: Vec<String> = repo
            .quotes_by_figure(id)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();

        if !quote_ids.is_empty() {
            if let Err(e) = repo.delete_quotes(&quote_ids).await {
                tracing::error!(
                    figure_id = %id,
                    quotes = quote_ids.len(),
                    error = %e,
                    "Quote deletion failed, keeping figure"
                );
                return Err(e);
            }
        }
        deleted_quotes = quote_ids.len();
    }

    repo.delete_figure(id).await?;

    tracing::info!(figure_id = %id, cascade, deleted_quotes, "Figure deleted");
    Ok(deleted_quotes)
}

/// Validate a quote draft: the figure must exist and the text is required.
async fn prepare_quote(repo: &dyn Repository, draft: &QuoteDraft) -> Result<QuoteDraft, AppError> {
    let mut draft = draft.clone();
    draft.text = draft.text.trim().to_string();
    if draft.text.is_empty() {
        return Err(AppError::BadRequest("Quote text is required".to_string()));
    }
    if repo.get_figure(&draft.figure_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Unknown figure: {}",
            draft.figure_id
        )));
    }
    draft.source_citation = draft.source_citation.trim().to_string();
    draft.tags = normalize_tags(&draft.tags);
    Ok(draft)
}

pub async fn create_quote(
    repo: &dyn Repository,
    draft: &QuoteDraft,
    added_by: &str,
) -> Result<Quote, AppError> {
    let draft = prepare_quote(repo, draft).await?;
    let quote = repo.create_quote(&draft, added_by).await?;

    tracing::info!(quote_id = %quote.id, figure_id = %quote.figure_id, "Quote created");
    Ok(quote)
}

pub async fn update_quote(
    repo: &dyn Repository,
    id: &str,
    draft: &QuoteDraft,
) -> Result<Quote, AppError> {
    if repo.get_quote(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Quote {}", id)));
    }
    let draft = prepare_quote(repo, draft).await?;
    let quote = repo.update_quote(id, &draft).await?;

    tracing::info!(quote_id = %id, "Quote updated");
    Ok(quote)
}

pub async fn delete_quote(repo: &dyn Repository, id: &str) -> Result<(), AppError> {
    if repo.get_quote(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Quote {}", id)));
    }
    repo.delete_quote(id).await?;

    tracing::info!(quote_id = %id, "Quote deleted");
    Ok(())
}

/// Number of quotes per figure ID, for the admin dashboard.
pub async fn quote_counts(repo: &dyn Repository) -> Result<BTreeMap<String, usize>, AppError> {
    let mut counts = BTreeMap::new();
    for quote in repo.list_quotes().await? {
        *counts.entry(quote.figure_id).or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::FigureKind;
    use crate::services::enrich::fixtures::{figure, quote};

    fn draft(name: &str, handle: &str) -> FigureDraft {
        FigureDraft {
            handle: handle.to_string(),
            display_name: name.to_string(),
            kind: FigureKind::Person,
            bio: String::new(),
            profile_pic_url: String::new(),
            tradition: "Sufi".to_string(),
            external_links: vec![],
        }
    }

    fn quote_draft(figure_id: &str, tags: &[&str]) -> QuoteDraft {
        QuoteDraft {
            figure_id: figure_id.to_string(),
            text: " Be still ".to_string(),
            source_citation: "Psalm 46:10".to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_figure_generates_handle() {
        let db = MemoryDb::new();

        let figure = create_figure(&db, &draft(" Jalal ad-Din Rumi ", "")).await.unwrap();

        assert_eq!(figure.handle, "jalal-ad-din-rumi");
        assert_eq!(figure.display_name, "Jalal ad-Din Rumi");
    }

    #[tokio::test]
    async fn test_handle_rules() {
        let db = MemoryDb::new();
        let rumi = create_figure(&db, &draft("Rumi", "Rumi")).await.unwrap();
        assert_eq!(rumi.handle, "rumi");

        let err = create_figure(&db, &draft("Other", "rumi")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = create_figure(&db, &draft("Other", "no spaces")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // Keeping its own handle on edit is fine
        let edited = update_figure(&db, &rumi.id, &draft("Rumi (Mawlana)", "rumi"))
            .await
            .unwrap();
        assert_eq!(edited.display_name, "Rumi (Mawlana)");
        assert_eq!(edited.created_at, rumi.created_at);
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_quotes_then_figure() {
        let db = MemoryDb::new();
        let f9 = db.seed_figure(figure("f9"));
        db.seed_figure(figure("f1"));
        for i in 0..5 {
            db.seed_quote(quote(&format!("q{i}"), &f9.id));
        }
        db.seed_quote(quote("keep", "f1"));

        let deleted = delete_figure(&db, &f9.id, true).await.unwrap();

        assert_eq!(deleted, 5);
        assert!(db.get_figure("f9").await.unwrap().is_none());
        assert!(db.quotes_by_figure("f9").await.unwrap().is_empty());
        assert_eq!(db.list_quotes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cascade_failure_keeps_figure() {
        let db = MemoryDb::new();
        let f9 = db.seed_figure(figure("f9"));
        db.seed_quote(quote("q1", &f9.id));
        db.set_fail_writes(true);

        assert!(delete_figure(&db, &f9.id, true).await.is_err());

        assert!(db.get_figure("f9").await.unwrap().is_some());
        // Only the quote batch was attempted
        assert_eq!(db.write_attempts(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_cascade_leaves_quotes() {
        let db = MemoryDb::new();
        let f1 = db.seed_figure(figure("f1"));
        db.seed_quote(quote("q1", &f1.id));

        assert_eq!(delete_figure(&db, &f1.id, false).await.unwrap(), 0);
        assert_eq!(db.list_quotes().await.unwrap().len(), 1);

        let err = delete_figure(&db, &f1.id, false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_quote_validation_and_counts() {
        let db = MemoryDb::new();
        db.seed_figure(figure("f1"));

        let err = create_quote(&db, &quote_draft("nope", &[]), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let q = create_quote(&db, &quote_draft("f1", &["Peace", " peace", ""]), "admin")
            .await
            .unwrap();
        assert_eq!(q.text, "Be still");
        assert_eq!(q.tags, vec!["peace"]);
        assert_eq!(q.added_by, "admin");

        create_quote(&db, &quote_draft("f1", &[]), "admin").await.unwrap();
        let counts = quote_counts(&db).await.unwrap();
        assert_eq!(counts.get("f1"), Some(&2));
    }
}
