// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding gate and initial follow selection.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{Figure, User};
use serde::Serialize;
use std::collections::HashSet;

/// Where a signed-in user is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Destination {
    Onboarding,
    Feed,
}

/// A user who follows nobody always goes to onboarding.
pub fn destination_for(user: &User) -> Destination {
    if user.needs_onboarding() {
        Destination::Onboarding
    } else {
        Destination::Feed
    }
}

/// Check an onboarding selection against the known figures.
///
/// Returns the de-duplicated IDs in selection order. At least one figure is
/// required and every ID must name an existing figure.
pub fn validate_selection(selected: &[String], figures: &[Figure]) -> Result<Vec<String>, AppError> {
    let known: HashSet<&str> = figures.iter().map(|f| f.id.as_str()).collect();

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(selected.len());
    for id in selected {
        let id = id.trim();
        if id.is_empty() || !seen.insert(id) {
            continue;
        }
        if !known.contains(id) {
            return Err(AppError::BadRequest(format!("Unknown figure: {}", id)));
        }
        ids.push(id.to_string());
    }

    if ids.is_empty() {
        return Err(AppError::BadRequest(
            "Select at least one figure to follow".to_string(),
        ));
    }
    Ok(ids)
}

/// Persist the selection as the user's complete follow set.
pub async fn complete_onboarding(
    repo: &dyn Repository,
    user_id: &str,
    selected: &[String],
) -> Result<Vec<String>, AppError> {
    let figures = repo.list_figures().await?;
    let following = validate_selection(selected, &figures)?;

    repo.set_following(user_id, &following).await?;

    tracing::info!(user_id, count = following.len(), "Onboarding completed");
    Ok(following)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::Identity;
    use crate::services::enrich::fixtures::figure;
    use chrono::Utc;

    fn user(following: &[&str]) -> User {
        let identity = Identity {
            uid: "u1".to_string(),
            email: None,
            display_name: None,
            photo_url: None,
        };
        let mut user = User::new_from_identity(&identity, Utc::now());
        user.following = following.iter().map(|s| s.to_string()).collect();
        user
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_destination_gate() {
        assert_eq!(destination_for(&user(&[])), Destination::Onboarding);
        assert_eq!(destination_for(&user(&["f1"])), Destination::Feed);
    }

    #[test]
    fn test_validate_selection() {
        let figures = vec![figure("f1"), figure("f2")];

        assert_eq!(
            validate_selection(&ids(&["f2", "f1", "f2"]), &figures).unwrap(),
            ids(&["f2", "f1"])
        );
        assert!(validate_selection(&[], &figures).is_err());
        assert!(validate_selection(&ids(&[" "]), &figures).is_err());
        assert!(validate_selection(&ids(&["f1", "nope"]), &figures).is_err());
    }

    #[tokio::test]
    async fn test_complete_onboarding_replaces_following() {
        let db = MemoryDb::new();
        db.seed_figure(figure("f1"));
        db.seed_figure(figure("f2"));
        db.seed_figure(figure("f3"));
        let mut existing = user(&["f3"]);
        existing.id = "u1".to_string();
        db.create_user(&existing).await.unwrap();

        complete_onboarding(&db, "u1", &ids(&["f1", "f2"]))
            .await
            .unwrap();

        let stored = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(stored.following, ids(&["f1", "f2"]));
    }

    #[tokio::test]
    async fn test_empty_selection_writes_nothing() {
        let db = MemoryDb::new();
        db.seed_figure(figure("f1"));

        let err = complete_onboarding(&db, "u1", &[]).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(db.write_attempts(), 0);
    }
}
