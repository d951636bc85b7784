// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, profile edits and single-figure follow changes.
//!
//! Profile fields are edited read-modify-write on the user document; the
//! store's single-document atomicity is the only guarantee.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{Identity, ProfileUpdate, User};
use chrono::Utc;

pub const MAX_DISPLAY_NAME_CHARS: usize = 50;
pub const MAX_BIO_CHARS: usize = 160;

/// Load the user for an identity, creating the profile on first sign-in.
///
/// Returns the user and whether it was just created.
pub async fn sign_in(repo: &dyn Repository, identity: &Identity) -> Result<(User, bool), AppError> {
    if let Some(user) = repo.get_user(&identity.uid).await? {
        return Ok((user, false));
    }

    let user = User::new_from_identity(identity, Utc::now());
    match repo.create_user(&user).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "User profile created");
            Ok((user, true))
        }
        // Another request for the same uid created it first
        Err(AppError::Conflict(_)) => {
            let user = load_user(repo, &identity.uid).await?;
            Ok((user, false))
        }
        Err(e) => Err(e),
    }
}

/// Fetch a user that must exist.
pub async fn load_user(repo: &dyn Repository, user_id: &str) -> Result<User, AppError> {
    repo.get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
}

/// Trim and length-check the edited fields.
pub fn validate_profile_update(update: &ProfileUpdate) -> Result<ProfileUpdate, AppError> {
    let display_name = match &update.display_name {
        Some(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::BadRequest(
                    "Display name must not be empty".to_string(),
                ));
            }
            if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
                return Err(AppError::BadRequest(format!(
                    "Display name must be at most {} characters",
                    MAX_DISPLAY_NAME_CHARS
                )));
            }
            Some(name.to_string())
        }
        None => None,
    };

    let bio = match &update.bio {
        Some(bio) => {
            let bio = bio.trim();
            if bio.chars().count() > MAX_BIO_CHARS {
                return Err(AppError::BadRequest(format!(
                    "Bio must be at most {} characters",
                    MAX_BIO_CHARS
                )));
            }
            Some(bio.to_string())
        }
        None => None,
    };

    Ok(ProfileUpdate {
        display_name,
        bio,
        profile_pic_url: update.profile_pic_url.as_ref().map(|u| u.trim().to_string()),
    })
}

pub async fn update_profile(
    repo: &dyn Repository,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<User, AppError> {
    let update = validate_profile_update(update)?;
    let mut user = load_user(repo, user_id).await?;

    update.apply_to(&mut user);
    repo.upsert_user(&user).await?;

    tracing::info!(user_id, "Profile updated");
    Ok(user)
}

pub async fn mark_tutorial_seen(repo: &dyn Repository, user_id: &str) -> Result<User, AppError> {
    let mut user = load_user(repo, user_id).await?;
    if !user.has_seen_tutorial {
        user.has_seen_tutorial = true;
        repo.upsert_user(&user).await?;
    }
    Ok(user)
}

/// Add one figure to the follow set. Returns the new follow set.
pub async fn follow(
    repo: &dyn Repository,
    user_id: &str,
    figure_id: &str,
) -> Result<Vec<String>, AppError> {
    if repo.get_figure(figure_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Figure {}", figure_id)));
    }

    let mut following = load_user(repo, user_id).await?.following;
    if following.iter().any(|id| id == figure_id) {
        return Ok(following);
    }
    following.push(figure_id.to_string());
    repo.set_following(user_id, &following).await?;

    tracing::info!(user_id, figure_id, "Figure followed");
    Ok(following)
}

/// Remove one figure from the follow set. Returns the new follow set.
pub async fn unfollow(
    repo: &dyn Repository,
    user_id: &str,
    figure_id: &str,
) -> Result<Vec<String>, AppError> {
    let mut following = load_user(repo, user_id).await?.following;
    let before = following.len();
    following.retain(|id| id != figure_id);
    if following.len() == before {
        return Ok(following);
    }
    repo.set_following(user_id, &following).await?;

    tracing::info!(user_id, figure_id, "Figure unfollowed");
    Ok(following)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::services::enrich::fixtures::figure;

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
            display_name: None,
            photo_url: Some("https://example.com/me.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_in_creates_once() {
        let db = MemoryDb::new();

        let (created, is_new) = sign_in(&db, &identity("u1")).await.unwrap();
        assert!(is_new);
        assert_eq!(created.display_name, "Anonymous");
        assert!(created.following.is_empty());

        let (again, is_new) = sign_in(&db, &identity("u1")).await.unwrap();
        assert!(!is_new);
        assert_eq!(again, created);
        assert_eq!(db.write_attempts(), 1);
    }

    #[tokio::test]
    async fn test_update_profile_validates_lengths() {
        let db = MemoryDb::new();
        sign_in(&db, &identity("u1")).await.unwrap();

        let too_long = ProfileUpdate {
            bio: Some("x".repeat(MAX_BIO_CHARS + 1)),
            ..Default::default()
        };
        assert!(update_profile(&db, "u1", &too_long).await.is_err());

        let update = ProfileUpdate {
            display_name: Some("  Ada  ".to_string()),
            bio: Some("Reader".to_string()),
            ..Default::default()
        };
        let user = update_profile(&db, "u1", &update).await.unwrap();
        assert_eq!(user.display_name, "Ada");
        assert_eq!(user.bio, "Reader");
        assert_eq!(user.profile_pic_url, "https://example.com/me.png");
    }

    #[tokio::test]
    async fn test_follow_and_unfollow() {
        let db = MemoryDb::new();
        db.seed_figure(figure("f1"));
        db.seed_figure(figure("f2"));
        sign_in(&db, &identity("u1")).await.unwrap();

        follow(&db, "u1", "f1").await.unwrap();
        let following = follow(&db, "u1", "f2").await.unwrap();
        assert_eq!(following, vec!["f1", "f2"]);

        // Already followed: no write
        let writes = db.write_attempts();
        follow(&db, "u1", "f1").await.unwrap();
        assert_eq!(db.write_attempts(), writes);

        let following = unfollow(&db, "u1", "f1").await.unwrap();
        assert_eq!(following, vec!["f2"]);

        let err = follow(&db, "u1", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_tutorial_seen() {
        let db = MemoryDb::new();
        sign_in(&db, &identity("u1")).await.unwrap();

        assert!(mark_tutorial_seen(&db, "u1").await.unwrap().has_seen_tutorial);
        assert!(load_user(&db, "u1").await.unwrap().has_seen_tutorial);
    }
}
