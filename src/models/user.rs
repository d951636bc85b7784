//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Auth provider uid (also used as document ID)
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_pic_url: String,
    /// Followed figure IDs; order irrelevant
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub has_seen_tutorial: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Profile created on first sign-in.
    pub fn new_from_identity(identity: &Identity, created_at: DateTime<Utc>) -> Self {
        Self {
            id: identity.uid.clone(),
            email: identity.email.clone().unwrap_or_default(),
            display_name: identity
                .display_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            bio: String::new(),
            profile_pic_url: identity.photo_url.clone().unwrap_or_default(),
            following: Vec::new(),
            has_seen_tutorial: false,
            created_at,
        }
    }

    /// Users who follow nobody must go through onboarding.
    pub fn needs_onboarding(&self) -> bool {
        self.following.is_empty()
    }
}

/// Identity asserted by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Partial profile edit; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic_url: Option<String>,
}

impl ProfileUpdate {
    /// Merge the set fields into a stored user.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.display_name {
            user.display_name = name.clone();
        }
        if let Some(bio) = &self.bio {
            user.bio = bio.clone();
        }
        if let Some(url) = &self.profile_pic_url {
            user.profile_pic_url = url.clone();
        }
    }
}
