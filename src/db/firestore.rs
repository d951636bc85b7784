// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the `Repository` operations for:
//! - Figures and Quotes (shared reference data, admin-curated)
//! - Users (profile and follow set)
//! - Per-user subcollections: likes, savedQuotes, lists
//! - Suggestions

use crate::db::collections;
use crate::db::repository::{chunk_ids, Repository};
use crate::error::AppError;
use crate::models::{
    Figure, FigureDraft, LikeRecord, Quote, QuoteDraft, QuoteList, SavedQuote, Suggestion, User,
};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

/// Map an insert failure; an existing document becomes `AppError::Conflict`.
fn insert_err(e: FirestoreError, what: &str) -> AppError {
    match e {
        FirestoreError::DataConflictError(_) => {
            AppError::Conflict(format!("{} already exists", what))
        }
        e => db_err(e),
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Parent path of a user's subcollections.
    fn user_doc(&self, uid: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, uid)
            .map_err(db_err)
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, ids: &[String], collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct FollowingPatch {
    following: Vec<String>,
}

#[async_trait]
impl Repository for FirestoreDb {
    // ─── Figure Operations ───────────────────────────────────────

    async fn list_figures(&self) -> Result<Vec<Figure>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FIGURES)
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    async fn get_figure(&self, id: &str) -> Result<Option<Figure>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FIGURES)
            .obj()
            .one(id)
            .await
            .map_err(db_err)
    }

    async fn get_figure_by_handle(&self, handle: &str) -> Result<Option<Figure>, AppError> {
        let figures: Vec<Figure> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FIGURES)
            .filter(|q| q.for_all([q.field("handle").eq(handle)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_err)?;
        Ok(figures.into_iter().next())
    }

    async fn create_figure(&self, draft: &FigureDraft) -> Result<Figure, AppError> {
        let figure = Figure::from_draft(String::new(), draft, chrono::Utc::now());
        let created: Figure = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::FIGURES)
            .generate_document_id()
            .object(&figure)
            .execute()
            .await
            .map_err(db_err)?;

        tracing::info!(figure_id = %created.id, handle = %created.handle, "Figure created");
        Ok(created)
    }

    async fn update_figure(&self, id: &str, draft: &FigureDraft) -> Result<Figure, AppError> {
        let existing = self
            .get_figure(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Figure {}", id)))?;
        let figure = Figure::from_draft(id.to_string(), draft, existing.created_at);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FIGURES)
            .document_id(id)
            .object(&figure)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(figure)
    }

    async fn delete_figure(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FIGURES)
            .document_id(id)
            .execute()
            .await
            .map_err(db_err)
    }

    // ─── Quote Operations ────────────────────────────────────────

    async fn list_quotes(&self) -> Result<Vec<Quote>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUOTES)
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    async fn get_quote(&self, id: &str) -> Result<Option<Quote>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::QUOTES)
            .obj()
            .one(id)
            .await
            .map_err(db_err)
    }

    async fn quotes_by_figure(&self, figure_id: &str) -> Result<Vec<Quote>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUOTES)
            .filter(|q| q.for_all([q.field("figureId").eq(figure_id)]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    async fn quotes_for_figures(&self, figure_ids: &[String]) -> Result<Vec<Quote>, AppError> {
        let client = self.get_client()?;
        let mut quotes = Vec::new();

        for chunk in chunk_ids(figure_ids) {
            let batch: Vec<Quote> = client
                .fluent()
                .select()
                .from(collections::QUOTES)
                .filter(|q| q.for_all([q.field("figureId").is_in(chunk.to_vec())]))
                .obj()
                .query()
                .await
                .map_err(db_err)?;
            quotes.extend(batch);
        }

        Ok(quotes)
    }

    async fn create_quote(&self, draft: &QuoteDraft, added_by: &str) -> Result<Quote, AppError> {
        let quote = Quote::from_draft(String::new(), draft, added_by, chrono::Utc::now());
        let created: Quote = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::QUOTES)
            .generate_document_id()
            .object(&quote)
            .execute()
            .await
            .map_err(db_err)?;

        tracing::info!(quote_id = %created.id, figure_id = %created.figure_id, "Quote created");
        Ok(created)
    }

    async fn update_quote(&self, id: &str, draft: &QuoteDraft) -> Result<Quote, AppError> {
        let existing = self
            .get_quote(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quote {}", id)))?;
        let quote = Quote::from_draft(
            id.to_string(),
            draft,
            &existing.added_by,
            existing.created_at,
        );

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::QUOTES)
            .document_id(id)
            .object(&quote)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(quote)
    }

    async fn delete_quote(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::QUOTES)
            .document_id(id)
            .execute()
            .await
            .map_err(db_err)
    }

    async fn delete_quotes(&self, ids: &[String]) -> Result<(), AppError> {
        self.batch_delete(ids, collections::QUOTES).await
    }

    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(db_err)
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| insert_err(e, &format!("User {}", user.id)))?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_following(&self, uid: &str, figure_ids: &[String]) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["following"])
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&FollowingPatch {
                following: figure_ids.to_vec(),
            })
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // ─── Like Operations ─────────────────────────────────────────

    async fn liked_quote_ids(&self, uid: &str) -> Result<Vec<String>, AppError> {
        let parent = self.user_doc(uid)?;
        let likes: Vec<LikeRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .parent(&parent)
            .obj()
            .query()
            .await
            .map_err(db_err)?;
        Ok(likes.into_iter().map(|like| like.quote_id).collect())
    }

    async fn add_like(&self, uid: &str, quote_id: &str) -> Result<(), AppError> {
        let parent = self.user_doc(uid)?;
        let record = LikeRecord {
            quote_id: quote_id.to_string(),
            liked_at: chrono::Utc::now(),
        };
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LIKES)
            .document_id(quote_id)
            .parent(&parent)
            .object(&record)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn remove_like(&self, uid: &str, quote_id: &str) -> Result<(), AppError> {
        let parent = self.user_doc(uid)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LIKES)
            .document_id(quote_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(db_err)
    }

    // ─── Saved Quote Operations ──────────────────────────────────

    async fn saved_quotes(&self, uid: &str) -> Result<Vec<SavedQuote>, AppError> {
        let parent = self.user_doc(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SAVED_QUOTES)
            .parent(&parent)
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    async fn saved_quotes_in_list(
        &self,
        uid: &str,
        list_id: &str,
    ) -> Result<Vec<SavedQuote>, AppError> {
        let parent = self.user_doc(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SAVED_QUOTES)
            .parent(&parent)
            .filter(|q| q.for_all([q.field("listId").eq(list_id)]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    async fn upsert_saved_quote(
        &self,
        uid: &str,
        quote_id: &str,
        list_id: Option<&str>,
    ) -> Result<SavedQuote, AppError> {
        let parent = self.user_doc(uid)?;
        let client = self.get_client()?;

        let existing: Option<SavedQuote> = client
            .fluent()
            .select()
            .by_id_in(collections::SAVED_QUOTES)
            .parent(&parent)
            .obj()
            .one(quote_id)
            .await
            .map_err(db_err)?;

        let saved = SavedQuote {
            quote_id: quote_id.to_string(),
            list_id: list_id.map(str::to_string),
            saved_at: existing
                .map(|s| s.saved_at)
                .unwrap_or_else(chrono::Utc::now),
        };

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::SAVED_QUOTES)
            .document_id(quote_id)
            .parent(&parent)
            .object(&saved)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(saved)
    }

    async fn delete_saved_quote(&self, uid: &str, quote_id: &str) -> Result<(), AppError> {
        let parent = self.user_doc(uid)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SAVED_QUOTES)
            .document_id(quote_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(db_err)
    }

    // ─── List Operations ─────────────────────────────────────────

    async fn lists(&self, uid: &str) -> Result<Vec<QuoteList>, AppError> {
        let parent = self.user_doc(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LISTS)
            .parent(&parent)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    async fn create_list(&self, uid: &str, name: &str) -> Result<QuoteList, AppError> {
        let parent = self.user_doc(uid)?;
        let list = QuoteList {
            id: String::new(),
            name: name.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.get_client()?
            .fluent()
            .insert()
            .into(collections::LISTS)
            .generate_document_id()
            .parent(&parent)
            .object(&list)
            .execute()
            .await
            .map_err(db_err)
    }

    async fn delete_list(&self, uid: &str, list_id: &str) -> Result<(), AppError> {
        let parent = self.user_doc(uid)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LISTS)
            .document_id(list_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(db_err)
    }

    // ─── Suggestion Operations ───────────────────────────────────

    async fn create_suggestion(&self, suggestion: &Suggestion) -> Result<String, AppError> {
        let created: CreatedDoc = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::SUGGESTIONS)
            .generate_document_id()
            .object(suggestion)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(created.id)
    }
}

/// Only the generated ID of a freshly inserted document.
#[derive(Deserialize)]
struct CreatedDoc {
    #[serde(alias = "_firestore_id")]
    id: String,
}
