// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User suggestions for new figures and quotes.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{Identity, Suggestion, SuggestionDetails, SuggestionStatus};
use chrono::Utc;

fn required(field: &'static str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trim every field; names and quote text are required.
pub fn validate_details(details: &SuggestionDetails) -> Result<SuggestionDetails, AppError> {
    Ok(match details {
        SuggestionDetails::Figure {
            figure_name,
            figure_description,
            figure_why,
        } => SuggestionDetails::Figure {
            figure_name: required("figureName", figure_name)?,
            figure_description: figure_description.trim().to_string(),
            figure_why: figure_why.trim().to_string(),
        },
        SuggestionDetails::Quote {
            quote_figure,
            quote_text,
            quote_source,
        } => SuggestionDetails::Quote {
            quote_figure: required("quoteFigure", quote_figure)?,
            quote_text: required("quoteText", quote_text)?,
            quote_source: quote_source.trim().to_string(),
        },
    })
}

/// Store a pending suggestion from the signed-in user. Returns its ID.
pub async fn submit(
    repo: &dyn Repository,
    submitter: &Identity,
    details: &SuggestionDetails,
) -> Result<String, AppError> {
    let suggestion = Suggestion {
        details: validate_details(details)?,
        submitted_by: submitter.uid.clone(),
        submitted_by_email: submitter.email.clone().unwrap_or_default(),
        status: SuggestionStatus::Pending,
        created_at: Utc::now(),
    };

    let id = repo.create_suggestion(&suggestion).await?;

    tracing::info!(suggestion_id = %id, user_id = %submitter.uid, "Suggestion submitted");
    Ok(id)
}
