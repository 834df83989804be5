//! Public page endpoints.
//!
//! These routes are unauthenticated and only ever serve published
//! documents. All HTML returned here has passed through the renderer's
//! escaping, so the page layer may inject it verbatim.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Document, FormResponse, SubmitResponseRequest, TranslatedHtml};
use crate::AppState;

/// A published document as shown to readers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub slug: String,
    pub title: String,
    pub source_locale: String,
    pub html: String,
    pub has_form: bool,
}

/// Query parameters for translated page HTML.
#[derive(Debug, Deserialize)]
pub struct PageHtmlQuery {
    /// Target locale; defaults to the document's source locale.
    #[serde(default)]
    pub locale: Option<String>,
}

/// GET /pages/:slug - Published document with HTML in its source locale.
pub async fn get_page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<PageView> {
    let document = published_document(&state, &slug).await?;
    let html = localized_page_html(&state, &document, &document.source_locale).await?;

    let has_form = state
        .repo
        .get_form_by_document(&document.id)
        .await?
        .is_some();

    success(PageView {
        slug,
        title: document.title,
        source_locale: document.source_locale,
        html: html.html,
        has_form,
    })
}

/// GET /pages/:slug/html?locale=xx - Translated HTML for a published document.
pub async fn get_page_html(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageHtmlQuery>,
) -> ApiResult<TranslatedHtml> {
    let document = published_document(&state, &slug).await?;
    let target_locale = params
        .locale
        .unwrap_or_else(|| document.source_locale.clone());

    let translated = localized_page_html(&state, &document, &target_locale).await?;
    success(translated)
}

/// POST /pages/:slug/form/responses - Submit a form response.
pub async fn submit_response(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<SubmitResponseRequest>,
) -> ApiResult<FormResponse> {
    if !request.answers.is_object() {
        return Err(AppError::Validation(
            "Answers must be an object of field values".to_string(),
        ));
    }

    let document = published_document(&state, &slug).await?;
    let form = state
        .repo
        .get_form_by_document(&document.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {} has no form", slug)))?;

    let response = state.repo.create_response(&form.id, &request.answers).await?;
    success(response)
}

async fn published_document(state: &AppState, slug: &str) -> Result<Document, AppError> {
    let document = state
        .repo
        .get_document_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {} not found", slug)))?;

    if !document.published {
        return Err(AppError::NotFound(format!("Page {} not found", slug)));
    }

    Ok(document)
}

/// Run the translation pipeline, folding every internal failure into one
/// caller-visible "translation unavailable" condition. The underlying
/// cause (engine vs cache store) only reaches the logs.
async fn localized_page_html(
    state: &AppState,
    document: &Document,
    target_locale: &str,
) -> Result<TranslatedHtml, AppError> {
    let slug = document.slug.as_deref().unwrap_or_default();

    state
        .translator
        .translated_html(
            slug,
            &document.id,
            &document.content,
            &document.source_locale,
            target_locale,
        )
        .await
        .map_err(|err| {
            tracing::error!(
                "Translation pipeline failed for {} [{}]: {}",
                slug,
                target_locale,
                err
            );
            AppError::Translation("Translation unavailable".to_string())
        })
}
