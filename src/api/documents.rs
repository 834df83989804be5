//! Document API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    CreateDocumentRequest, Document, PublishDocumentRequest, UpdateDocumentRequest,
};
use crate::AppState;

/// Query parameters for listing documents.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQuery {
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// GET /api/documents - List documents, optionally by owner.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListDocumentsQuery>,
) -> ApiResult<Vec<Document>> {
    let documents = state.repo.list_documents(params.owner_id.as_deref()).await?;
    success(documents)
}

/// GET /api/documents/:id - Get a single document.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let document = state
        .repo
        .get_document(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;
    success(document)
}

/// POST /api/documents - Create a new document.
pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> ApiResult<Document> {
    // Validate required fields. Content is stored as-is: even non-JSON
    // survives here because rendering degrades rather than fails.
    if request.owner_id.trim().is_empty() {
        return Err(AppError::Validation("ownerId is required".to_string()));
    }
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.content.is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }

    let document = state.repo.create_document(&request).await?;
    success(document)
}

/// PUT /api/documents/:id - Update a document.
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> ApiResult<Document> {
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
    }

    let document = state.repo.update_document(&id, &request).await?;
    success(document)
}

/// DELETE /api/documents/:id - Delete a document.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_document(&id).await?;
    success(())
}

/// POST /api/documents/:id/publish - Publish a document under a slug.
pub async fn publish_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PublishDocumentRequest>,
) -> ApiResult<Document> {
    if !is_valid_slug(&request.slug) {
        return Err(AppError::Validation(
            "Slug must be lowercase alphanumeric with hyphens".to_string(),
        ));
    }

    let document = state.repo.publish_document(&id, &request.slug).await?;
    success(document)
}

/// POST /api/documents/:id/unpublish - Take a document off the public site.
pub async fn unpublish_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let document = state.repo.unpublish_document(&id).await?;
    success(document)
}

/// Slugs are non-empty lowercase alphanumeric with interior hyphens.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
