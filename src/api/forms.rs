//! Form API endpoints (authoring side).

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Form, UpsertFormRequest};
use crate::AppState;

/// PUT /api/documents/:id/form - Create or replace the document's form.
pub async fn put_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpsertFormRequest>,
) -> ApiResult<Form> {
    if request.fields.is_empty() {
        return Err(AppError::Validation(
            "A form needs at least one field".to_string(),
        ));
    }
    for field in &request.fields {
        if field.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Every form field needs a name".to_string(),
            ));
        }
    }

    // The form must hang off an existing document
    state
        .repo
        .get_document(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

    let form = state.repo.upsert_form(&id, &request.fields).await?;
    success(form)
}

/// GET /api/documents/:id/form - Get the document's form.
pub async fn get_form(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Form> {
    let form = state
        .repo
        .get_form_by_document(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No form attached to document {}", id)))?;
    success(form)
}

/// DELETE /api/documents/:id/form - Remove the form and its responses.
pub async fn delete_form(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_form(&id).await?;
    success(())
}
