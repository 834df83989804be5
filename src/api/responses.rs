//! Form response endpoints (authoring side): listing and CSV export.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Form, FormResponse};
use crate::AppState;

/// GET /api/documents/:id/responses - List responses for the document's form.
pub async fn list_responses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<FormResponse>> {
    let form = form_for_document(&state, &id).await?;
    let responses = state.repo.list_responses(&form.id).await?;
    success(responses)
}

/// GET /api/documents/:id/responses/export - Download responses as CSV.
pub async fn export_responses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let form = form_for_document(&state, &id).await?;
    let responses = state.repo.list_responses(&form.id).await?;

    let csv = build_csv(&form, &responses);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"responses.csv\"",
            ),
        ],
        csv,
    ))
}

async fn form_for_document(state: &AppState, document_id: &str) -> Result<Form, AppError> {
    state
        .repo
        .get_form_by_document(document_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No form attached to document {}", document_id))
        })
}

/// Build a CSV document: one column per form field, prefixed by the
/// submission timestamp, one row per response.
fn build_csv(form: &Form, responses: &[FormResponse]) -> String {
    let mut out = String::new();

    let mut header: Vec<String> = vec!["submittedAt".to_string()];
    header.extend(form.fields.iter().map(|f| f.name.clone()));
    out.push_str(&csv_row(&header));

    for response in responses {
        let mut row = vec![response.submitted_at.clone()];
        for field in &form.fields {
            row.push(answer_text(&response.answers, &field.name));
        }
        out.push_str(&csv_row(&row));
    }

    out
}

fn answer_text(answers: &serde_json::Value, field: &str) -> String {
    match answers.get(field) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn csv_row(fields: &[String]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

/// Quote a field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
