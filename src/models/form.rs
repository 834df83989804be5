//! Form and form-response models.
//!
//! A document carries at most one response-collecting form. Field
//! definitions are stored opaquely as JSON; the backend only needs field
//! names for the CSV export header.

use serde::{Deserialize, Serialize};

/// One field definition in a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Widget hint for the frontend (text, textarea, select, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// A response-collecting form attached to a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: String,
    pub document_id: String,
    pub fields: Vec<FormField>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

/// Request body for creating or replacing a document's form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertFormRequest {
    pub fields: Vec<FormField>,
}

/// A single submitted form response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub id: String,
    pub form_id: String,
    /// Field name -> submitted value, stored as-is.
    pub answers: serde_json::Value,
    pub submitted_at: String,
}

/// Request body for submitting a form response on a public page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    pub answers: serde_json::Value,
}
