//! Document model and request shapes.

use serde::{Deserialize, Serialize};

/// A rich-text document owned by an author.
///
/// `content` holds the raw block JSON exactly as the editor submitted it;
/// the backend never normalizes it, so the translation fingerprint is
/// byte-stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    /// Public address once published. Kept after unpublish so cached
    /// translations survive a republish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub content: String,
    pub source_locale: String,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for creating a new document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub owner_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source_locale: Option<String>,
}

/// Request body for updating an existing document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source_locale: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for publishing a document under a slug.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDocumentRequest {
    pub slug: String,
}
