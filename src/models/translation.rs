//! Translation cache models.

use serde::{Deserialize, Serialize};

/// One cached translation, keyed by `(slug, target_locale)`.
///
/// The entry is valid exactly while `content_hash` matches the fingerprint
/// of the document's current content; a mismatch marks it stale and the
/// next request replaces `html`/`content_hash` in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCacheEntry {
    pub id: String,
    pub document_id: String,
    pub slug: String,
    pub target_locale: String,
    pub source_locale: String,
    pub html: String,
    pub content_hash: String,
    pub updated_at: String,
}

/// Write payload for the translation cache upsert.
#[derive(Debug, Clone, Copy)]
pub struct TranslationUpsert<'a> {
    pub document_id: &'a str,
    pub slug: &'a str,
    pub target_locale: &'a str,
    pub source_locale: &'a str,
    pub html: &'a str,
    pub content_hash: &'a str,
}

/// Translated HTML returned to the page-rendering layer. The markup is
/// fully escaped by the renderer and safe to inject verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedHtml {
    pub html: String,
}
