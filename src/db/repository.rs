//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CreateDocumentRequest, Document, Form, FormField, FormResponse, TranslationCacheEntry,
    TranslationUpsert, UpdateDocumentRequest,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== DOCUMENT OPERATIONS ====================

    /// List all documents, optionally filtered by owner.
    pub async fn list_documents(&self, owner_id: Option<&str>) -> Result<Vec<Document>, AppError> {
        let rows = match owner_id {
            Some(owner) => {
                sqlx::query(
                    "SELECT id, owner_id, title, slug, content, source_locale, published, created_at, updated_at, version FROM documents WHERE owner_id = ? ORDER BY updated_at DESC"
                )
                .bind(owner)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, owner_id, title, slug, content, source_locale, published, created_at, updated_at, version FROM documents ORDER BY updated_at DESC"
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(document_from_row).collect())
    }

    /// Get a document by ID.
    pub async fn get_document(&self, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query(
            "SELECT id, owner_id, title, slug, content, source_locale, published, created_at, updated_at, version FROM documents WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    /// Get a document by its public slug.
    pub async fn get_document_by_slug(&self, slug: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query(
            "SELECT id, owner_id, title, slug, content, source_locale, published, created_at, updated_at, version FROM documents WHERE slug = ?"
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    /// Create a new document.
    pub async fn create_document(
        &self,
        request: &CreateDocumentRequest,
    ) -> Result<Document, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let source_locale = request
            .source_locale
            .clone()
            .unwrap_or_else(|| "en".to_string());

        sqlx::query(
            "INSERT INTO documents (id, owner_id, title, slug, content, source_locale, published, created_at, updated_at, version) VALUES (?, ?, ?, NULL, ?, ?, 0, ?, ?, 1)"
        )
        .bind(&id)
        .bind(&request.owner_id)
        .bind(&request.title)
        .bind(&request.content)
        .bind(&source_locale)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Document {
            id,
            owner_id: request.owner_id.clone(),
            title: request.title.clone(),
            slug: None,
            content: request.content.clone(),
            source_locale,
            published: false,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    /// Update a document with optimistic concurrency control.
    ///
    /// Cached translations are left untouched here: a content change makes
    /// them stale by fingerprint mismatch and the next public read
    /// recomputes them.
    pub async fn update_document(
        &self,
        id: &str,
        request: &UpdateDocumentRequest,
    ) -> Result<Document, AppError> {
        let existing = self
            .get_document(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        let title = request.title.as_ref().unwrap_or(&existing.title);
        let content = request.content.as_ref().unwrap_or(&existing.content);
        let source_locale = request
            .source_locale
            .as_ref()
            .unwrap_or(&existing.source_locale);

        // Use conditional UPDATE with version check to prevent race conditions
        let result = sqlx::query(
            "UPDATE documents SET title = ?, content = ?, source_locale = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?"
        )
        .bind(title)
        .bind(content)
        .bind(source_locale)
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Race condition - version changed between read and write
            let current = self.get_document(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|d| d.version).unwrap_or(0),
            });
        }

        Ok(Document {
            id: id.to_string(),
            owner_id: existing.owner_id,
            title: title.clone(),
            slug: existing.slug,
            content: content.clone(),
            source_locale: source_locale.clone(),
            published: existing.published,
            created_at: existing.created_at,
            updated_at: now,
            version: new_version,
        })
    }

    /// Delete a document along with its form, responses, and cached
    /// translations.
    pub async fn delete_document(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }

        sqlx::query(
            "DELETE FROM form_responses WHERE form_id IN (SELECT id FROM forms WHERE document_id = ?)"
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM forms WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM translation_cache WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Publish a document under a slug.
    pub async fn publish_document(&self, id: &str, slug: &str) -> Result<Document, AppError> {
        let existing = self
            .get_document(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        // Reject a slug already held by another document
        if let Some(holder) = self.get_document_by_slug(slug).await? {
            if holder.id != existing.id {
                return Err(AppError::Validation(format!(
                    "Slug '{}' is already in use",
                    slug
                )));
            }
        }

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        sqlx::query(
            "UPDATE documents SET slug = ?, published = 1, updated_at = ?, version = ? WHERE id = ?",
        )
        .bind(slug)
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Document {
            slug: Some(slug.to_string()),
            published: true,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }

    /// Take a document off the public site. The slug is kept so cached
    /// translations stay valid across a republish.
    pub async fn unpublish_document(&self, id: &str) -> Result<Document, AppError> {
        let existing = self
            .get_document(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        sqlx::query("UPDATE documents SET published = 0, updated_at = ?, version = ? WHERE id = ?")
            .bind(&now)
            .bind(new_version)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Document {
            published: false,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }

    // ==================== FORM OPERATIONS ====================

    /// Create or replace the form attached to a document.
    pub async fn upsert_form(
        &self,
        document_id: &str,
        fields: &[FormField],
    ) -> Result<Form, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let fields_json = serde_json::to_string(fields)
            .map_err(|e| AppError::Internal(format!("Failed to serialize form fields: {}", e)))?;

        sqlx::query(
            r#"INSERT INTO forms (id, document_id, fields, created_at, updated_at, version)
               VALUES (?, ?, ?, ?, ?, 1)
               ON CONFLICT(document_id) DO UPDATE SET
                   fields = excluded.fields,
                   updated_at = excluded.updated_at,
                   version = forms.version + 1"#,
        )
        .bind(&id)
        .bind(document_id)
        .bind(&fields_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_form_by_document(document_id)
            .await?
            .ok_or_else(|| AppError::Internal("Form upsert did not persist".to_string()))
    }

    /// Get the form attached to a document, if any.
    pub async fn get_form_by_document(&self, document_id: &str) -> Result<Option<Form>, AppError> {
        let row = sqlx::query(
            "SELECT id, document_id, fields, created_at, updated_at, version FROM forms WHERE document_id = ?"
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(form_from_row))
    }

    /// Delete a document's form and its responses.
    pub async fn delete_form(&self, document_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM form_responses WHERE form_id IN (SELECT id FROM forms WHERE document_id = ?)"
        )
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM forms WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No form attached to document {}",
                document_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Record a submitted form response.
    pub async fn create_response(
        &self,
        form_id: &str,
        answers: &serde_json::Value,
    ) -> Result<FormResponse, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let answers_json = serde_json::to_string(answers)
            .map_err(|e| AppError::Internal(format!("Failed to serialize answers: {}", e)))?;

        sqlx::query(
            "INSERT INTO form_responses (id, form_id, answers, submitted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(form_id)
        .bind(&answers_json)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(FormResponse {
            id,
            form_id: form_id.to_string(),
            answers: answers.clone(),
            submitted_at: now,
        })
    }

    /// List all responses for a form, oldest first.
    pub async fn list_responses(&self, form_id: &str) -> Result<Vec<FormResponse>, AppError> {
        let rows = sqlx::query(
            "SELECT id, form_id, answers, submitted_at FROM form_responses WHERE form_id = ? ORDER BY submitted_at"
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(response_from_row).collect())
    }

    // ==================== TRANSLATION CACHE OPERATIONS ====================

    /// Look up the cached translation for a (slug, target locale) pair.
    pub async fn lookup_translation(
        &self,
        slug: &str,
        target_locale: &str,
    ) -> Result<Option<TranslationCacheEntry>, AppError> {
        let row = sqlx::query(
            "SELECT id, document_id, slug, target_locale, source_locale, html, content_hash, updated_at FROM translation_cache WHERE slug = ? AND target_locale = ?"
        )
        .bind(slug)
        .bind(target_locale)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(translation_from_row))
    }

    /// Insert or update a cached translation, keyed on (slug, target_locale).
    pub async fn upsert_translation(&self, entry: &TranslationUpsert<'_>) -> Result<(), AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO translation_cache
                   (id, document_id, slug, target_locale, source_locale, html, content_hash, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(slug, target_locale) DO UPDATE SET
                   html = excluded.html,
                   content_hash = excluded.content_hash,
                   source_locale = excluded.source_locale,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&id)
        .bind(entry.document_id)
        .bind(entry.slug)
        .bind(entry.target_locale)
        .bind(entry.source_locale)
        .bind(entry.html)
        .bind(entry.content_hash)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// Helper functions for row conversion

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    let published: i32 = row.get("published");
    Document {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        source_locale: row.get("source_locale"),
        published: published != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn form_from_row(row: &sqlx::sqlite::SqliteRow) -> Form {
    let fields_str: String = row.get("fields");
    Form {
        id: row.get("id"),
        document_id: row.get("document_id"),
        fields: serde_json::from_str(&fields_str).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn response_from_row(row: &sqlx::sqlite::SqliteRow) -> FormResponse {
    let answers_str: String = row.get("answers");
    FormResponse {
        id: row.get("id"),
        form_id: row.get("form_id"),
        answers: serde_json::from_str(&answers_str).unwrap_or(serde_json::Value::Null),
        submitted_at: row.get("submitted_at"),
    }
}

fn translation_from_row(row: &sqlx::sqlite::SqliteRow) -> TranslationCacheEntry {
    TranslationCacheEntry {
        id: row.get("id"),
        document_id: row.get("document_id"),
        slug: row.get("slug"),
        target_locale: row.get("target_locale"),
        source_locale: row.get("source_locale"),
        html: row.get("html"),
        content_hash: row.get("content_hash"),
        updated_at: row.get("updated_at"),
    }
}
