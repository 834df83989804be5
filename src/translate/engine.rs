//! External translation engine client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::config::TranslateConfig;
use crate::errors::AppError;

/// A remote service that translates an HTML document between locales while
/// preserving markup structure.
///
/// Injected into the orchestrator as a trait object so tests can swap in a
/// fake without any network.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    async fn localize_html(
        &self,
        html: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, AppError>;
}

/// HTTP client for the hosted localization service.
pub struct HttpTranslationEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct LocalizeResponse {
    html: String,
}

impl HttpTranslationEngine {
    pub fn new(config: &TranslateConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TranslationEngine for HttpTranslationEngine {
    async fn localize_html(
        &self,
        html: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, AppError> {
        // Identical locales translate to themselves; skip the round-trip.
        if source_locale == target_locale {
            return Ok(html.to_string());
        }

        let body = json!({
            "html": html,
            "sourceLocale": source_locale,
            "targetLocale": target_locale,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        // Read as text first so HTTP error bodies keep their message even
        // when they are not valid JSON
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(AppError::Translation(extract_error_message(status, &text)));
        }

        let parsed: LocalizeResponse = serde_json::from_str(&text).map_err(|_| {
            AppError::Translation("Invalid engine response: missing html".to_string())
        })?;

        Ok(parsed.html)
    }
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    // Common shapes: { "error": { "message": "..." } } or { "message": "..." }
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
    }

    // Fallback: raw body, truncated
    let trimmed = body_text.trim();
    let snippet = if trimmed.len() > 400 {
        format!("{}...", &trimmed[..400])
    } else {
        trimmed.to_string()
    };

    format!("HTTP {}: {}", status.as_u16(), snippet)
}
