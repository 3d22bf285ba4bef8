//! Pass-through client for the CharacterKB search / chat / insights backend.

use serde::Deserialize;
use serde_json::json;

use crate::http::describe_error;
use crate::models::{CharacterMatch, TextResponse};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("No matching characters found")]
    NoMatches,
    #[error("Backend returned HTTP {status}: {detail}")]
    Upstream { status: u16, detail: String },
    #[error("{0}")]
    Request(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Semantic character search, best match first.
    pub async fn search(
        &self,
        query: &str,
        media_type: Option<&str>,
    ) -> Result<Vec<CharacterMatch>, BackendError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BackendError::InvalidInput(
                "Please enter a character description".to_string(),
            ));
        }

        let mut body = json!({ "query": query });
        if let Some(media_type) = media_type.map(str::trim).filter(|m| !m.is_empty()) {
            body["media_type"] = json!(media_type);
        }

        let response = self.post("/character_search", &body).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NoMatches);
        }
        let text = read_success(response).await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Request(format!("invalid search response: {}", e)))
    }

    pub async fn chat(
        &self,
        character_name: &str,
        character_description: &str,
        question: &str,
    ) -> Result<String, BackendError> {
        if question.trim().is_empty() {
            return Err(BackendError::InvalidInput("question must not be empty".to_string()));
        }
        let body = json!({
            "character_name": escape_for_backend(character_name),
            "character_description": escape_for_backend(character_description),
            "question": escape_for_backend(question),
        });
        let response = self.post("/character_chat", &body).await?;
        read_text_response(response).await
    }

    pub async fn insights(
        &self,
        character_name: &str,
        character_description: &str,
    ) -> Result<String, BackendError> {
        if character_name.trim().is_empty() {
            return Err(BackendError::InvalidInput(
                "character_name must not be empty".to_string(),
            ));
        }
        let body = json!({
            "character_name": escape_for_backend(character_name),
            "character_description": escape_for_backend(character_description),
        });
        let response = self.post("/character_insights", &body).await?;
        read_text_response(response).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "calling backend");
        self.http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Request(describe_error(&e)))
    }
}

async fn read_success(response: reqwest::Response) -> Result<String, BackendError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::Request(describe_error(&e)))?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        return Err(BackendError::Upstream {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(text)
}

async fn read_text_response(response: reqwest::Response) -> Result<String, BackendError> {
    let text = read_success(response).await?;
    let parsed: TextResponse = serde_json::from_str(&text)
        .map_err(|e| BackendError::Request(format!("invalid backend response: {}", e)))?;
    Ok(parsed.response)
}

/// The backend splices these values into query text, so quotes are doubled
/// and backslashes escaped before sending.
pub fn escape_for_backend(text: &str) -> String {
    text.replace('\'', "''").replace('\\', "\\\\").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_for_backend("  it's a\\b  "), "it''s a\\\\b");
        assert_eq!(escape_for_backend("plain"), "plain");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = BackendClient::new(reqwest::Client::new(), "http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn empty_inputs_are_rejected_locally() {
        let client = BackendClient::new(reqwest::Client::new(), "http://127.0.0.1:1");
        assert!(matches!(
            client.search("   ", None).await,
            Err(BackendError::InvalidInput(_))
        ));
        assert!(matches!(
            client.chat("Luffy", "pirate", "").await,
            Err(BackendError::InvalidInput(_))
        ));
        assert!(matches!(
            client.insights("", "pirate").await,
            Err(BackendError::InvalidInput(_))
        ));
    }
}
