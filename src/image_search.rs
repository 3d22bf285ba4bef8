//! Client for the third-party image search provider.
//!
//! The provider speaks the Google Custom Search JSON API: one GET per query,
//! answered with `{"items": [{"link", "title", "image": {"contextLink"}}]}`.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::http::describe_error;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("image search is not configured")]
    NotConfigured,
    #[error("image search returned HTTP {0}")]
    Upstream(u16),
    #[error("image search response was malformed: {0}")]
    Malformed(String),
    #[error("{0}")]
    Request(String),
}

// ── Result item ──────────────────────────────────────────────────────────────

/// One raw hit as the provider reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub link: String,
    pub title: Option<String>,
    pub context_link: Option<String>,
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Ask the provider for up to `count` image hits for `query`.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchItem>, SearchError>;
}

// ── Google Custom Search ─────────────────────────────────────────────────────

pub struct GoogleImageSearch {
    http: reqwest::Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl GoogleImageSearch {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials: Some((api_key.into(), engine_id.into())),
        }
    }

    /// A provider with no credentials; every search fails with
    /// [`SearchError::NotConfigured`] without touching the network.
    pub fn unconfigured(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, query: &str, count: usize) -> Result<Url, SearchError> {
        let (key, cx) = self.credentials.as_ref().ok_or(SearchError::NotConfigured)?;
        let num = count.to_string();
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("key", key.as_str()),
                ("cx", cx.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", num.as_str()),
                ("safe", "active"),
                ("imgSize", "large"),
                ("imgType", "photo"),
            ],
        )
        .map_err(|e| SearchError::Request(format!("invalid endpoint: {}", e)))
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchItem>, SearchError> {
        let url = self.request_url(query, count)?;

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SearchError::Request(describe_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Upstream(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(describe_error(&e)))?;
        parse_items(&body)
    }
}

// ── Response parsing ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Deserialize)]
struct RawItem {
    link: Option<String>,
    title: Option<String>,
    image: Option<RawImageMeta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImageMeta {
    context_link: Option<String>,
}

/// Parse a provider response body. A body without `items` means no hits;
/// items whose link is not an http(s) URL are dropped.
pub fn parse_items(body: &str) -> Result<Vec<SearchItem>, SearchError> {
    let raw: RawResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    Ok(raw
        .items
        .into_iter()
        .filter_map(|item| {
            let link = item.link.map(|l| l.trim().to_string())?;
            if !is_http_url(&link) {
                return None;
            }
            Some(SearchItem {
                link,
                title: item.title.filter(|t| !t.trim().is_empty()),
                context_link: item
                    .image
                    .and_then(|meta| meta.context_link)
                    .filter(|l| is_http_url(l)),
            })
        })
        .collect())
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// The provider's own image-results page for `query`, used as the source link
/// when an item carries none.
pub fn image_results_page(query: &str) -> String {
    match Url::parse_with_params("https://www.google.com/search", &[("q", query), ("tbm", "isch")]) {
        Ok(url) => url.into(),
        Err(_) => "https://www.google.com/search?tbm=isch".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_with_optional_fields() {
        let body = r#"{
            "kind": "customsearch#search",
            "items": [
                {"link": "https://a.test/1.jpg", "title": "One", "image": {"contextLink": "https://a.test/page"}},
                {"link": "https://a.test/2.jpg"},
                {"link": "x-raw-image:///abc", "title": "raw"},
                {"title": "no link"},
                {"link": "https://a.test/3.jpg", "title": "  ", "image": {"contextLink": "not a url"}}
            ]
        }"#;
        let items = parse_items(body).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title.as_deref(), Some("One"));
        assert_eq!(items[0].context_link.as_deref(), Some("https://a.test/page"));
        assert_eq!(items[1].title, None);
        assert_eq!(items[2].link, "https://a.test/3.jpg");
        assert_eq!(items[2].title, None);
        assert_eq!(items[2].context_link, None);
    }

    #[test]
    fn missing_items_is_empty_and_garbage_is_malformed() {
        assert!(parse_items(r#"{"searchInformation": {"totalResults": "0"}}"#)
            .unwrap()
            .is_empty());
        assert!(matches!(parse_items("<html>"), Err(SearchError::Malformed(_))));
    }

    #[test]
    fn request_url_carries_all_filters() {
        let search = GoogleImageSearch::new(reqwest::Client::new(), "KEY", "CX");
        let url = search.request_url("Luffy from One Piece", 8).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("key"), Some("KEY"));
        assert_eq!(get("cx"), Some("CX"));
        assert_eq!(get("q"), Some("Luffy from One Piece"));
        assert_eq!(get("searchType"), Some("image"));
        assert_eq!(get("num"), Some("8"));
        assert_eq!(get("safe"), Some("active"));
        assert_eq!(get("imgSize"), Some("large"));
        assert_eq!(get("imgType"), Some("photo"));
    }

    #[tokio::test]
    async fn unconfigured_search_fails_fast() {
        let search = GoogleImageSearch::unconfigured(reqwest::Client::new());
        let err = search.search("anything", 8).await.unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured));
    }

    #[test]
    fn results_page_encodes_query() {
        assert_eq!(
            image_results_page("Luffy from One Piece"),
            "https://www.google.com/search?q=Luffy+from+One+Piece&tbm=isch"
        );
    }
}
