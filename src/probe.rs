use async_trait::async_trait;

use crate::http::describe_error;

/// Confirms that a candidate URL can actually be rendered as an image.
///
/// Implementations report only loaded / not loaded. The deadline for a
/// single probe is imposed by the caller.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> bool;
}

/// Probes by downloading the resource over HTTP.
pub struct HttpImageProbe {
    http: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> bool {
        let response = match self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "image/*,*/*;q=0.8")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url, error = %describe_error(&e), "probe request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(url, status = response.status().as_u16(), "probe got non-success status");
            return false;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_lowercase());

        if !accepts_content_type(content_type.as_deref()) {
            tracing::debug!(url, content_type = ?content_type, "probe got non-image content");
            return false;
        }

        first_chunk_arrives(response, url).await
    }
}

/// A probe only needs proof that image bytes flow; the rest of the body is
/// never read and the connection is dropped with the response.
async fn first_chunk_arrives(mut response: reqwest::Response, url: &str) -> bool {
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) if !chunk.is_empty() => return true,
            Ok(Some(_)) => continue,
            Ok(None) => {
                tracing::debug!(url, "probe got empty body");
                return false;
            }
            Err(e) => {
                tracing::debug!(url, error = %describe_error(&e), "probe body failed");
                return false;
            }
        }
    }
}

/// Missing content types are given the benefit of the doubt; anything
/// declared must be an image.
fn accepts_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(ct) => ct.trim_start().starts_with("image/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_filter() {
        assert!(accepts_content_type(None));
        assert!(accepts_content_type(Some("image/png")));
        assert!(accepts_content_type(Some("image/jpeg; charset=binary")));
        assert!(!accepts_content_type(Some("text/html; charset=utf-8")));
        assert!(!accepts_content_type(Some("application/json")));
    }

    #[tokio::test]
    async fn unreachable_host_is_not_loaded() {
        let probe = HttpImageProbe::new(reqwest::Client::new());
        assert!(!probe.probe("http://127.0.0.1:1/missing.png").await);
        assert!(!probe.probe("not a url").await);
    }
}
