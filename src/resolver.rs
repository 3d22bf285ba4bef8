//! Image candidate resolution.
//!
//! Turns the provider's unreliable image feed into a gallery of exactly
//! `max_results` entries: every candidate is probed concurrently, the ones
//! that load keep their provider order, and the remainder of the gallery is
//! filled with placeholder entries. Nothing here ever fails; every error
//! degrades to placeholders.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::image_search::{image_results_page, ImageSearch, SearchItem};
use crate::models::{CharacterIdentity, ImageCandidate, ProbeOutcome, ResolvedImage};
use crate::probe::ImageProbe;

// ── Constants ────────────────────────────────────────────────────────────────

pub const FALLBACK_IMAGE_URL: &str = "https://via.placeholder.com/300x300?text=Character+Image";

/// Largest gallery a caller may ask for.
pub const MAX_GALLERY_SIZE: usize = 10;

const DEFAULT_MAX_RESULTS: usize = 4;
const DEFAULT_CANDIDATE_POOL: usize = 8;
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub max_results: usize,
    pub candidate_pool_size: usize,
    pub probe_timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            candidate_pool_size: DEFAULT_CANDIDATE_POOL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────────

/// Stateless between calls: concurrent `resolve` calls share nothing but the
/// provider and probe handles.
#[derive(Clone)]
pub struct ImageResolver {
    search: Arc<dyn ImageSearch>,
    probe: Arc<dyn ImageProbe>,
}

impl ImageResolver {
    pub fn new(search: Arc<dyn ImageSearch>, probe: Arc<dyn ImageProbe>) -> Self {
        Self { search, probe }
    }

    pub async fn resolve(
        &self,
        identity: &CharacterIdentity,
        options: &ResolveOptions,
    ) -> Vec<ResolvedImage> {
        let query = identity.search_query();
        let candidates = self
            .fetch_candidates(identity, &query, options.candidate_pool_size)
            .await;
        let candidate_count = candidates.len();

        let outcomes = self.probe_all(candidates, options.probe_timeout).await;

        let mut images: Vec<ResolvedImage> = outcomes
            .into_iter()
            .filter(|outcome| outcome.loaded)
            .map(|outcome| outcome.candidate.into())
            .take(options.max_results)
            .collect();
        let loaded = images.len();

        pad_with_fallbacks(&mut images, identity, &query, options.max_results);

        tracing::info!(
            query = %query,
            candidates = candidate_count,
            loaded,
            fallbacks = images.len() - loaded,
            "resolved character images"
        );
        images
    }

    async fn fetch_candidates(
        &self,
        identity: &CharacterIdentity,
        query: &str,
        pool_size: usize,
    ) -> Vec<ImageCandidate> {
        if identity.is_blank() || pool_size == 0 {
            tracing::debug!("skipping image search for blank identity or empty pool");
            return Vec::new();
        }

        match self.search.search(query, pool_size).await {
            Ok(mut items) => {
                items.truncate(pool_size);
                items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| to_candidate(item, idx, identity, query))
                    .collect()
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "image search failed; using placeholders");
                Vec::new()
            }
        }
    }

    /// Launch every probe before awaiting any, then wait for all of them.
    /// Output order matches input order.
    async fn probe_all(&self, candidates: Vec<ImageCandidate>, timeout: Duration) -> Vec<ProbeOutcome> {
        let probe = &self.probe;
        join_all(candidates.into_iter().map(|candidate| async move {
            let loaded = match tokio::time::timeout(timeout, probe.probe(&candidate.url)).await {
                Ok(loaded) => loaded,
                Err(_) => {
                    tracing::debug!(url = %candidate.url, "probe timed out");
                    false
                }
            };
            tracing::debug!(url = %candidate.url, loaded, "probe settled");
            ProbeOutcome { candidate, loaded }
        }))
        .await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn to_candidate(item: SearchItem, idx: usize, identity: &CharacterIdentity, query: &str) -> ImageCandidate {
    ImageCandidate {
        url: item.link,
        title: item
            .title
            .unwrap_or_else(|| format!("{} - Image {}", identity.display_name(), idx + 1)),
        source_page_url: item
            .context_link
            .unwrap_or_else(|| image_results_page(query)),
    }
}

pub fn fallback_image(identity: &CharacterIdentity, query: &str) -> ResolvedImage {
    ResolvedImage {
        url: FALLBACK_IMAGE_URL.to_string(),
        title: format!("{} - Default Image", identity.display_name()),
        source_page_url: image_results_page(query),
        is_fallback: true,
    }
}

fn pad_with_fallbacks(
    images: &mut Vec<ResolvedImage>,
    identity: &CharacterIdentity,
    query: &str,
    target: usize,
) {
    while images.len() < target {
        images.push(fallback_image(identity, query));
    }
}
