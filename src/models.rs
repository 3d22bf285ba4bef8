use serde::{Deserialize, Serialize};

// ── Character identity ───────────────────────────────────────────────────────

/// Who we are looking for: a display name plus a qualifier such as the
/// franchise or genre the character comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterIdentity {
    pub name: String,
    pub qualifier: String,
}

impl CharacterIdentity {
    pub fn new(name: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifier: qualifier.into(),
        }
    }

    /// Free-text query sent to the image search provider.
    pub fn search_query(&self) -> String {
        let name = self.name.trim();
        let qualifier = self.qualifier.trim();
        match (name.is_empty(), qualifier.is_empty()) {
            (false, false) => format!("{} from {}", name, qualifier),
            (false, true) => name.to_string(),
            (true, false) => qualifier.to_string(),
            (true, true) => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.qualifier.trim().is_empty()
    }

    /// Name used in generated titles.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            "Character"
        } else {
            name
        }
    }
}

// ── Image pipeline ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub title: String,
    pub source_page_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImage {
    pub url: String,
    pub title: String,
    pub source_page_url: String,
    pub is_fallback: bool,
}

impl From<ImageCandidate> for ResolvedImage {
    fn from(candidate: ImageCandidate) -> Self {
        Self {
            url: candidate.url,
            title: candidate.title,
            source_page_url: candidate.source_page_url,
            is_fallback: false,
        }
    }
}

#[derive(Debug)]
pub struct ProbeOutcome {
    pub candidate: ImageCandidate,
    pub loaded: bool,
}

// ── CharacterKB backend ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterMatch {
    pub character_name: String,
    pub genre: String,
    pub media_type: String,
    pub description: String,
    #[serde(default)]
    pub relevance: Option<f64>,
}

impl CharacterMatch {
    pub fn identity(&self) -> CharacterIdentity {
        CharacterIdentity::new(&self.character_name, &self.genre)
    }
}

// ── HTTP request / response bodies ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImagesRequest {
    pub character_name: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub with_images: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<CharacterMatch>,
    pub best_match_images: Vec<ResolvedImage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub character_name: String,
    pub character_description: String,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    pub character_name: String,
    pub character_description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextResponse {
    pub response: String,
}
