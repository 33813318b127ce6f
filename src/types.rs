use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A configured feed source. Immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Lowercased, hyphenated source name, used for bucket key prefixes.
    pub fn slug(&self) -> String {
        self.name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase()
    }
}

/// One parsed feed item as yielded by the feed client. Ephemeral.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub media_url: Option<String>,
    pub enclosure_url: Option<String>,
    pub enclosure_type: Option<String>,
}

/// A deduplicated, classified article awaiting AI rewriting.
/// Identity is the link: at most one row per link exists in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnprocessedArticle {
    pub id: Uuid,
    pub source_name: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub link: String,
    pub image_url: Option<String>,
    pub original_image_url: Option<String>,
    pub image_attribution: Option<String>,
    pub categories: Vec<String>,
    pub language: String,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
}

/// The rewritten, publishable form of an unprocessed article.
/// Immutable once created; the processed store keeps links unique so a
/// failed flag update cannot yield a second copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedArticle {
    pub id: Uuid,
    pub source_name: String,
    pub title: String,
    pub original_title: String,
    pub rewritten_description: String,
    pub original_description: String,
    pub link: String,
    pub image_url: Option<String>,
    pub original_image_url: Option<String>,
    pub categories: Vec<String>,
    pub language: String,
    pub published_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
    pub unprocessed_id: Uuid,
}

/// Record that a source already yielded a link. Existence-check only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchLogEntry {
    pub source_name: String,
    pub link: String,
    pub fetched_at: DateTime<Utc>,
}

/// Options for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub per_source_limit: usize,
    pub total_limit: usize,
    /// When set, items whose detected categories exclude this key are skipped.
    pub category: Option<String>,
    /// Apply allow-keyword and blocklist filtering (the strict ingest path).
    pub strict_filter: bool,
    pub max_concurrent_sources: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            per_source_limit: 6,
            total_limit: 18,
            category: None,
            strict_filter: false,
            max_concurrent_sources: 3,
        }
    }
}

/// Outcome of a fetch run. Per-reason skip counts mirror what each filter
/// rejected; warnings carry non-fatal per-item failures so callers can
/// assert on partial-failure behavior instead of losing it in logs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    pub fetched: usize,
    pub skipped_duplicate: usize,
    pub skipped_language: usize,
    pub skipped_category: usize,
    pub skipped_blocked: usize,
    pub failed_sources: usize,
    pub warnings: Vec<String>,
}

impl FetchReport {
    pub fn merge(&mut self, other: FetchReport) {
        self.fetched += other.fetched;
        self.skipped_duplicate += other.skipped_duplicate;
        self.skipped_language += other.skipped_language;
        self.skipped_category += other.skipped_category;
        self.skipped_blocked += other.skipped_blocked;
        self.failed_sources += other.failed_sources;
        self.warnings.extend(other.warnings);
    }
}

/// Outcome of one rewrite step.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub processed: bool,
    /// Pending articles remaining for the same category filter.
    pub remaining: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<ProcessedArticle>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Rate limited by text-generation service")]
    RateLimited,

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

impl PipelineError {
    /// Duplicate-key failures are success-equivalent for idempotent inserts.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            PipelineError::DuplicateKey(_) => true,
            PipelineError::Database(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, PipelineError::RateLimited)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
