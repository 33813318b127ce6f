//! Persistent article store.
//!
//! The pipeline talks to storage through the [`ArticleStore`] trait; the
//! store is the single coordination point between concurrent runs, so all
//! cross-run correctness is expressed as link-uniqueness constraints and
//! existence checks rather than in-process locks.
//!
//! [`PgStore`] is the production backend. [`MemoryStore`] implements the
//! same contract (including duplicate-key semantics) for tests and local
//! experiments.

use crate::types::{FetchLogEntry, PipelineError, ProcessedArticle, Result, UnprocessedArticle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a new unprocessed article. Fails with a duplicate-key error
    /// when the link already exists; callers treat that as a no-op.
    async fn insert_unprocessed(&self, article: &UnprocessedArticle) -> Result<()>;

    /// The oldest pending article (by fetch time), optionally constrained
    /// to a category key.
    async fn find_oldest_pending(&self, category: Option<&str>) -> Result<Option<UnprocessedArticle>>;

    /// Flip the processed flag. Set-once: `processed_at` is never rewritten.
    async fn mark_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()>;

    async fn count_pending(&self, category: Option<&str>) -> Result<u64>;

    /// Insert a rewritten article. The processed store keeps links unique
    /// so a crash between insert and flag flip cannot produce two copies.
    async fn insert_processed(&self, article: &ProcessedArticle) -> Result<()>;

    /// True when any unprocessed or processed article references the link.
    async fn link_exists(&self, link: &str) -> Result<bool>;

    async fn fetch_log_contains(&self, source_name: &str, link: &str) -> Result<bool>;

    /// Idempotent upsert of a fetch-log entry.
    async fn record_fetch(&self, source_name: &str, link: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Postgres backend
// ---------------------------------------------------------------------------

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| PipelineError::General(format!("migration failed: {}", e)))?;

        info!("Connected to article store");
        Ok(Self { pool })
    }

    fn map_unprocessed(row: &sqlx::postgres::PgRow) -> Result<UnprocessedArticle> {
        Ok(UnprocessedArticle {
            id: row.try_get("id")?,
            source_name: row.try_get("source_name")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            content: row.try_get("content")?,
            link: row.try_get("link")?,
            image_url: row.try_get("image_url")?,
            original_image_url: row.try_get("original_image_url")?,
            image_attribution: row.try_get("image_attribution")?,
            categories: row.try_get("categories")?,
            language: row.try_get("language")?,
            published_at: row.try_get("published_at")?,
            fetched_at: row.try_get("fetched_at")?,
            processed: row.try_get("processed")?,
            processed_at: row.try_get("processed_at")?,
        })
    }
}

/// Translate unique-constraint violations into the pipeline's
/// duplicate-key error so callers can treat them as success-equivalent.
fn map_insert_error(e: sqlx::Error, key: &str) -> PipelineError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("23505") {
            return PipelineError::DuplicateKey(key.to_string());
        }
    }
    PipelineError::Database(e)
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn insert_unprocessed(&self, article: &UnprocessedArticle) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO unprocessed_articles
                (id, source_name, title, description, content, link,
                 image_url, original_image_url, image_attribution,
                 categories, language, published_at, fetched_at,
                 processed, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(article.id)
        .bind(&article.source_name)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.link)
        .bind(&article.image_url)
        .bind(&article.original_image_url)
        .bind(&article.image_attribution)
        .bind(&article.categories)
        .bind(&article.language)
        .bind(article.published_at)
        .bind(article.fetched_at)
        .bind(article.processed)
        .bind(article.processed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &article.link))?;

        Ok(())
    }

    async fn find_oldest_pending(&self, category: Option<&str>) -> Result<Option<UnprocessedArticle>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM unprocessed_articles
            WHERE processed = false
              AND ($1::text IS NULL OR $1 = ANY(categories))
            ORDER BY fetched_at ASC
            LIMIT 1
            "#,
        )
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_unprocessed).transpose()
    }

    async fn mark_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE unprocessed_articles
            SET processed = true,
                processed_at = COALESCE(processed_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(processed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_pending(&self, category: Option<&str>) -> Result<u64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS pending FROM unprocessed_articles
            WHERE processed = false
              AND ($1::text IS NULL OR $1 = ANY(categories))
            "#,
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("pending")?;
        Ok(count as u64)
    }

    async fn insert_processed(&self, article: &ProcessedArticle) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_articles
                (id, source_name, title, original_title,
                 rewritten_description, original_description, link,
                 image_url, original_image_url, categories, language,
                 published_at, processed_at, unprocessed_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(article.id)
        .bind(&article.source_name)
        .bind(&article.title)
        .bind(&article.original_title)
        .bind(&article.rewritten_description)
        .bind(&article.original_description)
        .bind(&article.link)
        .bind(&article.image_url)
        .bind(&article.original_image_url)
        .bind(&article.categories)
        .bind(&article.language)
        .bind(article.published_at)
        .bind(article.processed_at)
        .bind(article.unprocessed_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &article.link))?;

        Ok(())
    }

    async fn link_exists(&self, link: &str) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(SELECT 1 FROM unprocessed_articles WHERE link = $1)
                OR EXISTS(SELECT 1 FROM processed_articles WHERE link = $1)
                AS present
            "#,
        )
        .bind(link)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("present")?)
    }

    async fn fetch_log_contains(&self, source_name: &str, link: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM fetch_log WHERE source_name = $1 AND link = $2) AS present",
        )
        .bind(source_name)
        .bind(link)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("present")?)
    }

    async fn record_fetch(&self, source_name: &str, link: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fetch_log (source_name, link, fetched_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (source_name, link) DO NOTHING
            "#,
        )
        .bind(source_name)
        .bind(link)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    unprocessed: Vec<UnprocessedArticle>,
    processed: Vec<ProcessedArticle>,
    fetch_log: Vec<FetchLogEntry>,
}

/// In-memory store with the same uniqueness semantics as [`PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn unprocessed_count(&self) -> usize {
        self.inner.lock().await.unprocessed.len()
    }

    pub async fn processed_count(&self) -> usize {
        self.inner.lock().await.processed.len()
    }

    pub async fn processed_articles(&self) -> Vec<ProcessedArticle> {
        self.inner.lock().await.processed.clone()
    }

    pub async fn unprocessed_articles(&self) -> Vec<UnprocessedArticle> {
        self.inner.lock().await.unprocessed.clone()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn insert_unprocessed(&self, article: &UnprocessedArticle) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.unprocessed.iter().any(|a| a.link == article.link) {
            return Err(PipelineError::DuplicateKey(article.link.clone()));
        }
        inner.unprocessed.push(article.clone());
        Ok(())
    }

    async fn find_oldest_pending(&self, category: Option<&str>) -> Result<Option<UnprocessedArticle>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .unprocessed
            .iter()
            .filter(|a| !a.processed)
            .filter(|a| match category {
                Some(cat) => a.categories.iter().any(|c| c == cat),
                None => true,
            })
            .min_by_key(|a| a.fetched_at)
            .cloned())
    }

    async fn mark_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(article) = inner.unprocessed.iter_mut().find(|a| a.id == id) {
            article.processed = true;
            article.processed_at.get_or_insert(processed_at);
        }
        Ok(())
    }

    async fn count_pending(&self, category: Option<&str>) -> Result<u64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .unprocessed
            .iter()
            .filter(|a| !a.processed)
            .filter(|a| match category {
                Some(cat) => a.categories.iter().any(|c| c == cat),
                None => true,
            })
            .count() as u64)
    }

    async fn insert_processed(&self, article: &ProcessedArticle) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.processed.iter().any(|a| a.link == article.link) {
            return Err(PipelineError::DuplicateKey(article.link.clone()));
        }
        inner.processed.push(article.clone());
        Ok(())
    }

    async fn link_exists(&self, link: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.unprocessed.iter().any(|a| a.link == link)
            || inner.processed.iter().any(|a| a.link == link))
    }

    async fn fetch_log_contains(&self, source_name: &str, link: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .fetch_log
            .iter()
            .any(|e| e.source_name == source_name && e.link == link))
    }

    async fn record_fetch(&self, source_name: &str, link: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let already = inner
            .fetch_log
            .iter()
            .any(|e| e.source_name == source_name && e.link == link);
        if !already {
            inner.fetch_log.push(FetchLogEntry {
                source_name: source_name.to_string(),
                link: link.to_string(),
                fetched_at: Utc::now(),
            });
        }
        Ok(())
    }
}
