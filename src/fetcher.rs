//! Fetch orchestration across all configured sources.
//!
//! Sources run concurrently up to a bounded worker count; items within a
//! source are evaluated sequentially in feed order so per-source limits
//! and fetch-log ordering stay meaningful. A failing source never aborts
//! the run. The only cross-run coordination is the store's link-uniqueness
//! constraint, so concurrent runs against the same source are safe.

use crate::classifier::ContentClassifier;
use crate::dedup::Deduplicator;
use crate::feeds::{published_or_now, FeedClient};
use crate::images::ImageResolver;
use crate::store::ArticleStore;
use crate::types::{FeedSource, FetchOptions, FetchReport, RawItem, Result, UnprocessedArticle};
use crate::utils::{clean_title, is_valid_url, strip_html};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct FetchOrchestrator {
    store: Arc<dyn ArticleStore>,
    feed_client: Arc<dyn FeedClient>,
    classifier: Arc<ContentClassifier>,
    images: Arc<ImageResolver>,
    dedup: Deduplicator,
}

impl FetchOrchestrator {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        feed_client: Arc<dyn FeedClient>,
        classifier: Arc<ContentClassifier>,
        images: Arc<ImageResolver>,
    ) -> Self {
        let dedup = Deduplicator::new(store.clone());
        Self {
            store,
            feed_client,
            classifier,
            images,
            dedup,
        }
    }

    /// Run one fetch pass over the given sources.
    pub async fn fetch_all(
        &self,
        sources: &[FeedSource],
        options: &FetchOptions,
    ) -> Result<FetchReport> {
        info!(
            sources = sources.len(),
            per_source_limit = options.per_source_limit,
            total_limit = options.total_limit,
            "Starting fetch run"
        );

        let total_accepted = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(options.max_concurrent_sources.max(1)));
        let mut tasks = JoinSet::new();

        for source in sources.iter().cloned() {
            let orchestrator = self.clone();
            let options = options.clone();
            let total_accepted = total_accepted.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let mut report = FetchReport::default();
                        report.failed_sources += 1;
                        report
                            .warnings
                            .push(format!("{}: worker pool closed", source.name));
                        return report;
                    }
                };
                orchestrator
                    .fetch_source(&source, &options, &total_accepted)
                    .await
            });
        }

        let mut report = FetchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(source_report) => report.merge(source_report),
                Err(e) => {
                    report.failed_sources += 1;
                    report.warnings.push(format!("source task failed: {}", e));
                }
            }
        }

        info!(
            fetched = report.fetched,
            duplicates = report.skipped_duplicate,
            language = report.skipped_language,
            failed_sources = report.failed_sources,
            "Fetch run complete"
        );
        Ok(report)
    }

    /// Fetch and filter one source, in feed order.
    async fn fetch_source(
        &self,
        source: &FeedSource,
        options: &FetchOptions,
        total_accepted: &AtomicUsize,
    ) -> FetchReport {
        let mut report = FetchReport::default();

        let items = match self.feed_client.fetch_items(source).await {
            Ok(items) => items,
            Err(e) => {
                warn!(source = %source.name, error = %e, "Source fetch failed, skipping");
                report.failed_sources += 1;
                report.warnings.push(format!("{}: {}", source.name, e));
                return report;
            }
        };

        let mut accepted_here = 0usize;
        for item in &items {
            if accepted_here >= options.per_source_limit {
                break;
            }
            // Reserve a slot against the global cap before ingesting, so
            // concurrent sources cannot collectively overshoot it.
            if !reserve_slot(total_accepted, options.total_limit) {
                break;
            }

            match self.ingest_item(source, item, options).await {
                IngestOutcome::Accepted => {
                    accepted_here += 1;
                    report.fetched += 1;
                    continue;
                }
                IngestOutcome::Duplicate => report.skipped_duplicate += 1,
                IngestOutcome::WrongLanguage => report.skipped_language += 1,
                IngestOutcome::WrongCategory => report.skipped_category += 1,
                IngestOutcome::Blocked => report.skipped_blocked += 1,
                IngestOutcome::Invalid => {}
                IngestOutcome::Failed(reason) => {
                    report.warnings.push(format!("{}: {}", source.name, reason));
                }
            }
            total_accepted.fetch_sub(1, Ordering::SeqCst);
        }

        debug!(source = %source.name, accepted = accepted_here, "Source done");
        report
    }

    async fn ingest_item(
        &self,
        source: &FeedSource,
        item: &RawItem,
        options: &FetchOptions,
    ) -> IngestOutcome {
        if item.link.is_empty() || !is_valid_url(&item.link) {
            debug!(source = %source.name, "Item without usable link, skipping");
            return IngestOutcome::Invalid;
        }

        if self.dedup.is_duplicate(&source.name, &item.link).await {
            debug!(link = %item.link, "Duplicate link, skipping");
            return IngestOutcome::Duplicate;
        }

        let title = clean_title(&item.title);
        let description = strip_html(item.description.as_deref().unwrap_or(""));
        let classification = self.classifier.classify(&title, &description);

        if !classification.is_target_language {
            debug!(link = %item.link, "Not in target language, skipping");
            return IngestOutcome::WrongLanguage;
        }

        if options.strict_filter && (classification.blocked || !classification.on_topic) {
            debug!(link = %item.link, blocked = classification.blocked, "Rejected by strict filter");
            return IngestOutcome::Blocked;
        }

        if let Some(wanted) = &options.category {
            if !classification.categories.iter().any(|c| c == wanted) {
                return IngestOutcome::WrongCategory;
            }
        }

        let primary_category = classification
            .categories
            .first()
            .map(String::as_str)
            .unwrap_or("general");
        let image = self.images.resolve(item, primary_category, source).await;

        let article = UnprocessedArticle {
            id: Uuid::new_v4(),
            source_name: source.name.clone(),
            title,
            description,
            content: item
                .content
                .clone()
                .or_else(|| item.description.clone())
                .unwrap_or_default(),
            link: item.link.clone(),
            image_url: image.as_ref().map(|i| i.url.clone()),
            original_image_url: image.as_ref().map(|i| i.original_url.clone()),
            image_attribution: image.and_then(|i| i.attribution),
            categories: classification.categories,
            language: crate::catalog::DEFAULT_LANGUAGE.to_string(),
            published_at: published_or_now(item),
            fetched_at: Utc::now(),
            processed: false,
            processed_at: None,
        };

        match self.store.insert_unprocessed(&article).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                debug!(link = %article.link, "Lost insert race, treating as duplicate");
                return IngestOutcome::Duplicate;
            }
            Err(e) => {
                warn!(link = %article.link, error = %e, "Failed to persist item, continuing");
                return IngestOutcome::Failed(format!("persist {}: {}", article.link, e));
            }
        }

        // Only after the article is durable; the log entry is best-effort.
        self.dedup.remember(&source.name, &article.link).await;

        IngestOutcome::Accepted
    }
}

fn reserve_slot(counter: &AtomicUsize, limit: usize) -> bool {
    loop {
        let current = counter.load(Ordering::SeqCst);
        if current >= limit {
            return false;
        }
        if counter
            .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return true;
        }
    }
}

enum IngestOutcome {
    Accepted,
    Duplicate,
    WrongLanguage,
    WrongCategory,
    Blocked,
    Invalid,
    Failed(String),
}

// Integration-level coverage lives in tests/pipeline_test.rs; the pieces
// the orchestrator composes are tested in their own modules.
