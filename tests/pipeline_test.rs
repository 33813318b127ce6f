use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;
use varta_pipeline::{
    catalog, ArticleStore, ContentClassifier, FeedClient, FeedSource, FetchOptions,
    FetchOrchestrator, ImageResolver, MemoryStore, PipelineError, RawItem, Result, RewriteStage,
    TextGenerator,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

/// Serves canned items per source name; sources in `failing` error out.
struct ScriptedFeedClient {
    feeds: HashMap<String, Vec<RawItem>>,
    failing: HashSet<String>,
}

impl ScriptedFeedClient {
    fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    fn with_feed(mut self, source: &str, items: Vec<RawItem>) -> Self {
        self.feeds.insert(source.to_string(), items);
        self
    }

    fn with_failure(mut self, source: &str) -> Self {
        self.failing.insert(source.to_string());
        self
    }
}

#[async_trait]
impl FeedClient for ScriptedFeedClient {
    async fn fetch_items(&self, source: &FeedSource) -> Result<Vec<RawItem>> {
        if self.failing.contains(&source.name) {
            return Err(PipelineError::Parse(format!(
                "{} is unreachable",
                source.url
            )));
        }
        Ok(self.feeds.get(&source.name).cloned().unwrap_or_default())
    }
}

struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok("rewritten text".to_string())
    }
}

/// A headline that passes the language gate: 12 Devanagari characters
/// plus a short Latin tail keeps both the floor and the ratio satisfied.
fn marathi_title(tag: &str) -> String {
    let base: String = std::iter::repeat('\u{0915}').take(12).collect();
    format!("{} {}", base, tag)
}

fn feed_item(link: &str, title: &str) -> RawItem {
    RawItem {
        title: title.to_string(),
        link: link.to_string(),
        description: Some("<p>\u{092c}\u{093e}\u{0924}\u{092e}\u{0940}</p>".to_string()),
        ..Default::default()
    }
}

fn orchestrator(
    store: Arc<MemoryStore>,
    feed_client: ScriptedFeedClient,
) -> FetchOrchestrator {
    FetchOrchestrator::new(
        store,
        Arc::new(feed_client),
        Arc::new(ContentClassifier::default()),
        Arc::new(ImageResolver::new(reqwest::Client::new(), Vec::new(), None)),
    )
}

fn source(name: &str) -> FeedSource {
    FeedSource::new(name, format!("https://example.com/{}/feed", name))
}

#[tokio::test]
async fn duplicate_links_are_counted_not_reinserted() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    // One of the three links is already in the global store.
    let seeded = varta_pipeline::UnprocessedArticle {
        id: uuid::Uuid::new_v4(),
        source_name: "Saam TV".to_string(),
        title: marathi_title("old"),
        description: String::new(),
        content: String::new(),
        link: "https://example.com/dup".to_string(),
        image_url: None,
        original_image_url: None,
        image_attribution: None,
        categories: vec!["general".to_string()],
        language: "mr".to_string(),
        published_at: chrono::Utc::now(),
        fetched_at: chrono::Utc::now(),
        processed: false,
        processed_at: None,
    };
    store.insert_unprocessed(&seeded).await.unwrap();

    let feeds = ScriptedFeedClient::new().with_feed(
        "TV9 Marathi",
        vec![
            feed_item("https://example.com/one", &marathi_title("one")),
            feed_item("https://example.com/dup", &marathi_title("dup")),
            feed_item("https://example.com/two", &marathi_title("two")),
        ],
    );

    let report = orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi")], &FetchOptions::default())
        .await
        .unwrap();

    info!(?report, "fetch report");
    assert_eq!(report.fetched, 2);
    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(store.unprocessed_count().await, 3);
}

#[tokio::test]
async fn non_target_language_items_are_skipped() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let feeds = ScriptedFeedClient::new().with_feed(
        "TV9 Marathi",
        vec![
            feed_item("https://example.com/en", "english only headline here"),
            feed_item("https://example.com/mr", &marathi_title("ok")),
        ],
    );

    let report = orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi")], &FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.skipped_language, 1);
    assert_eq!(store.unprocessed_count().await, 1);
}

#[tokio::test]
async fn failing_source_does_not_abort_the_run() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let feeds = ScriptedFeedClient::new()
        .with_failure("Saam TV")
        .with_feed(
            "TV9 Marathi",
            vec![feed_item("https://example.com/a", &marathi_title("a"))],
        );

    let report = orchestrator(store.clone(), feeds)
        .fetch_all(
            &[source("Saam TV"), source("TV9 Marathi")],
            &FetchOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed_sources, 1);
    assert_eq!(report.warnings.len(), 1);
}

#[tokio::test]
async fn per_source_and_total_limits_are_enforced() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let many: Vec<RawItem> = (0..10)
        .map(|i| {
            feed_item(
                &format!("https://example.com/tv9/{}", i),
                &marathi_title(&format!("n{}", i)),
            )
        })
        .collect();
    let more: Vec<RawItem> = (0..10)
        .map(|i| {
            feed_item(
                &format!("https://example.com/saam/{}", i),
                &marathi_title(&format!("m{}", i)),
            )
        })
        .collect();

    let feeds = ScriptedFeedClient::new()
        .with_feed("TV9 Marathi", many)
        .with_feed("Saam TV", more);

    let options = FetchOptions {
        per_source_limit: 3,
        total_limit: 5,
        ..Default::default()
    };

    let report = orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi"), source("Saam TV")], &options)
        .await
        .unwrap();

    assert_eq!(report.fetched, 5);
    assert_eq!(store.unprocessed_count().await, 5);
}

#[tokio::test]
async fn category_filter_skips_unrequested_items() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let sports_kw = catalog::keywords_for("sports")[0];
    let feeds = ScriptedFeedClient::new().with_feed(
        "TV9 Marathi",
        vec![
            feed_item(
                "https://example.com/sports",
                &format!("{} {}", marathi_title("s"), sports_kw),
            ),
            feed_item("https://example.com/plain", &marathi_title("p")),
        ],
    );

    let options = FetchOptions {
        category: Some("sports".to_string()),
        ..Default::default()
    };

    let report = orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi")], &options)
        .await
        .unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.skipped_category, 1);
    let stored = store.unprocessed_articles().await;
    assert!(stored[0].categories.contains(&"sports".to_string()));
}

#[tokio::test]
async fn strict_filter_drops_blocked_items() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let allowed = catalog::ALLOWED_KEYWORDS[0];
    let blocked_one = catalog::BLOCKED_KEYWORDS[0];
    let blocked_two = catalog::BLOCKED_KEYWORDS[1];

    let feeds = ScriptedFeedClient::new().with_feed(
        "TV9 Marathi",
        vec![
            feed_item(
                "https://example.com/ok",
                &format!("{} {}", marathi_title("ok"), allowed),
            ),
            feed_item(
                "https://example.com/bad",
                &format!(
                    "{} {} {} {}",
                    marathi_title("bad"),
                    allowed,
                    blocked_one,
                    blocked_two
                ),
            ),
        ],
    );

    let options = FetchOptions {
        strict_filter: true,
        ..Default::default()
    };

    let report = orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi")], &options)
        .await
        .unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.skipped_blocked, 1);
}

#[tokio::test]
async fn inline_image_is_preferred_and_recorded() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let mut item = feed_item("https://example.com/img", &marathi_title("img"));
    item.content = Some(format!(
        r#"<p><img src="https://cdn.example.com/inline.jpg"/>{}</p>"#,
        marathi_title("body")
    ));
    item.thumbnail_url = Some("https://cdn.example.com/thumb.jpg".to_string());

    let feeds = ScriptedFeedClient::new().with_feed("TV9 Marathi", vec![item]);

    orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi")], &FetchOptions::default())
        .await
        .unwrap();

    let stored = store.unprocessed_articles().await;
    assert_eq!(
        stored[0].original_image_url.as_deref(),
        Some("https://cdn.example.com/inline.jpg")
    );
    // No object storage configured in this test, so the article keeps
    // the original URL.
    assert_eq!(
        stored[0].image_url.as_deref(),
        Some("https://cdn.example.com/inline.jpg")
    );
}

#[tokio::test]
async fn concurrent_fetch_runs_never_double_insert() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let items: Vec<RawItem> = (0..5)
        .map(|i| {
            feed_item(
                &format!("https://example.com/{}", i),
                &marathi_title(&format!("n{}", i)),
            )
        })
        .collect();

    let make = |store: Arc<MemoryStore>| {
        orchestrator(
            store,
            ScriptedFeedClient::new().with_feed("TV9 Marathi", items.clone()),
        )
    };

    let a = make(store.clone());
    let b = make(store.clone());
    let sources = [source("TV9 Marathi")];
    let options = FetchOptions::default();

    let (ra, rb) = tokio::join!(
        a.fetch_all(&sources, &options),
        b.fetch_all(&sources, &options)
    );
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    // Every link stored exactly once, regardless of which run won each race.
    assert_eq!(store.unprocessed_count().await, 5);
    assert_eq!(ra.fetched + rb.fetched, 5);
    assert_eq!(ra.skipped_duplicate + rb.skipped_duplicate, 5);
}

#[tokio::test]
async fn rewrite_is_idempotent_per_article() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let feeds = ScriptedFeedClient::new().with_feed(
        "TV9 Marathi",
        vec![feed_item("https://example.com/a", &marathi_title("a"))],
    );
    orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi")], &FetchOptions::default())
        .await
        .unwrap();

    let stage = RewriteStage::new(store.clone(), Arc::new(EchoGenerator));

    let first = stage.process_one(None).await.unwrap();
    assert!(first.processed);
    assert_eq!(first.remaining, 0);

    let second = stage.process_one(None).await.unwrap();
    assert!(!second.processed);

    let processed = store.processed_articles().await;
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].title, "rewritten text");
    assert_eq!(processed[0].link, "https://example.com/a");

    let pending = store.unprocessed_articles().await;
    assert!(pending[0].processed);
    assert!(pending[0].processed_at.is_some());
}

#[tokio::test]
async fn rewrite_selects_oldest_pending_for_category() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let sports_kw = catalog::keywords_for("sports")[0];
    let feeds = ScriptedFeedClient::new().with_feed(
        "TV9 Marathi",
        vec![
            feed_item(
                "https://example.com/sports",
                &format!("{} {}", marathi_title("s"), sports_kw),
            ),
            feed_item("https://example.com/plain", &marathi_title("p")),
        ],
    );
    orchestrator(store.clone(), feeds)
        .fetch_all(&[source("TV9 Marathi")], &FetchOptions::default())
        .await
        .unwrap();

    let stage = RewriteStage::new(store.clone(), Arc::new(EchoGenerator));
    let outcome = stage.process_one(Some("sports")).await.unwrap();

    assert!(outcome.processed);
    let article = outcome.article.unwrap();
    assert_eq!(article.link, "https://example.com/sports");
    assert_eq!(stage.process_one(Some("sports")).await.unwrap().remaining, 0);
    // The general item is still pending.
    assert_eq!(store.count_pending(None).await.unwrap(), 1);
}
