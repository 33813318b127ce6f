use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use varta_pipeline::{
    default_sources, ContentClassifier, FetchOptions, FetchOrchestrator, GeminiClient,
    HttpBucketStorage, HttpFeedClient, ImageResolver, ObjectStorage, PexelsProvider, PgStore,
    RewriteStage, StockPhotoProvider, UnsplashProvider,
};

#[derive(Parser)]
#[command(name = "varta-pipeline", about = "Marathi news ingestion and rewrite pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one fetch pass over the configured sources
    Fetch {
        /// Max accepted items per source
        #[arg(long, default_value_t = 6)]
        per_source_limit: usize,
        /// Max accepted items across all sources
        #[arg(long, default_value_t = 18)]
        total_limit: usize,
        /// Only keep items whose detected categories include this key
        #[arg(long)]
        category: Option<String>,
        /// Enforce allow-keyword and blocklist filtering
        #[arg(long)]
        strict: bool,
    },
    /// Rewrite the oldest pending article
    Process {
        /// Only consider pending articles in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Count pending articles
    Remaining {
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let store = Arc::new(
        PgStore::connect(&database_url)
            .await
            .context("failed to connect to the article store")?,
    );

    match cli.command {
        Command::Fetch {
            per_source_limit,
            total_limit,
            category,
            strict,
        } => {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?;

            let mut providers: Vec<Arc<dyn StockPhotoProvider>> = Vec::new();
            if let Ok(key) = env::var("UNSPLASH_ACCESS_KEY") {
                providers.push(Arc::new(UnsplashProvider::new(http.clone(), key)));
            }
            if let Ok(key) = env::var("PEXELS_API_KEY") {
                providers.push(Arc::new(PexelsProvider::new(http.clone(), key)));
            }

            let storage: Option<Arc<dyn ObjectStorage>> = match (
                env::var("IMAGE_BUCKET_ENDPOINT"),
                env::var("IMAGE_PUBLIC_BASE_URL"),
            ) {
                (Ok(endpoint), Ok(public_base)) => Some(Arc::new(HttpBucketStorage::new(
                    http.clone(),
                    endpoint,
                    public_base,
                ))),
                _ => {
                    info!("Object storage not configured, keeping original image URLs");
                    None
                }
            };

            let orchestrator = FetchOrchestrator::new(
                store,
                Arc::new(HttpFeedClient::new()?),
                Arc::new(ContentClassifier::default()),
                Arc::new(ImageResolver::new(http, providers, storage)),
            );

            let options = FetchOptions {
                per_source_limit,
                total_limit,
                category,
                strict_filter: strict,
                ..Default::default()
            };

            let report = orchestrator.fetch_all(&default_sources(), &options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Process { category } => {
            let api_key =
                env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()?;

            let stage = RewriteStage::new(store, Arc::new(GeminiClient::new(http, api_key)));
            let outcome = stage.process_one(category.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Remaining { category } => {
            use varta_pipeline::ArticleStore;
            let remaining = store.count_pending(category.as_deref()).await?;
            println!("{}", remaining);
        }
    }

    Ok(())
}
