pub mod catalog;
pub mod classifier;
pub mod dedup;
pub mod feeds;
pub mod fetcher;
pub mod images;
pub mod rewrite;
pub mod store;
pub mod types;
pub mod utils;

pub use classifier::{Classification, ClassifierConfig, ContentClassifier};
pub use dedup::Deduplicator;
pub use feeds::{default_sources, FeedClient, HttpFeedClient};
pub use fetcher::FetchOrchestrator;
pub use images::{
    HttpBucketStorage, ImageResolver, ObjectStorage, PexelsProvider, ResolvedImage,
    StockPhotoProvider, UnsplashProvider,
};
pub use rewrite::{GeminiClient, RewriteStage, TextGenerator};
pub use store::{ArticleStore, MemoryStore, PgStore};
pub use types::*;
