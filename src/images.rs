//! Image resolution and re-hosting.
//!
//! Every stored article should carry a usable image. Resolution walks a
//! fixed fallback chain over the feed item, then stock-photo search:
//!
//!   1. first inline `<img>` in the item's content or description
//!   2. media thumbnail
//!   3. media content URL
//!   4. image enclosure
//!   5. stock photo keyed off the primary category
//!
//! A resolved feed image is downloaded and re-hosted in object storage so
//! published articles never hotlink the publisher's CDN. Re-hosting is
//! best effort: on download or upload failure the original URL is kept.

use crate::catalog;
use crate::types::{FeedSource, PipelineError, RawItem, Result};
use crate::utils::is_valid_url;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

static IMG_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).expect("valid regex"));

/// An image the resolver settled on, plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    /// URL to store on the article: the re-hosted copy when upload
    /// succeeded, otherwise the original.
    pub url: String,
    pub original_url: String,
    /// Credit line for stock photos, absent for feed-supplied images.
    pub attribution: Option<String>,
}

/// A stock photo hit before re-hosting.
#[derive(Debug, Clone)]
pub struct StockPhoto {
    pub url: String,
    pub attribution: String,
}

#[async_trait]
pub trait StockPhotoProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Option<StockPhoto>>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store the bytes under `key` and return the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Stock photo providers
// ---------------------------------------------------------------------------

pub struct UnsplashProvider {
    client: reqwest::Client,
    access_key: String,
}

impl UnsplashProvider {
    pub fn new(client: reqwest::Client, access_key: String) -> Self {
        Self { client, access_key }
    }
}

#[async_trait]
impl StockPhotoProvider for UnsplashProvider {
    async fn search(&self, query: &str) -> Result<Option<StockPhoto>> {
        let response = self
            .client
            .get("https://api.unsplash.com/search/photos")
            .query(&[("query", query), ("per_page", "1"), ("orientation", "landscape")])
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::General(format!(
                "unsplash search returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let photo = body["results"].get(0).and_then(|hit| {
            let url = hit["urls"]["regular"].as_str()?;
            let photographer = hit["user"]["name"].as_str().unwrap_or("Unsplash");
            Some(StockPhoto {
                url: url.to_string(),
                attribution: format!("Photo by {} on Unsplash", photographer),
            })
        });
        Ok(photo)
    }
}

pub struct PexelsProvider {
    client: reqwest::Client,
    api_key: String,
}

impl PexelsProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl StockPhotoProvider for PexelsProvider {
    async fn search(&self, query: &str) -> Result<Option<StockPhoto>> {
        let response = self
            .client
            .get("https://api.pexels.com/v1/search")
            .query(&[("query", query), ("per_page", "1"), ("orientation", "landscape")])
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::General(format!(
                "pexels search returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let photo = body["photos"].get(0).and_then(|hit| {
            let url = hit["src"]["large"].as_str()?;
            let photographer = hit["photographer"].as_str().unwrap_or("Pexels");
            Some(StockPhoto {
                url: url.to_string(),
                attribution: format!("Photo by {} on Pexels", photographer),
            })
        });
        Ok(photo)
    }
}

// ---------------------------------------------------------------------------
// Object storage over a simple HTTP bucket
// ---------------------------------------------------------------------------

/// S3-compatible bucket reached via presigned-style PUTs to
/// `{endpoint}/{key}`, served publicly from `{public_base}/{key}`.
pub struct HttpBucketStorage {
    client: reqwest::Client,
    endpoint: String,
    public_base: String,
}

impl HttpBucketStorage {
    pub fn new(client: reqwest::Client, endpoint: String, public_base: String) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpBucketStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let response = self
            .client
            .put(format!("{}/{}", self.endpoint, key))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::Storage(format!(
                "upload of {} returned {}",
                key,
                response.status()
            )));
        }
        Ok(format!("{}/{}", self.public_base, key))
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct ImageResolver {
    client: reqwest::Client,
    providers: Vec<Arc<dyn StockPhotoProvider>>,
    storage: Option<Arc<dyn ObjectStorage>>,
}

impl ImageResolver {
    pub fn new(
        client: reqwest::Client,
        providers: Vec<Arc<dyn StockPhotoProvider>>,
        storage: Option<Arc<dyn ObjectStorage>>,
    ) -> Self {
        Self {
            client,
            providers,
            storage,
        }
    }

    /// Resolve an image for the item, re-hosting feed images when object
    /// storage is configured. Returns `None` only when the whole chain
    /// comes up empty.
    pub async fn resolve(
        &self,
        item: &RawItem,
        primary_category: &str,
        source: &FeedSource,
    ) -> Option<ResolvedImage> {
        if let Some(original) = feed_image_url(item) {
            let url = self.rehost(&original, source).await;
            return Some(ResolvedImage {
                url,
                original_url: original,
                attribution: None,
            });
        }

        let query = catalog::stock_search_term(primary_category);
        for provider in &self.providers {
            match provider.search(query).await {
                Ok(Some(photo)) => {
                    let url = self.rehost(&photo.url, source).await;
                    return Some(ResolvedImage {
                        url,
                        original_url: photo.url,
                        attribution: Some(photo.attribution),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(query, error = %e, "Stock photo search failed, trying next provider");
                }
            }
        }
        None
    }

    /// Download and re-upload; any failure falls back to the original URL.
    async fn rehost(&self, original: &str, source: &FeedSource) -> String {
        let storage = match &self.storage {
            Some(s) => s,
            None => return original.to_string(),
        };

        match self.download_and_store(original, source, storage.as_ref()).await {
            Ok(hosted) => hosted,
            Err(e) => {
                warn!(url = original, error = %e, "Image re-host failed, keeping original URL");
                original.to_string()
            }
        }
    }

    async fn download_and_store(
        &self,
        original: &str,
        source: &FeedSource,
        storage: &dyn ObjectStorage,
    ) -> Result<String> {
        let response = self.client.get(original).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::Storage(format!(
                "image download returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        let key = format!(
            "news-images/{}/{}-{}{}",
            source.slug(),
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension_for(&content_type)
        );

        let hosted = storage.put(&key, bytes, &content_type).await?;
        debug!(key, "Re-hosted article image");
        Ok(hosted)
    }
}

/// First usable image URL carried by the feed item itself, in fallback
/// order: inline markup, thumbnail, media content, image enclosure.
pub fn feed_image_url(item: &RawItem) -> Option<String> {
    let inline = [item.content.as_deref(), item.description.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|html| {
            IMG_SRC_RE
                .captures(html)
                .map(|c| c[1].to_string())
        });

    let enclosure = item.enclosure_url.as_deref().filter(|_| {
        item.enclosure_type
            .as_deref()
            .map(|t| t.starts_with("image/"))
            .unwrap_or(false)
    });

    // A candidate with a broken URL drops out and the next one is tried.
    [
        inline,
        item.thumbnail_url.clone(),
        item.media_url.clone(),
        enclosure.map(|s| s.to_string()),
    ]
    .into_iter()
    .flatten()
    .find(|url| is_valid_url(url))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type.split(';').next().unwrap_or("").trim() {
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        _ => ".jpg",
    }
}
