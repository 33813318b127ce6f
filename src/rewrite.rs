//! AI rewrite stage.
//!
//! Pulls one pending article at a time, rewrites its title and body with
//! the generative-text service and persists the result. Each of the two
//! rewrite calls fails independently: a failed body call falls back to the
//! truncated original text, a failed title call keeps the original title.
//! Rate limits are retried with exponential backoff plus jitter before the
//! fallback kicks in.

use crate::store::ArticleStore;
use crate::types::{PipelineError, ProcessOutcome, ProcessedArticle, Result};
use crate::utils::{strip_html, truncate_chars, truncate_with_ellipsis};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Retries after the initial attempt, rate-limit responses only.
const MAX_RATE_LIMIT_RETRIES: usize = 3;
/// Fallback body length when the rewrite call fails outright.
const FALLBACK_BODY_CHARS: usize = 500;
/// How much cleaned article text the title prompt sees.
const TITLE_CONTEXT_CHARS: usize = 300;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One generation call. Rate limits surface as
    /// [`PipelineError::RateLimited`] so the caller can retry.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Google Gemini client over the public REST endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(PipelineError::MissingCredentials("GEMINI_API_KEY"));
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PipelineError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(PipelineError::Generation(format!(
                "generation endpoint returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| {
                PipelineError::Generation("response carried no candidate text".to_string())
            })
    }
}

/// Retry wrapper for rate-limited generation calls. The delay doubles each
/// attempt with jitter; any non-rate-limit error aborts immediately.
pub async fn generate_with_retry(generator: &dyn TextGenerator, prompt: &str) -> Result<String> {
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(2),
        randomization_factor: 0.3,
        multiplier: 2.0,
        max_interval: Duration::from_secs(60),
        max_elapsed_time: None,
        ..Default::default()
    };

    for attempt in 0..=MAX_RATE_LIMIT_RETRIES {
        match generator.generate(prompt).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_rate_limit() && attempt < MAX_RATE_LIMIT_RETRIES => {
                let delay = backoff
                    .next_backoff()
                    .unwrap_or(Duration::from_secs(2));
                warn!(
                    attempt = attempt + 1,
                    wait_secs = delay.as_secs_f64(),
                    "Generation rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    Err(PipelineError::RateLimited)
}

fn body_prompt(title: &str, source: &str, content: &str) -> String {
    format!(
        "तुम्ही मराठी न्यूज एडिटर आहात.\n\nखालील संपूर्ण बातमी पुन्हा लिहा. मजकूर लांब, तपशीलवार आणि वाचनीय असावा.\n\nनियम:\n- मूळ मजकूर कॉपी करू नका - पूर्णपणे मूळ लिहा\n- संपूर्ण बातमी पुन्हा लिहा (सारांश नाही)\n- मूळ लांबी जवळजवळ कायम ठेवा किंवा थोडी वाढवा\n- सर्व महत्त्वाची माहिती, पार्श्वभूमी आणि संदर्भ समाविष्ट करा\n- साधी, स्पष्ट आणि प्रवाही मराठी वापरा\n- मत मांडू नका, फक्त तथ्यांवर लक्ष द्या\n\nशीर्षक: {title}\nस्रोत: {source}\nमूळ बातमी:\n{content}\n\nफक्त पुन्हा लिहिलेली संपूर्ण बातमी द्या.",
        title = title,
        source = source,
        content = content,
    )
}

fn title_prompt(title: &str, context: &str) -> String {
    format!(
        "तुम्ही मराठी न्यूज हेडलाइन एडिटर आहात.\n\nखालील बातमीचे शीर्षक पुन्हा लिहा.\n\nनियम:\n- मूळ शीर्षक कॉपी करू नका - पूर्णपणे नवीन लिहा\n- 10-15 शब्दांत ठेवा\n- मुख्य माहिती समाविष्ट करा\n- आकर्षक पण क्लिकबेट नसलेले\n- साधी स्पष्ट मराठी\n\nमूळ शीर्षक: {title}\nबातमी सारांश: {context}\n\nफक्त नवीन शीर्षक द्या, कोणतेही स्पष्टीकरण किंवा अवतरण चिन्ह नाही.",
        title = title,
        context = context,
    )
}

/// Strip quote characters a model sometimes wraps a headline in.
fn trim_wrapping_quotes(s: &str) -> &str {
    s.trim_matches(|c| {
        matches!(
            c,
            '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}'
        )
    })
    .trim()
}

pub struct RewriteStage {
    store: Arc<dyn ArticleStore>,
    generator: Arc<dyn TextGenerator>,
}

impl RewriteStage {
    pub fn new(store: Arc<dyn ArticleStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }

    /// Process the single oldest pending article, optionally constrained to
    /// a category. Inserting the processed row and flipping the pending
    /// flag are two separate writes; a duplicate-key error on the insert
    /// means a concurrent run already produced the row, so it is ignored
    /// and the flag flip proceeds.
    pub async fn process_one(&self, category: Option<&str>) -> Result<ProcessOutcome> {
        let article = match self.store.find_oldest_pending(category).await? {
            Some(a) => a,
            None => {
                debug!(?category, "No pending articles");
                return Ok(ProcessOutcome {
                    processed: false,
                    remaining: self.store.count_pending(category).await?,
                    article: None,
                });
            }
        };

        info!(link = %article.link, source = %article.source_name, "Rewriting article");

        let raw = if article.content.is_empty() {
            &article.description
        } else {
            &article.content
        };
        let clean = strip_html(raw);

        let rewritten_description = match generate_with_retry(
            self.generator.as_ref(),
            &body_prompt(&article.title, &article.source_name, &clean),
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Body rewrite failed, using truncated original");
                if clean.is_empty() {
                    article.title.clone()
                } else {
                    truncate_with_ellipsis(&clean, FALLBACK_BODY_CHARS)
                }
            }
        };

        let title = match generate_with_retry(
            self.generator.as_ref(),
            &title_prompt(&article.title, truncate_chars(&clean, TITLE_CONTEXT_CHARS)),
        )
        .await
        {
            Ok(text) => {
                let trimmed = trim_wrapping_quotes(&text).to_string();
                if trimmed.is_empty() {
                    article.title.clone()
                } else {
                    trimmed
                }
            }
            Err(e) => {
                warn!(error = %e, "Title rewrite failed, keeping original");
                article.title.clone()
            }
        };

        let now = Utc::now();
        let processed = ProcessedArticle {
            id: Uuid::new_v4(),
            source_name: article.source_name.clone(),
            title,
            original_title: article.title.clone(),
            rewritten_description,
            original_description: article.description.clone(),
            link: article.link.clone(),
            image_url: article.image_url.clone(),
            original_image_url: article.original_image_url.clone(),
            categories: article.categories.clone(),
            language: article.language.clone(),
            published_at: article.published_at,
            processed_at: now,
            unprocessed_id: article.id,
        };

        match self.store.insert_processed(&processed).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                debug!(link = %processed.link, "Processed row already exists, skipping insert");
            }
            Err(e) => return Err(e),
        }

        self.store.mark_processed(article.id, now).await?;

        let remaining = self.store.count_pending(category).await?;
        info!(remaining, "Article rewritten");

        Ok(ProcessOutcome {
            processed: true,
            remaining,
            article: Some(processed),
        })
    }
}
