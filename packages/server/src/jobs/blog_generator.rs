use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::retry::retry_async;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::BlogConfig;
use crate::entity::blog_post;

/// Per-request ceiling for the AI endpoints; article batches are slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "You are a financial news writer. Respond with a JSON array only, \
no prose and no code fences. Each element must have the keys: title, summary, content \
(Markdown), sourceName, sourceUrl, tags (string array), regions (string array), companies \
(string array), sector, financialFigures (string array), imagePrompt.";

/// Counts reported by one generation run.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSummary {
    pub generated: u32,
    pub failed: u32,
}

#[derive(Debug)]
pub enum GenerateError {
    /// Another run holds the single-flight guard.
    AlreadyRunning,
    /// No API endpoint/key configured.
    NotConfigured,
    /// The AI endpoint failed or returned something unusable.
    Upstream(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "a generation run is already in progress"),
            Self::NotConfigured => write!(f, "news generator is not configured"),
            Self::Upstream(msg) => write!(f, "upstream AI error: {msg}"),
        }
    }
}

/// One AI-proposed article, as returned by the chat endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleDraft {
    title: String,
    summary: String,
    content: String,
    #[serde(default)]
    source_name: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    companies: Vec<String>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    financial_figures: Vec<String>,
    #[serde(default)]
    image_prompt: Option<String>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: String,
}

/// Scheduled AI news pipeline: asks a chat endpoint for an article batch,
/// generates one image per article (retried with backoff), and persists
/// each article independently — one bad article never sinks the batch.
pub struct BlogGenerator {
    db: DatabaseConnection,
    http: reqwest::Client,
    config: BlogConfig,
    running: AtomicBool,
}

impl BlogGenerator {
    pub fn new(db: DatabaseConnection, config: BlogConfig) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            config,
            running: AtomicBool::new(false),
        }
    }

    fn is_configured(&self) -> bool {
        !self.config.api_url.is_empty() && !self.config.api_key.is_empty()
    }

    /// Start the recurring schedule, if enabled and configured.
    pub fn spawn_schedule(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.enabled {
            return None;
        }
        if !self.is_configured() {
            warn!("Blog generation is enabled but no AI endpoint is configured; not scheduling");
            return None;
        }

        let period = Duration::from_secs(self.config.interval_hours.max(1) * 3600);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the job
            // first fires one full period after startup.
            interval.tick().await;

            loop {
                interval.tick().await;
                match self.generate_now().await {
                    Ok(summary) => info!(
                        generated = summary.generated,
                        failed = summary.failed,
                        "Scheduled blog generation finished"
                    ),
                    Err(GenerateError::AlreadyRunning) => {
                        warn!("Previous generation run still in progress; skipping this tick")
                    }
                    Err(e) => error!(error = %e, "Scheduled blog generation failed"),
                }
            }
        }))
    }

    /// Run the pipeline once. Single-flight: a second caller gets
    /// `AlreadyRunning` instead of a queued run.
    pub async fn generate_now(&self) -> Result<GenerationSummary, GenerateError> {
        if !self.is_configured() {
            return Err(GenerateError::NotConfigured);
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(GenerateError::AlreadyRunning);
        }

        let result = self.run_pipeline().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_pipeline(&self) -> Result<GenerationSummary, GenerateError> {
        let drafts = self.fetch_article_drafts().await?;
        info!(count = drafts.len(), "Fetched article drafts");

        let mut generated = 0u32;
        let mut failed = 0u32;

        for draft in drafts {
            match self.persist_draft(draft).await {
                Ok(title) => {
                    generated += 1;
                    info!(title = %title, "Saved article");
                }
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "Failed to save article");
                }
            }
        }

        Ok(GenerationSummary { generated, failed })
    }

    async fn persist_draft(&self, draft: ArticleDraft) -> Result<String, String> {
        let image_url = match draft.image_prompt.as_deref() {
            Some(prompt) if !self.config.image_api_url.is_empty() => {
                // Three attempts with exponential backoff; an article
                // without an image is still worth saving.
                match retry_async(3, 1_000, 15_000, |_| self.generate_image(prompt)).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(error = %e, "Image generation exhausted retries");
                        None
                    }
                }
            }
            _ => None,
        };

        let title = draft.title.clone();
        let article = blog_post::ActiveModel {
            title: Set(draft.title),
            summary: Set(draft.summary),
            content: Set(draft.content),
            published_at: Set(chrono::Utc::now()),
            source_name: Set(draft.source_name),
            source_url: Set(draft.source_url),
            tags: Set(draft.tags),
            regions: Set(draft.regions),
            companies: Set(draft.companies),
            sector: Set(draft.sector),
            financial_figures: Set(draft.financial_figures),
            image_url: Set(image_url),
            image_prompt: Set(draft.image_prompt),
            views: Set(0),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        article.insert(&self.db).await.map_err(|e| e.to_string())?;
        Ok(title)
    }

    async fn fetch_article_drafts(&self) -> Result<Vec<ArticleDraft>, GenerateError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Generate {} finance news articles covering today's markets.",
                        self.config.articles_per_run
                    ),
                },
            ],
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| GenerateError::Upstream(e.to_string()))?
            .json::<ChatResponse>()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?;

        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| GenerateError::Upstream("empty chat response".into()))?;

        serde_json::from_str(strip_code_fences(content))
            .map_err(|e| GenerateError::Upstream(format!("unparsable article batch: {e}")))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, String> {
        let response = self
            .http
            .post(&self.config.image_api_url)
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&serde_json::json!({
                "prompt": prompt,
                "n": 1,
                "size": "1024x1024",
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?
            .json::<ImageResponse>()
            .await
            .map_err(|e| e.to_string())?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.url)
            .ok_or_else(|| "empty image response".to_string())
    }
}

/// Models wrap JSON in ```json fences despite instructions often enough
/// that stripping them unconditionally is the robust move.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
