//! Analysis provider: the vision/LLM collaborator that turns a prompt (and
//! optionally a thumbnail) into a structured analysis reply.
//!
//! The provider sits behind the [`AnalysisProvider`] trait so ingestion and
//! batch runs can be driven by a scripted provider in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderSettings;
use crate::entity::{metric_snapshot, video};
use crate::error::AppError;

/// HTTP connect timeout for provider calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Messages API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Marker in a 400 error message when the provider could not fetch the image.
const IMAGE_FETCH_MARKER: &str = "Unable to download";

/// One provider call: the prompt plus an optional image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub image_url: Option<String>,
}

impl AnalysisRequest {
    /// Same prompt without the image part.
    pub fn text_only(&self) -> Self {
        Self {
            prompt: self.prompt.clone(),
            image_url: None,
        }
    }
}

/// Provider failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not download the image it was given.
    #[error("provider could not fetch image: {0}")]
    ImageFetch(String),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider returned no text content")]
    EmptyResponse,

    #[error("analysis provider is not configured")]
    NotConfigured,
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

/// A vision/LLM backend that answers one analysis request with raw text.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, ProviderError>;
}

/// Call the provider, retrying once as text-only when the image could not be fetched.
///
/// Every other failure is returned as-is.
pub async fn request_analysis(
    provider: &dyn AnalysisProvider,
    request: &AnalysisRequest,
) -> Result<String, ProviderError> {
    match provider.complete(request).await {
        Err(ProviderError::ImageFetch(message)) if request.image_url.is_some() => {
            warn!(
                error = %message,
                "Provider could not fetch thumbnail; retrying without image"
            );
            provider.complete(&request.text_only()).await
        }
        other => other,
    }
}

/// Build the provider for the given settings.
///
/// Without an API key the returned provider fails every call with
/// [`ProviderError::NotConfigured`].
pub fn from_settings(
    settings: &ProviderSettings,
) -> Result<Arc<dyn AnalysisProvider>, ProviderError> {
    match AnthropicProvider::new(settings) {
        Ok(provider) => Ok(Arc::new(provider)),
        Err(ProviderError::NotConfigured) => {
            warn!("ANTHROPIC_API_KEY not set; video analysis is disabled");
            Ok(Arc::new(UnconfiguredProvider))
        }
        Err(e) => Err(e),
    }
}

/// Stand-in used when no API key is configured.
pub struct UnconfiguredProvider;

#[async_trait]
impl AnalysisProvider for UnconfiguredProvider {
    async fn complete(&self, _request: &AnalysisRequest) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}

// ============================================================================
// Anthropic Messages API
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn messages_body<'a>(
    model: &'a str,
    max_tokens: u32,
    request: &'a AnalysisRequest,
) -> MessagesRequest<'a> {
    let mut content = Vec::with_capacity(2);
    if let Some(ref url) = request.image_url {
        content.push(ContentPart::Image {
            source: ImageSource { kind: "url", url },
        });
    }
    content.push(ContentPart::Text {
        text: &request.prompt,
    });

    MessagesRequest {
        model,
        max_tokens,
        messages: vec![Message {
            role: "user",
            content,
        }],
    }
}

/// Map a non-success response to a provider error.
fn classify_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if status == 400 && message.contains(IMAGE_FETCH_MARKER) {
        ProviderError::ImageFetch(message)
    } else {
        ProviderError::Api { status, message }
    }
}

/// First text block of a reply.
fn first_text(response: MessagesResponse) -> Result<String, ProviderError> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)
}

/// Client for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or(ProviderError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            endpoint: format!("{}/v1/messages", settings.base_url.trim_end_matches('/')),
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl AnalysisProvider for AnthropicProvider {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, ProviderError> {
        debug!(
            model = %self.model,
            with_image = request.image_url.is_some(),
            "Sending analysis request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&messages_body(&self.model, self.max_tokens, request))
            .send()
            .await
            .map_err(|e| {
                warn!("Analysis provider request failed: {}", e);
                ProviderError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_error(status.as_u16(), &body);
            warn!(status = status.as_u16(), "Analysis provider error: {}", err);
            return Err(err);
        }

        let reply: MessagesResponse = response.json().await.map_err(|e| {
            warn!("Failed to decode provider reply: {}", e);
            ProviderError::Transport(format!("invalid reply: {}", e))
        })?;

        first_text(reply)
    }
}

// ============================================================================
// Prompt construction and reply extraction
// ============================================================================

fn or_na(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("N/A")
}

/// Build the provider request for a video and its latest counters.
///
/// When the video has a thumbnail it is attached and the prompt asks the
/// model to read visual details from it.
pub fn build_analysis_request(
    video: &video::Model,
    snapshot: Option<&metric_snapshot::Model>,
) -> AnalysisRequest {
    let image_url = video
        .thumbnail_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from);

    AnalysisRequest {
        prompt: build_analysis_prompt(video, snapshot, image_url.is_some()),
        image_url,
    }
}

/// Analysis prompt text.
pub fn build_analysis_prompt(
    video: &video::Model,
    snapshot: Option<&metric_snapshot::Model>,
    has_image: bool,
) -> String {
    let (views, likes, comments, shares) = snapshot
        .map(|s| (s.views, s.likes, s.comments, s.shares))
        .unwrap_or_default();
    let engagement = snapshot
        .and_then(|s| s.engagement_rate)
        .filter(|r| *r != 0.0)
        .map(|r| format!("{:.2}", r))
        .unwrap_or_else(|| "N/A".to_string());
    let duration = video
        .duration_seconds
        .map(|d| format!("{} seconds", d))
        .unwrap_or_else(|| "Unknown".to_string());
    let url = video.tiktok_url.as_deref().or(video.file_url.as_deref());

    let mut prompt = String::from(
        "You are analyzing a TikTok Shop video for fashion/beauty e-commerce. Extract structured insights.\n\n",
    );

    if has_image {
        prompt.push_str(
            "IMPORTANT: The video thumbnail is attached above. Read the actual image for visual details:\n\
             - Text overlays visible on the video\n\
             - Environment, lighting and colors\n\
             - The model's appearance and what they are doing\n\
             - Product display method and positioning\n\
             - Camera angle and framing\n\n",
        );
    } else {
        prompt.push_str("NOTE: No image provided; infer visuals from the text context.\n\n");
    }

    prompt.push_str(&format!(
        "VIDEO CONTEXT:\n\
         - URL: {}\n\
         - Title/Hook: {}\n\
         - Caption: {}\n\
         - Description: {}\n\
         - Existing Script: {}\n\
         - Duration: {}\n\n\
         PERFORMANCE:\n\
         - Views: {}\n\
         - Likes: {}\n\
         - Comments: {}\n\
         - Shares: {}\n\
         - Engagement Rate: {}%\n\n",
        or_na(url),
        or_na(video.hook.as_deref()),
        or_na(video.caption.as_deref()),
        or_na(video.description.as_deref()),
        or_na(video.script.as_deref()),
        duration,
        views,
        likes,
        comments,
        shares,
        engagement,
    ));

    let visual_source = if has_image {
        "from the provided image"
    } else {
        "from the text context"
    };

    prompt.push_str(&format!(
        "ANALYSIS REQUIRED (JSON, base visual fields {visual_source}):\n\n\
         1. hook: text, duration (seconds, usually 0-3), type (one of \"pattern_interrupt\", \"curiosity_gap\", \"social_proof\", \"problem_agitation\", \"bold_claim\"), visualElement, effectivenessScore (1-10)\n\
         2. script: fullTranscript, keyMessages (3-5 selling points), voiceoverStyle (one of \"professional\", \"casual\", \"energetic\", \"educational\")\n\
         3. visual: environment (one of \"urban_street\", \"studio\", \"lifestyle_home\", \"outdoor_nature\", \"other\"), lighting (one of \"natural_daylight\", \"studio_lighting\", \"golden_hour\", \"night\", \"mixed\"), cameraAngles, modelDescription, productDisplay (one of \"worn\", \"held\", \"demonstrated\", \"flat_lay\", \"other\"), colorPalette, sceneBreakdown (array of {{timestamp, description, transition}})\n\
         4. classification: primary (one of \"product_demo\", \"lifestyle\", \"unboxing\", \"testimonial\", \"before_after\", \"tutorial\", \"trend_participation\"), secondary (optional)\n\
         5. cta: extracted, primary, type (one of \"shop_now\", \"link_in_bio\", \"follow\", \"comment\", \"duet_stitch\", \"visit_page\", \"none\"), placement (one of \"opening\", \"middle\", \"closing\", \"throughout\", \"none\"), urgency (one of \"high\", \"medium\", \"low\", \"none\")\n\
         6. campaign: category (one of \"product_launch\", \"seasonal\", \"influencer_collab\", \"organic_content\")\n\
         7. performance_factors: strengths (3-5), winning_patterns (2-3)\n\
         8. metadata: confidence (0.00-1.00{confidence_hint})\n\n\
         Return ONLY valid JSON. No markdown formatting, no explanation.",
        visual_source = visual_source,
        confidence_hint = if has_image {
            ", higher when the image is clear"
        } else {
            ", lower when data is limited"
        },
    ));

    prompt
}

/// JSON text inside a reply, unwrapping a fenced ```json block when present.
pub fn extract_json(reply: &str) -> &str {
    if let Some(start) = reply.find("```") {
        let rest = &reply[start + 3..];
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }
    reply.trim()
}

// ============================================================================
// Scripted provider for tests
// ============================================================================

#[cfg(any(test, feature = "test-support"))]
pub mod mock {
    use std::sync::{Mutex, MutexGuard};

    use super::*;

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Provider that replays queued results (FIFO) and records every request.
    ///
    /// An empty queue answers with [`ProviderError::EmptyResponse`].
    #[derive(Default)]
    pub struct MockProvider {
        responses: Mutex<Vec<Result<String, ProviderError>>>,
        calls: Mutex<Vec<AnalysisRequest>>,
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn enqueue(&self, response: Result<String, ProviderError>) {
            lock(&self.responses).push(response);
        }

        pub fn enqueue_text(&self, text: &str) {
            self.enqueue(Ok(text.to_string()));
        }

        pub fn call_count(&self) -> usize {
            lock(&self.calls).len()
        }

        /// Requests received so far, oldest first.
        pub fn calls(&self) -> Vec<AnalysisRequest> {
            lock(&self.calls).clone()
        }
    }

    #[async_trait]
    impl AnalysisProvider for MockProvider {
        async fn complete(&self, request: &AnalysisRequest) -> Result<String, ProviderError> {
            lock(&self.calls).push(request.clone());

            let mut responses = lock(&self.responses);
            if responses.is_empty() {
                Err(ProviderError::EmptyResponse)
            } else {
                responses.remove(0)
            }
        }
    }
}
