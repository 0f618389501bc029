//! Video domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{MetricSnapshot, Pagination};
use crate::entity::video;

/// Analysis lifecycle of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Waiting for analysis.
    Pending,
    /// Analysis call in flight.
    Processing,
    /// Analysis stored with sufficient confidence.
    Completed,
    /// Analysis stored but flagged for human review.
    NeedsReview,
    /// Last analysis attempt failed.
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::NeedsReview => "needs_review",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "needs_review" => Some(Self::NeedsReview),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// States from which a new analysis may start.
    pub fn startable() -> [Self; 4] {
        [
            Self::Pending,
            Self::Failed,
            Self::Completed,
            Self::NeedsReview,
        ]
    }

    /// Terminal state after a stored analysis.
    pub fn after_analysis(needs_review: bool) -> Self {
        if needs_review {
            Self::NeedsReview
        } else {
            Self::Completed
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Video asset as exposed by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub user_id: String,
    pub filename: String,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tiktok_video_id: Option<String>,
    pub tiktok_url: Option<String>,
    pub hook: Option<String>,
    pub caption: Option<String>,
    pub script: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub campaign_tag: Option<String>,
    pub duration_seconds: Option<i32>,
    pub analysis_status: AnalysisStatus,
    pub analysis_priority: i32,
    pub upload_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<video::Model> for Video {
    fn from(m: video::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            filename: m.filename,
            file_url: m.file_url,
            thumbnail_url: m.thumbnail_url,
            tiktok_video_id: m.tiktok_video_id,
            tiktok_url: m.tiktok_url,
            hook: m.hook,
            caption: m.caption,
            script: m.script,
            description: m.description,
            content_type: m.content_type,
            campaign_tag: m.campaign_tag,
            duration_seconds: m.duration_seconds,
            analysis_status: AnalysisStatus::parse(&m.analysis_status)
                .unwrap_or(AnalysisStatus::Pending),
            analysis_priority: m.analysis_priority,
            upload_date: m.upload_date,
            created_at: m.created_at,
        }
    }
}

/// Video with its most recent metric snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoWithMetrics {
    #[serde(flatten)]
    pub video: Video,
    pub current_metrics: Option<MetricSnapshot>,
}

/// Request to register a video (upload already handled by object storage).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub filename: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tiktok_url: Option<String>,
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub campaign_tag: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<i32>,
    #[serde(default)]
    pub analysis_priority: i32,
}

impl CreateVideoRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.filename.trim().is_empty() {
            return Err("filename is required".to_string());
        }
        if let Some(ref hook) = self.hook
            && hook.chars().count() > 280
        {
            return Err("hook must be less than 280 characters".to_string());
        }
        if let Some(ref caption) = self.caption
            && caption.chars().count() > 2200
        {
            return Err("caption must be less than 2200 characters".to_string());
        }
        if let Some(duration) = self.duration_seconds
            && duration < 0
        {
            return Err("duration_seconds must not be negative".to_string());
        }
        Ok(())
    }
}

/// Query parameters for listing videos.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ListVideosQuery {
    /// Case-insensitive match against hook, caption, description and filename.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub campaign_tag: Option<String>,
    #[serde(default)]
    pub status: Option<AnalysisStatus>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

impl ListVideosQuery {
    /// Limit clamped to 1..=100.
    pub fn clamped_limit(&self) -> u64 {
        self.limit.clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.clamped_limit()
    }
}

/// Paginated video list.
#[derive(Debug, Serialize, ToSchema)]
pub struct VideoListResponse {
    pub data: Vec<VideoWithMetrics>,
    pub pagination: Pagination,
}

/// One video record as returned by the short-video provider's list endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProviderVideo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub video_description: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub embed_html: Option<String>,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub duration: Option<i32>,
    /// Unix seconds.
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub share_count: i64,
}

/// Content type assigned to videos created from a provider import.
pub const IMPORTED_CONTENT_TYPE: &str = "TikTok Import";

impl ProviderVideo {
    /// Hook fallback: first 50 characters of the title.
    pub fn hook_fallback(&self) -> Option<String> {
        let hook: String = self.title.chars().take(50).collect();
        if hook.is_empty() { None } else { Some(hook) }
    }

    pub fn filename(&self) -> String {
        if self.title.trim().is_empty() {
            format!("tiktok_{}", self.id)
        } else {
            self.title.clone()
        }
    }
}

/// Batch of provider records to import for the caller.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImportVideosRequest {
    /// Account handle used to build canonical video URLs.
    #[serde(default)]
    pub account_handle: Option<String>,
    pub videos: Vec<ProviderVideo>,
}

/// Result of a provider import.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ImportVideosResponse {
    pub created: u32,
    pub snapshots_recorded: u32,
}
