//! Domain models for the clip insight server.

use utoipa::ToSchema;

pub mod analysis;
pub mod insight;
pub mod metric;
pub mod pattern;
pub mod video;

// Re-export commonly used types
pub use analysis::{
    ANALYSIS_VERSION, AnalysisSource, AnalysisStatusResponse, AnalyzeQuery, AnalyzeResponse,
    BatchAnalysisRequest, BatchAnalysisSummary, CampaignCategory, CanonicalAnalysis, ManualAnalysis,
    SaveManualAnalysisRequest, SaveManualAnalysisResponse, StructuredAnalysis, VideoAnalysis,
};
pub use insight::{
    BestPractice, CONTENT_TYPE_CATEGORY, GenerationSummary, GlobalInsightsResponse,
    HIGH_PERFORMER_PRACTICE, Insight, InsightStatus, ListInsightsQuery,
};
pub use metric::{MetricSnapshot, RecordMetricsRequest, engagement_rate};
pub use pattern::{
    CachedPatternInsights, ConfidenceLevel, InsufficientData, PatternCategory, PatternInsight,
    PatternOutcome, PatternReport,
};
pub use video::{
    AnalysisStatus, CreateVideoRequest, IMPORTED_CONTENT_TYPE, ImportVideosRequest,
    ImportVideosResponse, ListVideosQuery, ProviderVideo, Video, VideoListResponse,
    VideoWithMetrics,
};

/// Pagination metadata for responses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(Pagination::new(1, 10, 25).total_pages, 3);
        assert_eq!(Pagination::new(1, 10, 30).total_pages, 3);
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
    }
}
