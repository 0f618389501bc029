//! Analysis ingestion: converts provider replies and manual entries into the
//! canonical attribute set, stores them, and drives a video's analysis status.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use super::provider::{
    AnalysisProvider, build_analysis_request, extract_json, request_analysis,
};
use crate::db::DbPool;
use crate::entity::{video, video_analysis};
use crate::error::{AppError, AppResult};
use crate::models::{
    AnalysisSource, AnalysisStatus, AnalyzeResponse, CampaignCategory, CanonicalAnalysis,
    ManualAnalysis, SaveManualAnalysisRequest, StructuredAnalysis,
};

/// Caption keywords that mark a seasonal campaign, checked in order.
pub const SEASONAL_KEYWORDS: [&str; 9] = [
    "summer",
    "winter",
    "fall",
    "spring",
    "holiday",
    "valentine",
    "newyear",
    "christmas",
    "blackfriday",
];

/// Tag prefix used when the primary content type is unknown.
const FALLBACK_TAG_PREFIX: &str = "content";

fn owned<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Map a provider analysis onto the canonical attribute set.
///
/// Confidence is clamped to `0.0..=1.0`; a missing score counts as zero, so
/// such analyses are always flagged for review.
pub fn from_structured(
    payload: StructuredAnalysis,
    raw_payload: JsonValue,
    review_threshold: f64,
) -> CanonicalAnalysis {
    let confidence = payload.metadata.confidence.map(|c| c.clamp(0.0, 1.0));
    let needs_human_review = confidence.unwrap_or(0.0) < review_threshold;

    let StructuredAnalysis {
        hook,
        script,
        visual,
        classification,
        cta,
        campaign,
        ..
    } = payload;

    CanonicalAnalysis {
        source: AnalysisSource::Ai,
        hook_text: hook.text,
        hook_type: owned(hook.hook_type),
        hook_visual_element: hook.visual_element,
        hook_effectiveness_score: hook.effectiveness_score,
        hook_duration_seconds: hook.duration,
        caption_cta: cta.extracted,
        full_script: script.full_transcript,
        script_key_messages: script.key_messages,
        voiceover_style: owned(script.voiceover_style),
        visual_environment: owned(visual.environment),
        visual_lighting: owned(visual.lighting),
        visual_camera_angles: visual.camera_angles,
        visual_model_description: visual.model_description,
        visual_product_display: owned(visual.product_display),
        visual_color_palette: visual.color_palette,
        visual_scene_breakdown: visual.scene_breakdown,
        content_type_primary: owned(classification.primary),
        content_type_secondary: classification.secondary,
        cta_primary: cta.primary,
        cta_type: owned(cta.cta_type),
        cta_placement: owned(cta.placement),
        cta_urgency: owned(cta.urgency),
        campaign_category: owned(campaign.category),
        raw_payload,
        confidence_score: confidence,
        needs_human_review,
        performance_tracked: false,
    }
}

/// Map a manual entry onto the canonical attribute set.
///
/// Manual entries carry no confidence and are never flagged for review.
pub fn from_manual(manual: ManualAnalysis, raw_payload: JsonValue) -> CanonicalAnalysis {
    let hook = manual.hook.unwrap_or_default();
    let caption = manual.caption.unwrap_or_default();
    let script = manual.script.unwrap_or_default();
    let visual = manual.visual.unwrap_or_default();
    let classification = manual.classification.unwrap_or_default();
    let cta = manual.cta.unwrap_or_default();
    let campaign = manual.campaign.unwrap_or_default();

    CanonicalAnalysis {
        source: AnalysisSource::Manual,
        hook_text: non_blank(hook.text),
        hook_type: non_blank(hook.hook_type),
        hook_visual_element: non_blank(hook.visual_element),
        hook_effectiveness_score: hook.effectiveness_score,
        hook_duration_seconds: hook.duration,
        caption_cta: non_blank(caption.cta),
        full_script: non_blank(script.full_transcript),
        script_key_messages: script.key_messages,
        voiceover_style: non_blank(script.voiceover_style),
        visual_environment: non_blank(visual.environment),
        visual_lighting: non_blank(visual.lighting),
        visual_camera_angles: visual.camera_angles,
        visual_model_description: non_blank(visual.model_description),
        visual_product_display: non_blank(visual.product_display_method),
        visual_color_palette: visual.color_palette,
        visual_scene_breakdown: Vec::new(),
        content_type_primary: non_blank(classification.primary),
        content_type_secondary: non_blank(classification.secondary),
        cta_primary: non_blank(cta.primary),
        cta_type: non_blank(cta.cta_type),
        cta_placement: non_blank(cta.placement),
        cta_urgency: non_blank(cta.urgency),
        campaign_category: non_blank(campaign.category),
        raw_payload,
        confidence_score: None,
        needs_human_review: false,
        performance_tracked: manual.performance.is_some(),
    }
}

/// Parse a provider reply (optionally fenced) into a canonical analysis.
pub fn parse_structured(reply: &str, review_threshold: f64) -> AppResult<CanonicalAnalysis> {
    let raw: JsonValue = serde_json::from_str(extract_json(reply))
        .map_err(|e| AppError::AnalysisParse(format!("reply is not valid JSON: {}", e)))?;

    let payload: StructuredAnalysis = serde_json::from_value(raw.clone())
        .map_err(|e| AppError::AnalysisParse(format!("reply does not match schema: {}", e)))?;

    Ok(from_structured(payload, raw, review_threshold))
}

/// Parse and validate a manual analysis body.
pub fn parse_manual(raw: JsonValue) -> AppResult<CanonicalAnalysis> {
    let manual: ManualAnalysis = serde_json::from_value(raw.clone())
        .map_err(|e| AppError::InvalidInput(format!("Invalid analysis: {}", e)))?;

    if !manual.has_attribute_group() {
        return Err(AppError::InvalidInput(
            "analysis must include at least one of hook, script, visual, classification, cta or campaign"
                .to_string(),
        ));
    }

    Ok(from_manual(manual, raw))
}

fn tag_slug(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Campaign tag for an analyzed video.
///
/// A seasonal keyword in the caption wins, then the campaign category
/// (`launch_` / `collab_`), then the primary content type.
pub fn campaign_tag(
    caption: Option<&str>,
    campaign_category: Option<&str>,
    content_type_primary: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let period = now.format("%Y-%m");
    let caption = caption.unwrap_or_default().to_lowercase();

    if let Some(keyword) = SEASONAL_KEYWORDS.iter().find(|k| caption.contains(*k)) {
        return format!("{}_{}", keyword, period);
    }

    let category = campaign_category.map(tag_slug);
    match category.as_deref().and_then(CampaignCategory::parse) {
        Some(CampaignCategory::ProductLaunch) => return format!("launch_{}", period),
        Some(CampaignCategory::InfluencerCollab) => return format!("collab_{}", period),
        _ => {}
    }

    let prefix = content_type_primary
        .map(tag_slug)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| FALLBACK_TAG_PREFIX.to_string());
    format!("{}_{}", prefix, period)
}

/// Tag the video unless a tag is already set.
async fn apply_campaign_tag(
    pool: &DbPool,
    video: &video::Model,
    analysis: &CanonicalAnalysis,
) -> AppResult<()> {
    if video.campaign_tag.is_some() {
        return Ok(());
    }

    let tag = campaign_tag(
        video.caption.as_deref(),
        analysis.campaign_category.as_deref(),
        analysis.content_type_primary.as_deref(),
        Utc::now(),
    );
    pool.set_campaign_tag_if_absent(video.id, &tag).await?;
    Ok(())
}

/// Analyze one video with the provider.
///
/// Without `force`, an existing analysis is returned untouched. Otherwise the
/// video is moved to `processing` (rejected with `Conflict` if another run
/// holds it), the provider is called, and the result replaces any previous
/// analysis. Any failure leaves the video `failed` with the error recorded.
pub async fn analyze_video(
    pool: &DbPool,
    provider: &dyn AnalysisProvider,
    review_threshold: f64,
    video: &video::Model,
    force: bool,
) -> AppResult<AnalyzeResponse> {
    if !force && let Some(existing) = pool.get_analysis_by_video(video.id).await? {
        return Ok(AnalyzeResponse {
            success: true,
            analysis_id: existing.id,
            needs_review: existing.needs_human_review,
            status: AnalysisStatus::parse(&video.analysis_status)
                .unwrap_or(AnalysisStatus::after_analysis(existing.needs_human_review)),
            is_existing: true,
        });
    }

    if !pool.try_begin_analysis(video.id).await? {
        return Err(AppError::Conflict(format!(
            "Analysis already in progress for video {}",
            video.id
        )));
    }

    match run_analysis(pool, provider, review_threshold, video).await {
        Ok(response) => Ok(response),
        Err(e) => {
            warn!(video_id = %video.id, "Video analysis failed: {}", e);
            if let Err(status_err) = pool
                .set_analysis_status(video.id, AnalysisStatus::Failed, Some(e.to_string()))
                .await
            {
                error!(video_id = %video.id, "Failed to mark analysis failed: {}", status_err);
            }
            Err(e)
        }
    }
}

async fn run_analysis(
    pool: &DbPool,
    provider: &dyn AnalysisProvider,
    review_threshold: f64,
    video: &video::Model,
) -> AppResult<AnalyzeResponse> {
    let snapshot = pool.latest_snapshot(video.id).await?;
    let request = build_analysis_request(video, snapshot.as_ref());

    let reply = request_analysis(provider, &request).await?;
    let analysis = parse_structured(&reply, review_threshold)?;

    let stored = pool
        .upsert_video_analysis(video.id, &video.user_id, &analysis)
        .await?;
    apply_campaign_tag(pool, video, &analysis).await?;

    let status = AnalysisStatus::after_analysis(analysis.needs_human_review);
    pool.set_analysis_status(video.id, status, None).await?;

    info!(
        video_id = %video.id,
        analysis_id = %stored.id,
        confidence = ?analysis.confidence_score,
        status = %status,
        "Video analyzed"
    );

    Ok(AnalyzeResponse {
        success: true,
        analysis_id: stored.id,
        needs_review: analysis.needs_human_review,
        status,
        is_existing: false,
    })
}

/// Save a manual analysis, linked to one of the caller's videos or standalone.
///
/// Linked saves replace the video's analysis and mark it `completed`. They take
/// the same `processing` gate as provider runs, so a save racing an in-flight
/// analysis is rejected with `Conflict`.
pub async fn save_manual_analysis(
    pool: &DbPool,
    user_id: &str,
    request: SaveManualAnalysisRequest,
) -> AppResult<video_analysis::Model> {
    let analysis = parse_manual(request.analysis)?;

    let Some(video_id) = request.video_id else {
        let stored = pool.insert_standalone_analysis(user_id, &analysis).await?;
        info!(user_id, analysis_id = %stored.id, "Standalone manual analysis saved");
        return Ok(stored);
    };

    let video = pool.get_user_video(user_id, video_id).await?;
    if !pool.try_begin_analysis(video.id).await? {
        return Err(AppError::Conflict(format!(
            "Analysis already in progress for video {}",
            video.id
        )));
    }

    match store_manual_analysis(pool, &video, &analysis).await {
        Ok(stored) => {
            info!(user_id, video_id = %video.id, analysis_id = %stored.id, "Manual analysis saved");
            Ok(stored)
        }
        Err(e) => {
            let previous =
                AnalysisStatus::parse(&video.analysis_status).unwrap_or(AnalysisStatus::Pending);
            if let Err(status_err) = pool
                .set_analysis_status(video.id, previous, video.analysis_error.clone())
                .await
            {
                error!(video_id = %video.id, "Failed to restore analysis status: {}", status_err);
            }
            Err(e)
        }
    }
}

async fn store_manual_analysis(
    pool: &DbPool,
    video: &video::Model,
    analysis: &CanonicalAnalysis,
) -> AppResult<video_analysis::Model> {
    let stored = pool
        .upsert_video_analysis(video.id, &video.user_id, analysis)
        .await?;
    apply_campaign_tag(pool, video, analysis).await?;
    pool.set_analysis_status(video.id, AnalysisStatus::Completed, None)
        .await?;
    Ok(stored)
}
