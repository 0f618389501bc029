//! Analysis domain models: the provider's structured schema, the manual entry
//! shape, and the canonical flat attribute set both converge to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use super::AnalysisStatus;
use crate::entity::video_analysis;

/// Read an explicit JSON `null` as the type's default (empty list, empty string).
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Defines a closed vocabulary enum with snake_case wire names.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary!(
    /// Opening hook style.
    HookType {
        PatternInterrupt => "pattern_interrupt",
        CuriosityGap => "curiosity_gap",
        SocialProof => "social_proof",
        ProblemAgitation => "problem_agitation",
        BoldClaim => "bold_claim",
    }
);

vocabulary!(
    VoiceoverStyle {
        Professional => "professional",
        Casual => "casual",
        Energetic => "energetic",
        Educational => "educational",
    }
);

vocabulary!(
    /// Filming environment.
    VisualEnvironment {
        UrbanStreet => "urban_street",
        Studio => "studio",
        LifestyleHome => "lifestyle_home",
        OutdoorNature => "outdoor_nature",
        Other => "other",
    }
);

vocabulary!(
    Lighting {
        NaturalDaylight => "natural_daylight",
        StudioLighting => "studio_lighting",
        GoldenHour => "golden_hour",
        Night => "night",
        Mixed => "mixed",
    }
);

vocabulary!(
    ProductDisplay {
        Worn => "worn",
        Held => "held",
        Demonstrated => "demonstrated",
        FlatLay => "flat_lay",
        Other => "other",
    }
);

vocabulary!(
    /// Primary content classification.
    ContentCategory {
        ProductDemo => "product_demo",
        Lifestyle => "lifestyle",
        Unboxing => "unboxing",
        Testimonial => "testimonial",
        BeforeAfter => "before_after",
        Tutorial => "tutorial",
        TrendParticipation => "trend_participation",
    }
);

vocabulary!(
    CtaType {
        ShopNow => "shop_now",
        LinkInBio => "link_in_bio",
        Follow => "follow",
        Comment => "comment",
        DuetStitch => "duet_stitch",
        VisitPage => "visit_page",
        None => "none",
    }
);

vocabulary!(
    CtaPlacement {
        Opening => "opening",
        Middle => "middle",
        Closing => "closing",
        Throughout => "throughout",
        None => "none",
    }
);

vocabulary!(
    Urgency {
        High => "high",
        Medium => "medium",
        Low => "low",
        None => "none",
    }
);

vocabulary!(
    CampaignCategory {
        ProductLaunch => "product_launch",
        Seasonal => "seasonal",
        InfluencerCollab => "influencer_collab",
        OrganicContent => "organic_content",
    }
);

vocabulary!(
    /// Where an analysis came from.
    AnalysisSource {
        Ai => "ai",
        Manual => "manual",
    }
);

// ============================================================================
// Provider structured analysis (camelCase wire format)
// ============================================================================

/// Structured analysis returned by the vision/LLM provider.
///
/// Every attribute group is required; fields inside a group default to empty.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StructuredAnalysis {
    pub hook: HookSection,
    pub script: ScriptSection,
    pub visual: VisualSection,
    pub classification: ClassificationSection,
    pub cta: CtaSection,
    pub campaign: CampaignSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_factors: Option<PerformanceFactors>,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HookSection {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, rename = "type")]
    pub hook_type: Option<HookType>,
    #[serde(default)]
    pub visual_element: Option<String>,
    #[serde(default)]
    pub effectiveness_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSection {
    #[serde(default)]
    pub full_transcript: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_messages: Vec<String>,
    #[serde(default)]
    pub voiceover_style: Option<VoiceoverStyle>,
}

/// One beat of the scene-by-scene breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SceneBeat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transition: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualSection {
    #[serde(default)]
    pub environment: Option<VisualEnvironment>,
    #[serde(default)]
    pub lighting: Option<Lighting>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub camera_angles: Vec<String>,
    #[serde(default)]
    pub model_description: Option<String>,
    #[serde(default)]
    pub product_display: Option<ProductDisplay>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_palette: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scene_breakdown: Vec<SceneBeat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ClassificationSection {
    #[serde(default)]
    pub primary: Option<ContentCategory>,
    #[serde(default)]
    pub secondary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CtaSection {
    #[serde(default)]
    pub extracted: Option<String>,
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default, rename = "type")]
    pub cta_type: Option<CtaType>,
    #[serde(default)]
    pub placement: Option<CtaPlacement>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CampaignSection {
    #[serde(default)]
    pub category: Option<CampaignCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PerformanceFactors {
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub winning_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AnalysisMetadata {
    /// 0.0..=1.0; a missing score is treated as 0.
    #[serde(default)]
    pub confidence: Option<f64>,
}

// ============================================================================
// Manual analysis (snake_case wire format, camelCase accepted)
// ============================================================================

/// Manually authored analysis. Values are free-form strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualAnalysis {
    #[serde(default)]
    pub hook: Option<ManualHook>,
    #[serde(default)]
    pub caption: Option<ManualCaption>,
    #[serde(default)]
    pub script: Option<ManualScript>,
    #[serde(default)]
    pub visual: Option<ManualVisual>,
    #[serde(default)]
    pub classification: Option<ManualClassification>,
    #[serde(default)]
    pub cta: Option<ManualCta>,
    #[serde(default)]
    pub campaign: Option<ManualCampaign>,
    /// Self-reported performance (e.g. `{"engagement_rate": 4.2}`).
    #[serde(default)]
    pub performance: Option<JsonValue>,
}

impl ManualAnalysis {
    /// True when at least one attribute group is present.
    pub fn has_attribute_group(&self) -> bool {
        self.hook.is_some()
            || self.script.is_some()
            || self.visual.is_some()
            || self.classification.is_some()
            || self.cta.is_some()
            || self.campaign.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualHook {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub hook_type: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, alias = "visualElement")]
    pub visual_element: Option<String>,
    #[serde(default, alias = "effectivenessScore")]
    pub effectiveness_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualCaption {
    #[serde(default)]
    pub main_text: Option<String>,
    #[serde(default)]
    pub cta: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualScript {
    #[serde(default, alias = "fullTranscript")]
    pub full_transcript: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", alias = "keyMessages")]
    pub key_messages: Vec<String>,
    #[serde(default, alias = "voiceoverStyle")]
    pub voiceover_style: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualVisual {
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub lighting: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", alias = "cameraAngles")]
    pub camera_angles: Vec<String>,
    #[serde(default, alias = "modelDescription")]
    pub model_description: Option<String>,
    #[serde(default, alias = "productDisplay", alias = "product_display")]
    pub product_display_method: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", alias = "colorPalette")]
    pub color_palette: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualClassification {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualCta {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default, rename = "type")]
    pub cta_type: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManualCampaign {
    #[serde(default)]
    pub category: Option<String>,
}

// ============================================================================
// Canonical attribute set
// ============================================================================

/// Flat attribute set written to `video_analyses`, whatever the source.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalAnalysis {
    pub source: AnalysisSource,

    pub hook_text: Option<String>,
    pub hook_type: Option<String>,
    pub hook_visual_element: Option<String>,
    pub hook_effectiveness_score: Option<f64>,
    pub hook_duration_seconds: Option<f64>,

    pub caption_cta: Option<String>,
    pub full_script: Option<String>,
    pub script_key_messages: Vec<String>,
    pub voiceover_style: Option<String>,

    pub visual_environment: Option<String>,
    pub visual_lighting: Option<String>,
    pub visual_camera_angles: Vec<String>,
    pub visual_model_description: Option<String>,
    pub visual_product_display: Option<String>,
    pub visual_color_palette: Vec<String>,
    pub visual_scene_breakdown: Vec<SceneBeat>,

    pub content_type_primary: Option<String>,
    pub content_type_secondary: Option<String>,

    pub cta_primary: Option<String>,
    pub cta_type: Option<String>,
    pub cta_placement: Option<String>,
    pub cta_urgency: Option<String>,

    pub campaign_category: Option<String>,

    pub raw_payload: JsonValue,
    pub confidence_score: Option<f64>,
    pub needs_human_review: bool,
    pub performance_tracked: bool,
}

/// Version stamp written with every analysis row.
pub const ANALYSIS_VERSION: &str = "1.0.0";

/// Stored analysis as exposed by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoAnalysis {
    pub id: Uuid,
    pub video_id: Option<Uuid>,
    pub user_id: String,
    pub source_type: String,
    pub hook_text: Option<String>,
    pub hook_type: Option<String>,
    pub hook_visual_element: Option<String>,
    pub hook_effectiveness_score: Option<f64>,
    pub hook_duration_seconds: Option<f64>,
    pub caption_cta: Option<String>,
    pub full_script: Option<String>,
    pub script_key_messages: Vec<String>,
    pub voiceover_style: Option<String>,
    pub visual_environment: Option<String>,
    pub visual_lighting: Option<String>,
    pub visual_camera_angles: Vec<String>,
    pub visual_model_description: Option<String>,
    pub visual_product_display: Option<String>,
    pub visual_color_palette: Vec<String>,
    pub visual_scene_breakdown: Vec<SceneBeat>,
    pub content_type_primary: Option<String>,
    pub content_type_secondary: Option<String>,
    pub cta_primary: Option<String>,
    pub cta_type: Option<String>,
    pub cta_placement: Option<String>,
    pub cta_urgency: Option<String>,
    pub campaign_category: Option<String>,
    pub confidence_score: Option<f64>,
    pub needs_human_review: bool,
    pub performance_tracked: bool,
    pub analysis_version: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Decode a JSONB list column, treating malformed values as empty.
fn json_list<T: serde::de::DeserializeOwned>(value: &JsonValue) -> Vec<T> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

impl From<video_analysis::Model> for VideoAnalysis {
    fn from(m: video_analysis::Model) -> Self {
        Self {
            id: m.id,
            video_id: m.video_id,
            user_id: m.user_id,
            source_type: m.source_type,
            hook_text: m.hook_text,
            hook_type: m.hook_type,
            hook_visual_element: m.hook_visual_element,
            hook_effectiveness_score: m.hook_effectiveness_score,
            hook_duration_seconds: m.hook_duration_seconds,
            caption_cta: m.caption_cta,
            full_script: m.full_script,
            script_key_messages: json_list(&m.script_key_messages),
            voiceover_style: m.voiceover_style,
            visual_environment: m.visual_environment,
            visual_lighting: m.visual_lighting,
            visual_camera_angles: json_list(&m.visual_camera_angles),
            visual_model_description: m.visual_model_description,
            visual_product_display: m.visual_product_display,
            visual_color_palette: json_list(&m.visual_color_palette),
            visual_scene_breakdown: json_list(&m.visual_scene_breakdown),
            content_type_primary: m.content_type_primary,
            content_type_secondary: m.content_type_secondary,
            cta_primary: m.cta_primary,
            cta_type: m.cta_type,
            cta_placement: m.cta_placement,
            cta_urgency: m.cta_urgency,
            campaign_category: m.campaign_category,
            confidence_score: m.confidence_score,
            needs_human_review: m.needs_human_review,
            performance_tracked: m.performance_tracked,
            analysis_version: m.analysis_version,
            analyzed_at: m.analyzed_at,
        }
    }
}

// ============================================================================
// Request / response DTOs
// ============================================================================

/// Query parameters for triggering an analysis.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AnalyzeQuery {
    /// Re-run even if an analysis already exists.
    #[serde(default)]
    pub force: bool,
}

/// Outcome of an analysis request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub needs_review: bool,
    pub status: AnalysisStatus,
    /// True when an existing analysis was returned without calling the provider.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_existing: bool,
}

/// Current analysis state of a video.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisStatusResponse {
    pub video_id: Uuid,
    pub status: AnalysisStatus,
    pub has_analysis: bool,
    pub analysis: Option<VideoAnalysis>,
}

/// Request to save a manual analysis.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveManualAnalysisRequest {
    /// Link to an existing video; standalone when omitted.
    #[serde(default)]
    pub video_id: Option<Uuid>,
    /// Manual analysis JSON.
    #[schema(value_type = Object)]
    pub analysis: JsonValue,
}

/// Response after saving a manual analysis.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaveManualAnalysisResponse {
    pub success: bool,
    pub data: VideoAnalysis,
}

/// Parameters for a batch analysis run.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BatchAnalysisRequest {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

/// Counters from a batch analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BatchAnalysisSummary {
    pub processed: u32,
    pub successful: u32,
    pub failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload() -> JsonValue {
        json!({
            "hook": {
                "text": "Stop scrolling!",
                "duration": 2.5,
                "type": "pattern_interrupt",
                "visualElement": "close-up of jacket",
                "effectivenessScore": 8
            },
            "script": {
                "fullTranscript": "This jacket...",
                "keyMessages": ["warm", "waterproof"],
                "voiceoverStyle": "energetic"
            },
            "visual": {
                "environment": "urban_street",
                "lighting": "golden_hour",
                "cameraAngles": ["close_up"],
                "modelDescription": "woman in red",
                "productDisplay": "worn",
                "colorPalette": ["red", "black"],
                "sceneBreakdown": [{"timestamp": "0-3s", "description": "intro", "transition": "cut"}]
            },
            "classification": { "primary": "product_demo" },
            "cta": {
                "extracted": "Shop now",
                "primary": "Shop now",
                "type": "shop_now",
                "placement": "closing",
                "urgency": "high"
            },
            "campaign": { "category": "seasonal" },
            "performance_factors": { "strengths": ["hook"], "winning_patterns": ["demo"] },
            "metadata": { "confidence": 0.82 }
        })
    }

    #[test]
    fn test_structured_analysis_parses_full_payload() {
        let parsed: StructuredAnalysis = serde_json::from_value(full_payload()).unwrap();
        assert_eq!(parsed.hook.hook_type, Some(HookType::PatternInterrupt));
        assert_eq!(parsed.visual.lighting, Some(Lighting::GoldenHour));
        assert_eq!(parsed.visual.scene_breakdown.len(), 1);
        assert_eq!(parsed.cta.cta_type, Some(CtaType::ShopNow));
        assert_eq!(parsed.metadata.confidence, Some(0.82));
    }

    #[test]
    fn test_structured_analysis_missing_nested_fields_default() {
        let payload = json!({
            "hook": {},
            "script": {},
            "visual": {},
            "classification": {},
            "cta": {},
            "campaign": {},
            "metadata": {}
        });
        let parsed: StructuredAnalysis = serde_json::from_value(payload).unwrap();
        assert!(parsed.hook.text.is_none());
        assert!(parsed.script.key_messages.is_empty());
        assert!(parsed.metadata.confidence.is_none());
    }

    #[test]
    fn test_structured_analysis_rejects_missing_group() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("visual");
        assert!(serde_json::from_value::<StructuredAnalysis>(payload).is_err());
    }

    #[test]
    fn test_structured_analysis_rejects_unknown_vocabulary() {
        let mut payload = full_payload();
        payload["visual"]["environment"] = json!("spaceship");
        assert!(serde_json::from_value::<StructuredAnalysis>(payload).is_err());
    }

    #[test]
    fn test_manual_analysis_accepts_both_casings() {
        let manual: ManualAnalysis = serde_json::from_value(json!({
            "hook": { "type": "Curiosity Gap", "visualElement": "door opening" },
            "visual": { "camera_angles": ["wide"], "productDisplay": "held" },
            "performance": { "engagement_rate": 5.5 }
        }))
        .unwrap();

        let hook = manual.hook.as_ref().unwrap();
        assert_eq!(hook.hook_type.as_deref(), Some("Curiosity Gap"));
        assert_eq!(hook.visual_element.as_deref(), Some("door opening"));
        let visual = manual.visual.as_ref().unwrap();
        assert_eq!(visual.camera_angles, vec!["wide".to_string()]);
        assert_eq!(visual.product_display_method.as_deref(), Some("held"));
        assert!(manual.has_attribute_group());
    }

    #[test]
    fn test_manual_analysis_without_groups() {
        let manual: ManualAnalysis =
            serde_json::from_value(json!({ "performance": { "engagement_rate": 2 } })).unwrap();
        assert!(!manual.has_attribute_group());
    }

    #[test]
    fn test_vocabulary_parse() {
        assert_eq!(CampaignCategory::parse("product_launch"), Some(CampaignCategory::ProductLaunch));
        assert_eq!(CampaignCategory::parse("launch"), None);
        assert_eq!(ContentCategory::ALL.len(), 7);
        assert_eq!(AnalysisSource::Manual.to_string(), "manual");
    }
}
