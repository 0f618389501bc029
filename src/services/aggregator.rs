//! Pattern aggregator.
//!
//! Groups normalized records by single attributes and by the
//! (environment, lighting) pair, then ranks the groups by average engagement.

use std::collections::HashMap;
use std::hash::Hash;

use super::normalizer::{NormalizedRecord, PatternAttributes};
use crate::models::{ConfidenceLevel, PatternCategory, PatternInsight};

/// Smallest group that counts as a pattern.
pub const MIN_GROUP_SIZE: usize = 2;

/// Attribute name used for environment + lighting insights.
pub const COMBO_ATTRIBUTE: &str = "combo";

/// Single attribute a record can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    HookType,
    VisualEnvironment,
    VisualLighting,
    CtaType,
}

impl Attribute {
    fn value<'a>(&self, attrs: &'a PatternAttributes) -> Option<&'a str> {
        match self {
            Self::HookType => attrs.hook_type.as_deref(),
            Self::VisualEnvironment => attrs.visual_environment.as_deref(),
            Self::VisualLighting => attrs.visual_lighting.as_deref(),
            Self::CtaType => attrs.cta_type.as_deref(),
        }
    }
}

/// Evaluation order of single-attribute dimensions: (attribute, category, display name).
pub const DIMENSIONS: [(Attribute, PatternCategory, &str); 4] = [
    (Attribute::HookType, PatternCategory::Hook, "type"),
    (Attribute::VisualEnvironment, PatternCategory::Visual, "environment"),
    (Attribute::VisualLighting, PatternCategory::Visual, "lighting"),
    (Attribute::CtaType, PatternCategory::Cta, "type"),
];

/// Lowercase and trim; blank values count as missing.
pub fn normalize_value(raw: &str) -> Option<String> {
    let value = raw.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

struct Group<K> {
    key: K,
    sum: f64,
    count: usize,
}

/// Sum and count engagement per key, keeping groups in first-seen order.
fn group_by<K, F>(records: &[NormalizedRecord], key_of: F) -> Vec<Group<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&PatternAttributes) -> Option<K>,
{
    let mut groups: Vec<Group<K>> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();

    for record in records {
        let Some(key) = key_of(&record.attributes) else {
            continue;
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                sum: 0.0,
                count: 0,
            });
            groups.len() - 1
        });

        groups[slot].sum += record.engagement_rate;
        groups[slot].count += 1;
    }

    groups
}

/// Recommendation sentence for a single-attribute insight.
///
/// Underscores in the value are shown as spaces.
pub fn recommendation(category: &str, value: &str, avg: f64, count: usize) -> String {
    let pretty = value.replace('_', " ");
    match category {
        "hook" => format!(
            "Your \"{}\" hooks average {:.2}% engagement across {} videos.",
            pretty, avg, count
        ),
        "visual" => format!("Videos in \"{}\" settings get {:.2}% engagement.", pretty, avg),
        "cta" => format!("\"{}\" CTAs drive {:.2}% engagement.", pretty, avg),
        _ => format!("{} performs well with {:.2}% engagement.", pretty, avg),
    }
}

/// Recommendation sentence for an environment + lighting insight.
pub fn combo_recommendation(environment: &str, lighting: &str, avg: f64, count: usize) -> String {
    format!(
        "Your \"{}\" environment with \"{}\" lighting averages {:.2}% engagement. Seen in {} videos.",
        environment, lighting, avg, count
    )
}

/// Aggregate records into ranked insights.
///
/// Ties in average keep evaluation order: hook type, visual environment,
/// visual lighting, CTA type, then combos; within one dimension, first-seen value first.
pub fn aggregate(records: &[NormalizedRecord]) -> Vec<PatternInsight> {
    let total = records.len();
    let mut insights = Vec::new();

    for (attribute, category, name) in DIMENSIONS {
        let groups = group_by(records, |attrs| {
            attribute.value(attrs).and_then(normalize_value)
        });

        for group in groups.into_iter().filter(|g| g.count >= MIN_GROUP_SIZE) {
            let avg = group.sum / group.count as f64;
            insights.push(PatternInsight {
                category,
                attribute: name.to_string(),
                recommendation: recommendation(category.as_str(), &group.key, avg, group.count),
                value: group.key,
                avg_engagement: avg,
                video_count: group.count,
                confidence_level: ConfidenceLevel::for_share(group.count, total),
            });
        }
    }

    let combos = group_by(records, |attrs| {
        let environment = attrs.visual_environment.as_deref().and_then(normalize_value)?;
        let lighting = attrs.visual_lighting.as_deref().and_then(normalize_value)?;
        Some((environment, lighting))
    });

    for group in combos.into_iter().filter(|g| g.count >= MIN_GROUP_SIZE) {
        let avg = group.sum / group.count as f64;
        let (environment, lighting) = group.key;
        insights.push(PatternInsight {
            category: PatternCategory::Visual,
            attribute: COMBO_ATTRIBUTE.to_string(),
            value: format!("{} + {}", environment, lighting),
            avg_engagement: avg,
            video_count: group.count,
            confidence_level: ConfidenceLevel::for_share(group.count, total),
            recommendation: combo_recommendation(&environment, &lighting, avg, group.count),
        });
    }

    // Stable sort keeps evaluation order for equal averages.
    insights.sort_by(|a, b| b.avg_engagement.total_cmp(&a.avg_engagement));
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        hook: Option<&str>,
        env: Option<&str>,
        lighting: Option<&str>,
        cta: Option<&str>,
        rate: f64,
    ) -> NormalizedRecord {
        NormalizedRecord {
            attributes: PatternAttributes {
                hook_type: hook.map(String::from),
                visual_environment: env.map(String::from),
                visual_lighting: lighting.map(String::from),
                cta_type: cta.map(String::from),
            },
            engagement_rate: rate,
        }
    }

    fn hooks(rates: &[(&str, f64)]) -> Vec<NormalizedRecord> {
        rates
            .iter()
            .map(|(hook, rate)| record(Some(hook), None, None, None, *rate))
            .collect()
    }

    #[test]
    fn test_single_attribute_scenario() {
        let records = hooks(&[
            ("curiosity_gap", 2.0),
            ("curiosity_gap", 4.0),
            ("curiosity_gap", 6.0),
            ("curiosity_gap", 8.0),
            ("curiosity_gap", 10.0),
        ]);

        let insights = aggregate(&records);
        assert_eq!(insights.len(), 1);
        let insight = &insights[0];
        assert_eq!(insight.category, PatternCategory::Hook);
        assert_eq!(insight.attribute, "type");
        assert_eq!(insight.value, "curiosity_gap");
        assert_eq!(insight.avg_engagement, 6.0);
        assert_eq!(insight.video_count, 5);
        assert_eq!(insight.confidence_level, ConfidenceLevel::High);
        assert_eq!(
            insight.recommendation,
            "Your \"curiosity gap\" hooks average 6.00% engagement across 5 videos."
        );
    }

    #[test]
    fn test_singleton_groups_are_not_emitted() {
        let records = vec![
            record(Some("bold_claim"), Some("studio"), Some("night"), Some("follow"), 3.0),
            record(Some("social_proof"), Some("urban_street"), Some("night"), Some("comment"), 5.0),
        ];

        let insights = aggregate(&records);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].attribute, "lighting");
        assert!(insights.iter().all(|i| i.video_count >= MIN_GROUP_SIZE));
    }

    #[test]
    fn test_values_normalized_before_grouping() {
        let records = hooks(&[(" Curiosity_Gap", 2.0), ("curiosity_gap  ", 4.0), ("   ", 9.0)]);

        let insights = aggregate(&records);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].value, "curiosity_gap");
        assert_eq!(insights[0].video_count, 2);
    }

    #[test]
    fn test_missing_attribute_skips_only_that_dimension() {
        let records = vec![
            record(None, Some("studio"), None, None, 4.0),
            record(None, Some("studio"), None, None, 6.0),
            record(Some("bold_claim"), None, None, None, 1.0),
        ];

        let insights = aggregate(&records);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].attribute, "environment");
        assert_eq!(insights[0].avg_engagement, 5.0);
    }

    #[test]
    fn test_combo_insight() {
        let records = vec![
            record(None, Some("studio"), Some("studio_lighting"), None, 4.0),
            record(None, Some("Studio"), Some("studio_lighting"), None, 8.0),
            record(None, Some("studio"), None, None, 100.0),
        ];

        let insights = aggregate(&records);
        let combo = insights
            .iter()
            .find(|i| i.attribute == COMBO_ATTRIBUTE)
            .expect("combo insight");
        assert_eq!(combo.category, PatternCategory::Visual);
        assert_eq!(combo.value, "studio + studio_lighting");
        assert_eq!(combo.video_count, 2);
        assert_eq!(combo.avg_engagement, 6.0);
        assert_eq!(
            combo.recommendation,
            "Your \"studio\" environment with \"studio_lighting\" lighting averages 6.00% engagement. Seen in 2 videos."
        );
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let records = vec![
            record(Some("bold_claim"), Some("studio"), None, Some("follow"), 2.0),
            record(Some("bold_claim"), Some("studio"), None, Some("follow"), 4.0),
            record(Some("social_proof"), None, None, None, 10.0),
            record(Some("social_proof"), None, None, None, 12.0),
        ];

        let insights = aggregate(&records);
        let order: Vec<(&str, &str)> = insights
            .iter()
            .map(|i| (i.category.as_str(), i.value.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("hook", "social_proof"),
                ("hook", "bold_claim"),
                ("visual", "studio"),
                ("cta", "follow"),
            ]
        );
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let records = vec![
            record(Some("a"), Some("x"), Some("l1"), Some("c"), 3.0),
            record(Some("b"), Some("y"), Some("l1"), Some("c"), 3.0),
            record(Some("a"), Some("x"), Some("l2"), Some("d"), 5.0),
            record(Some("b"), Some("y"), Some("l2"), Some("d"), 5.0),
        ];

        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn test_recommendation_templates() {
        assert_eq!(
            recommendation("visual", "urban_street", 4.5, 3),
            "Videos in \"urban street\" settings get 4.50% engagement."
        );
        assert_eq!(
            recommendation("cta", "shop_now", 3.333, 4),
            "\"shop now\" CTAs drive 3.33% engagement."
        );
        assert_eq!(
            recommendation("duration", "short", 1.0, 2),
            "short performs well with 1.00% engagement."
        );
    }

    #[test]
    fn test_confidence_uses_filtered_total() {
        let mut records = hooks(&[("a", 1.0), ("a", 1.0), ("a", 1.0)]);
        records.extend(hooks(&[("b", 1.0), ("c", 1.0), ("d", 1.0), ("e", 1.0)]));
        records.extend(hooks(&[("f", 1.0), ("g", 1.0), ("h", 1.0)]));

        let insights = aggregate(&records);
        assert_eq!(insights.len(), 1);
        // 3 of 10 = 30%: medium (needs 5 for high)
        assert_eq!(insights[0].confidence_level, ConfidenceLevel::Medium);
    }
}
