//! Readiness Aggregator: continuous readiness of one profile for one role.
//!
//! Unlike fit scoring, each requirement contributes its match ratio
//! `min(held / required, 1)`, so partial progress counts. Scores are on a
//! 0 – 100 scale, blended 60/40 like every other score.

use serde::{Deserialize, Serialize};

use crate::analysis::fit::weighted;
use crate::analysis::gaps::{compare_requirement, sort_gaps, GapEntry, EMPTY_ROLE_READINESS};
use crate::analysis::levels::{match_ratio, Level};
use crate::analysis::round1;
use crate::models::records::{ProfileHoldings, RequirementRecord, RoleRequirements};

const SHORT_TERM_MAX_SEVERITY: f64 = 50.0;
const MEDIUM_TERM_MAX_SEVERITY: f64 = 70.0;
const SUMMARY_GAP_NAMES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessLevel {
    #[serde(rename = "Fully ready")]
    FullyReady,
    #[serde(rename = "Well prepared")]
    WellPrepared,
    #[serde(rename = "Mostly prepared")]
    MostlyPrepared,
    #[serde(rename = "Partially prepared")]
    PartiallyPrepared,
    #[serde(rename = "Additional preparation needed")]
    AdditionalPreparationNeeded,
}

impl ReadinessLevel {
    /// Cut points are inclusive lower bounds.
    pub fn classify(score: f64) -> Self {
        match score {
            s if s >= 90.0 => ReadinessLevel::FullyReady,
            s if s >= 75.0 => ReadinessLevel::WellPrepared,
            s if s >= 60.0 => ReadinessLevel::MostlyPrepared,
            s if s >= 40.0 => ReadinessLevel::PartiallyPrepared,
            _ => ReadinessLevel::AdditionalPreparationNeeded,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadinessLevel::FullyReady => "Fully ready",
            ReadinessLevel::WellPrepared => "Well prepared",
            ReadinessLevel::MostlyPrepared => "Mostly prepared",
            ReadinessLevel::PartiallyPrepared => "Partially prepared",
            ReadinessLevel::AdditionalPreparationNeeded => "Additional preparation needed",
        }
    }
}

/// Unmet requirements bucketed by how long closing them is expected to take.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevelopmentTimeline {
    pub short_term: Vec<GapEntry>,  // severity ≤ 50
    pub medium_term: Vec<GapEntry>, // 50 < severity ≤ 70
    pub long_term: Vec<GapEntry>,   // severity > 70
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessAssessment {
    pub profile_id: String,
    pub role_id: String,
    pub score: f64,
    pub capability_score: f64,
    pub skill_score: f64,
    pub readiness_level: ReadinessLevel,
    pub critical_gaps: Vec<GapEntry>,
    pub development_timeline: DevelopmentTimeline,
    pub summary: String,
}

/// Mean match ratio over one kind of requirement, as a percentage.
/// `None` when the role lists no requirements of that kind.
fn kind_score(requirements: &[RequirementRecord], holdings: &ProfileHoldings) -> Option<f64> {
    if requirements.is_empty() {
        return None;
    }
    let total: f64 = requirements
        .iter()
        .map(|req| {
            let held = holdings.level_for(req).unwrap_or(Level::NONE);
            match_ratio(held, req.required_level)
        })
        .sum();
    Some(total / requirements.len() as f64 * 100.0)
}

/// Per-kind scores that feed the 60/40 blend. A kind the role does not ask
/// for mirrors the other kind, so `score = 0.6 × capability + 0.4 × skill`
/// holds for every role.
fn kind_scores(requirements: &RoleRequirements, holdings: &ProfileHoldings) -> (f64, f64) {
    match (
        kind_score(&requirements.capabilities, holdings),
        kind_score(&requirements.skills, holdings),
    ) {
        (Some(capability), Some(skill)) => (capability, skill),
        (Some(capability), None) => (capability, capability),
        (None, Some(skill)) => (skill, skill),
        (None, None) => (EMPTY_ROLE_READINESS, EMPTY_ROLE_READINESS),
    }
}

fn build_timeline(gaps: &[GapEntry]) -> DevelopmentTimeline {
    let mut timeline = DevelopmentTimeline::default();
    for gap in gaps.iter().filter(|g| g.severity > 0.0) {
        let bucket = if gap.severity <= SHORT_TERM_MAX_SEVERITY {
            &mut timeline.short_term
        } else if gap.severity <= MEDIUM_TERM_MAX_SEVERITY {
            &mut timeline.medium_term
        } else {
            &mut timeline.long_term
        };
        bucket.push(gap.clone());
    }
    timeline
}

fn build_summary(
    level: ReadinessLevel,
    score: f64,
    capability_score: f64,
    skill_score: f64,
    critical_gaps: &[GapEntry],
    timeline: &DevelopmentTimeline,
) -> String {
    let mut summary = format!(
        "{} ({score:.1}/100). Capabilities {capability_score:.1}, skills {skill_score:.1}.",
        level.label()
    );

    if critical_gaps.is_empty() {
        summary.push_str(" No critical gaps.");
    } else {
        let names: Vec<&str> = critical_gaps
            .iter()
            .take(SUMMARY_GAP_NAMES)
            .map(|g| g.name.as_str())
            .collect();
        summary.push_str(&format!(
            " {} critical gap(s), led by {}.",
            critical_gaps.len(),
            names.join(", ")
        ));
    }

    summary.push_str(&format!(
        " Development timeline: {} short-term, {} medium-term, {} long-term.",
        timeline.short_term.len(),
        timeline.medium_term.len(),
        timeline.long_term.len()
    ));
    summary
}

pub fn assess_readiness(
    requirements: &RoleRequirements,
    holdings: &ProfileHoldings,
) -> ReadinessAssessment {
    let (capability, skill) = kind_scores(requirements, holdings);
    // Blend unrounded and round once, so band edges see the exact score.
    let score = round1(weighted(capability, skill));
    let capability_score = round1(capability);
    let skill_score = round1(skill);
    let readiness_level = ReadinessLevel::classify(score);

    let mut gaps: Vec<GapEntry> = requirements
        .iter()
        .map(|req| compare_requirement(req, holdings))
        .collect();
    sort_gaps(&mut gaps);

    let development_timeline = build_timeline(&gaps);
    let critical_gaps: Vec<GapEntry> = gaps.into_iter().filter(|g| g.is_critical()).collect();

    let summary = build_summary(
        readiness_level,
        score,
        capability_score,
        skill_score,
        &critical_gaps,
        &development_timeline,
    );

    ReadinessAssessment {
        profile_id: holdings.profile_id.clone(),
        role_id: requirements.role_id.clone(),
        score,
        capability_score,
        skill_score,
        readiness_level,
        critical_gaps,
        development_timeline,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        capability_held, capability_req, holdings, requirements, skill_held, skill_req,
    };

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        assert_eq!(ReadinessLevel::classify(90.0), ReadinessLevel::FullyReady);
        assert_eq!(ReadinessLevel::classify(75.0), ReadinessLevel::WellPrepared);
        assert_eq!(ReadinessLevel::classify(74.9), ReadinessLevel::MostlyPrepared);
        assert_eq!(ReadinessLevel::classify(60.0), ReadinessLevel::MostlyPrepared);
        assert_eq!(ReadinessLevel::classify(40.0), ReadinessLevel::PartiallyPrepared);
        assert_eq!(
            ReadinessLevel::classify(39.9),
            ReadinessLevel::AdditionalPreparationNeeded
        );
    }

    #[test]
    fn test_level_serializes_as_label() {
        let value = serde_json::to_value(ReadinessLevel::WellPrepared).unwrap();
        assert_eq!(value, "Well prepared");
    }

    #[test]
    fn test_continuous_match_ratio_scores() {
        // capability: min(2/4, 1) = 0.5, min(5/3, 1) = 1 → 75
        // skill (default Intermediate): min(1/2, 1) = 0.5 → 50
        let role = requirements(
            vec![
                capability_req("c1", "Strategy", Some("advanced")),
                capability_req("c2", "Coaching", Some("proficient")),
            ],
            vec![skill_req("s1", "SQL", None)],
        );
        let profile = holdings(
            vec![
                capability_held("c1", "Strategy", Some("intermediate")),
                capability_held("c2", "Coaching", Some("expert")),
            ],
            vec![skill_held("s1", "SQL", Some("basic"))],
        );

        let assessment = assess_readiness(&role, &profile);
        assert_eq!(assessment.capability_score, 75.0);
        assert_eq!(assessment.skill_score, 50.0);
        // 75 × 0.6 + 50 × 0.4 = 65
        assert_eq!(assessment.score, 65.0);
        assert_eq!(assessment.readiness_level, ReadinessLevel::MostlyPrepared);
    }

    #[test]
    fn test_critical_gaps_merge_both_kinds_sorted() {
        let role = requirements(
            vec![
                capability_req("c1", "Strategy", Some("expert")),
                capability_req("c2", "Coaching", Some("advanced")),
            ],
            vec![skill_req("s1", "SQL", None)],
        );
        let profile = holdings(
            vec![capability_held("c1", "Strategy", Some("basic"))],
            vec![],
        );

        let assessment = assess_readiness(&role, &profile);
        // Coaching and SQL missing (100), Strategy (5-1)/5 = 80
        assert_eq!(assessment.critical_gaps.len(), 3);
        assert!(assessment.critical_gaps.iter().all(|g| g.severity > 70.0));
        assert_eq!(assessment.critical_gaps[2].name, "Strategy");
        for pair in assessment.critical_gaps.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
    }

    #[test]
    fn test_timeline_buckets() {
        let role = requirements(
            vec![
                capability_req("a", "A", Some("advanced")),   // held 2 → 50
                capability_req("b", "B", Some("expert")),     // held 2 → 60
                capability_req("c", "C", Some("expert")),     // held 1 → 80
                capability_req("d", "D", Some("basic")),      // held 3 → met
            ],
            vec![],
        );
        let profile = holdings(
            vec![
                capability_held("a", "A", Some("intermediate")),
                capability_held("b", "B", Some("intermediate")),
                capability_held("c", "C", Some("basic")),
                capability_held("d", "D", Some("proficient")),
            ],
            vec![],
        );

        let timeline = assess_readiness(&role, &profile).development_timeline;
        assert_eq!(timeline.short_term.len(), 1);
        assert_eq!(timeline.short_term[0].name, "A");
        assert_eq!(timeline.medium_term.len(), 1);
        assert_eq!(timeline.medium_term[0].name, "B");
        assert_eq!(timeline.long_term.len(), 1);
        assert_eq!(timeline.long_term[0].name, "C");
    }

    #[test]
    fn test_role_without_requirements_is_fully_ready() {
        let assessment = assess_readiness(&requirements(vec![], vec![]), &holdings(vec![], vec![]));
        assert_eq!(assessment.score, 100.0);
        assert_eq!(assessment.readiness_level, ReadinessLevel::FullyReady);
        assert!(assessment.critical_gaps.is_empty());
    }

    #[test]
    fn test_single_kind_role_mirrors_the_present_kind() {
        let role = requirements(vec![capability_req("c1", "Strategy", Some("advanced"))], vec![]);
        let profile = holdings(vec![capability_held("c1", "Strategy", Some("intermediate"))], vec![]);

        let assessment = assess_readiness(&role, &profile);
        assert_eq!(assessment.capability_score, 50.0);
        assert_eq!(assessment.skill_score, 50.0);
        assert_eq!(assessment.score, 50.0);

        let skills_only = requirements(vec![], vec![skill_req("s1", "SQL", Some("advanced"))]);
        let profile = holdings(vec![], vec![skill_held("s1", "SQL", Some("proficient"))]);
        let assessment = assess_readiness(&skills_only, &profile);
        assert_eq!(assessment.capability_score, assessment.skill_score);
        assert_eq!(assessment.score, 75.0);
    }

    #[test]
    fn test_score_matches_weighted_blend_of_reported_kinds() {
        let roles = [
            requirements(vec![capability_req("c1", "Strategy", Some("advanced"))], vec![]),
            requirements(vec![], vec![skill_req("s1", "SQL", None)]),
            requirements(
                vec![capability_req("c1", "Strategy", Some("expert"))],
                vec![skill_req("s1", "SQL", Some("advanced"))],
            ),
            requirements(vec![], vec![]),
        ];
        let profile = holdings(
            vec![capability_held("c1", "Strategy", Some("intermediate"))],
            vec![skill_held("s1", "SQL", Some("basic"))],
        );
        for role in &roles {
            let a = assess_readiness(role, &profile);
            let blended = 0.6 * a.capability_score + 0.4 * a.skill_score;
            assert!(
                (a.score - blended).abs() <= 0.05 + 1e-9,
                "score {} vs blend {blended}",
                a.score
            );
        }
    }

    #[test]
    fn test_score_is_rounded_once_after_blending() {
        // capability 2/9 and skill 1/3 blend to 26.67; blending the rounded
        // kind scores (22.2, 33.3) would give 26.6 instead.
        let role = requirements(
            vec![
                capability_req("c1", "Strategy", Some("basic")),
                capability_req("c2", "Delivery", Some("basic")),
                capability_req("c3", "Finance", Some("proficient")),
            ],
            vec![skill_req("s1", "SQL", Some("proficient"))],
        );
        let profile = holdings(
            vec![capability_held("c3", "Finance", Some("intermediate"))],
            vec![skill_held("s1", "SQL", Some("basic"))],
        );
        let assessment = assess_readiness(&role, &profile);
        assert_eq!(assessment.capability_score, 22.2);
        assert_eq!(assessment.skill_score, 33.3);
        assert_eq!(assessment.score, 26.7);
    }

    #[test]
    fn test_summary_mentions_level_and_gaps() {
        let role = requirements(vec![capability_req("c1", "Strategy", Some("expert"))], vec![]);
        let profile = holdings(vec![], vec![]);

        let assessment = assess_readiness(&role, &profile);
        assert!(assessment.summary.contains("Additional preparation needed"));
        assert!(assessment.summary.contains("Strategy"));
        assert!(assessment.summary.contains("1 long-term"));
    }
}
