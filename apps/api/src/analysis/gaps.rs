//! Gap Analyzer: per-requirement comparison of one profile against one role.
//!
//! Requirement-driven: one `GapEntry` per role requirement, holdings the role
//! does not ask for are ignored. Entries are ordered by severity descending,
//! then group name ascending.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::analysis::levels::{self, Level};
use crate::models::records::{
    ProfileHoldings, RequirementKind, RequirementRecord, RoleRequirements,
};

/// Severity strictly above this is a critical gap.
pub const CRITICAL_SEVERITY: f64 = 70.0;

/// Readiness reported when a role has no requirements at all.
pub const EMPTY_ROLE_READINESS: f64 = 100.0;

const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    Missing,
    Insufficient,
    Met,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapEntry {
    pub id: String,
    pub name: String,
    pub group_name: String,
    pub kind: RequirementKind,
    pub held_level: Option<Level>,
    pub required_level: Level,
    pub gap_type: GapType,
    pub severity: f64, // 0 – 100
    pub description: String,
}

impl GapEntry {
    pub fn is_critical(&self) -> bool {
        self.severity > CRITICAL_SEVERITY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapSummary {
    pub critical_gaps: usize,    // severity > 70
    pub minor_gaps: usize,       // 0 < severity ≤ 70
    pub met_requirements: usize, // severity = 0
    pub overall_readiness: f64,  // 100 − mean(severity)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub profile_id: String,
    pub role_id: String,
    pub summary: GapSummary,
    pub gaps: Vec<GapEntry>,
    pub recommendations: Vec<String>,
}

/// Compares one requirement against the profile's holdings.
///
/// A holding with no level, or a label that does not normalize, counts as
/// missing: there is no evidence of the capability at any level.
pub fn compare_requirement(
    requirement: &RequirementRecord,
    holdings: &ProfileHoldings,
) -> GapEntry {
    let required = requirement.required_level;
    let held = holdings.level_for(requirement);

    let (gap_type, severity) = match held {
        None => (GapType::Missing, 100.0),
        Some(level) if levels::meets(level, required) => (GapType::Met, 0.0),
        Some(level) => (GapType::Insufficient, levels::severity(level, required)),
    };

    GapEntry {
        id: requirement.id.clone(),
        name: requirement.name.clone(),
        group_name: requirement.group_name.clone(),
        kind: requirement.kind,
        held_level: held,
        required_level: required,
        gap_type,
        severity,
        description: describe(requirement, held, gap_type),
    }
}

fn describe(requirement: &RequirementRecord, held: Option<Level>, gap_type: GapType) -> String {
    let kind = requirement.kind.as_str();
    let required = requirement.required_level;
    match (gap_type, held) {
        (GapType::Met, Some(level)) => format!(
            "{} meets the required {kind} level: current {level}, required {required}.",
            requirement.name
        ),
        (GapType::Insufficient, Some(level)) => format!(
            "{} is below the required {kind} level: current {level}, required {required}.",
            requirement.name
        ),
        _ => format!(
            "{} is a required {kind} the profile does not hold (required {required}).",
            requirement.name
        ),
    }
}

/// Severity descending, then group name ascending.
pub fn gap_order(a: &GapEntry, b: &GapEntry) -> Ordering {
    b.severity
        .total_cmp(&a.severity)
        .then_with(|| a.group_name.cmp(&b.group_name))
}

pub fn sort_gaps(gaps: &mut [GapEntry]) {
    gaps.sort_by(gap_order);
}

pub fn summarize(gaps: &[GapEntry]) -> GapSummary {
    let critical_gaps = gaps.iter().filter(|g| g.is_critical()).count();
    let met_requirements = gaps.iter().filter(|g| g.severity == 0.0).count();
    let minor_gaps = gaps.len() - critical_gaps - met_requirements;

    let overall_readiness = if gaps.is_empty() {
        EMPTY_ROLE_READINESS
    } else {
        let mean = gaps.iter().map(|g| g.severity).sum::<f64>() / gaps.len() as f64;
        (100.0 - mean).clamp(0.0, 100.0)
    };

    GapSummary {
        critical_gaps,
        minor_gaps,
        met_requirements,
        overall_readiness,
    }
}

/// Development actions for the worst unmet requirements, in gap order.
pub fn recommend(gaps: &[GapEntry]) -> Vec<String> {
    gaps.iter()
        .filter(|g| g.gap_type != GapType::Met)
        .take(MAX_RECOMMENDATIONS)
        .map(|g| match g.held_level {
            Some(held) if g.gap_type == GapType::Insufficient => format!(
                "Build {} ({}) from {} to {}.",
                g.name,
                g.group_name,
                held.label(),
                g.required_level.label()
            ),
            _ => format!(
                "Acquire {} ({}) to at least {}.",
                g.name,
                g.group_name,
                g.required_level.label()
            ),
        })
        .collect()
}

/// Compares every role requirement against the profile's holdings.
pub fn analyze_gaps(requirements: &RoleRequirements, holdings: &ProfileHoldings) -> GapAnalysis {
    let mut gaps: Vec<GapEntry> = requirements
        .iter()
        .map(|req| compare_requirement(req, holdings))
        .collect();
    sort_gaps(&mut gaps);

    GapAnalysis {
        profile_id: holdings.profile_id.clone(),
        role_id: requirements.role_id.clone(),
        summary: summarize(&gaps),
        recommendations: recommend(&gaps),
        gaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        capability_held, capability_req, holdings, requirements, skill_held, skill_req,
    };

    #[test]
    fn test_expert_holder_meets_proficient_requirement() {
        let role = requirements(vec![capability_req("c1", "Leadership", Some("proficient"))], vec![]);
        let profile = holdings(vec![capability_held("c1", "Leadership", Some("expert"))], vec![]);

        let analysis = analyze_gaps(&role, &profile);
        assert_eq!(analysis.gaps.len(), 1);
        assert_eq!(analysis.gaps[0].gap_type, GapType::Met);
        assert_eq!(analysis.gaps[0].severity, 0.0);
    }

    #[test]
    fn test_absent_capability_is_missing() {
        let role = requirements(vec![capability_req("c2", "Data Analysis", Some("advanced"))], vec![]);
        let profile = holdings(vec![], vec![]);

        let gap = &analyze_gaps(&role, &profile).gaps[0];
        assert_eq!(gap.gap_type, GapType::Missing);
        assert_eq!(gap.severity, 100.0);
        assert_eq!(gap.held_level, None);
        assert_eq!(gap.required_level.value(), 4);
    }

    #[test]
    fn test_insufficient_severity_formula() {
        let role = requirements(vec![capability_req("c3", "Communication", Some("advanced"))], vec![]);
        let profile = holdings(vec![capability_held("c3", "Communication", Some("intermediate"))], vec![]);

        let gap = &analyze_gaps(&role, &profile).gaps[0];
        assert_eq!(gap.gap_type, GapType::Insufficient);
        assert_eq!(gap.severity, 50.0);
        assert!(gap.description.contains("current 2"));
        assert!(gap.description.contains("required 4"));
    }

    #[test]
    fn test_holding_without_usable_level_is_missing() {
        let role = requirements(vec![capability_req("c1", "Negotiation", None)], vec![]);
        let profile = holdings(vec![capability_held("c1", "Negotiation", None)], vec![]);

        let gap = &analyze_gaps(&role, &profile).gaps[0];
        assert_eq!(gap.gap_type, GapType::Missing);
        assert_eq!(gap.severity, 100.0);
    }

    #[test]
    fn test_unrequired_holdings_are_ignored() {
        let role = requirements(vec![capability_req("c1", "Leadership", None)], vec![]);
        let profile = holdings(
            vec![
                capability_held("c1", "Leadership", Some("advanced")),
                capability_held("c9", "Juggling", Some("expert")),
            ],
            vec![skill_held("s1", "SQL", Some("expert"))],
        );
        assert_eq!(analyze_gaps(&role, &profile).gaps.len(), 1);
    }

    #[test]
    fn test_severity_zero_iff_met_and_hundred_iff_missing() {
        let role = requirements(
            vec![
                capability_req("a", "A", Some("expert")),
                capability_req("b", "B", Some("basic")),
                capability_req("c", "C", Some("advanced")),
                capability_req("d", "D", Some("proficient")),
            ],
            vec![skill_req("s", "S", None)],
        );
        let profile = holdings(
            vec![
                capability_held("a", "A", Some("beginner")),
                capability_held("b", "B", Some("master")),
                capability_held("c", "C", Some("proficient")),
            ],
            vec![skill_held("s", "S", Some("intermediate"))],
        );
        for gap in analyze_gaps(&role, &profile).gaps {
            assert_eq!(gap.severity == 0.0, gap.gap_type == GapType::Met, "{}", gap.name);
            assert_eq!(gap.severity == 100.0, gap.gap_type == GapType::Missing, "{}", gap.name);
        }
    }

    #[test]
    fn test_gaps_sorted_by_severity_then_group() {
        let mut reqs = vec![
            capability_req("a", "A", Some("advanced")),
            capability_req("b", "B", Some("advanced")),
            capability_req("c", "C", Some("basic")),
            capability_req("d", "D", Some("expert")),
        ];
        reqs[0].group_name = "Zeta".into();
        reqs[1].group_name = "Alpha".into();
        let role = requirements(reqs, vec![]);
        let profile = holdings(
            vec![
                capability_held("c", "C", Some("basic")),
                capability_held("d", "D", Some("proficient")),
            ],
            vec![],
        );

        let gaps = analyze_gaps(&role, &profile).gaps;
        for pair in gaps.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
            if pair[0].severity == pair[1].severity {
                assert!(pair[0].group_name <= pair[1].group_name);
            }
        }
        assert_eq!(gaps[0].group_name, "Alpha");
        assert_eq!(gaps[1].group_name, "Zeta");
        assert_eq!(gaps.last().unwrap().gap_type, GapType::Met);
    }

    #[test]
    fn test_summary_counts_and_readiness() {
        let role = requirements(
            vec![
                capability_req("a", "A", Some("advanced")),
                capability_req("b", "B", Some("advanced")),
                capability_req("c", "C", Some("advanced")),
            ],
            vec![],
        );
        let profile = holdings(
            vec![
                capability_held("b", "B", Some("intermediate")),
                capability_held("c", "C", Some("expert")),
            ],
            vec![],
        );

        let summary = analyze_gaps(&role, &profile).summary;
        assert_eq!(summary.critical_gaps, 1);
        assert_eq!(summary.minor_gaps, 1);
        assert_eq!(summary.met_requirements, 1);
        // mean(100, 50, 0) = 50
        assert_eq!(summary.overall_readiness, 50.0);
    }

    #[test]
    fn test_empty_role_readiness_is_defined() {
        let analysis = analyze_gaps(&requirements(vec![], vec![]), &holdings(vec![], vec![]));
        assert!(analysis.gaps.is_empty());
        assert_eq!(analysis.summary.overall_readiness, EMPTY_ROLE_READINESS);
        assert!(!analysis.summary.overall_readiness.is_nan());
    }

    #[test]
    fn test_severity_of_seventy_is_minor() {
        let gap = GapEntry {
            id: "x".into(),
            name: "X".into(),
            group_name: "G".into(),
            kind: RequirementKind::Capability,
            held_level: None,
            required_level: Level::new(3),
            gap_type: GapType::Insufficient,
            severity: 70.0,
            description: String::new(),
        };
        let summary = summarize(&[gap]);
        assert_eq!(summary.critical_gaps, 0);
        assert_eq!(summary.minor_gaps, 1);
    }

    #[test]
    fn test_recommendations_skip_met_and_follow_gap_order() {
        let role = requirements(
            vec![
                capability_req("a", "Strategy", Some("expert")),
                capability_req("b", "Coaching", Some("advanced")),
                capability_req("c", "Planning", Some("basic")),
            ],
            vec![],
        );
        let profile = holdings(
            vec![
                capability_held("b", "Coaching", Some("intermediate")),
                capability_held("c", "Planning", Some("expert")),
            ],
            vec![],
        );

        let recs = analyze_gaps(&role, &profile).recommendations;
        assert_eq!(recs.len(), 2);
        assert!(recs[0].starts_with("Acquire Strategy"));
        assert!(recs[1].contains("from Intermediate to Advanced"));
    }
}
