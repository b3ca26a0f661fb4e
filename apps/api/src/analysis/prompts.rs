//! Narrative templates for the scoring operations.
//! The markdown produced here is both the progress-sink payload and the input
//! handed to the narration model. Wording is free to change; the figures each
//! template carries are not.

use crate::analysis::batch::BatchFitResult;
use crate::analysis::gaps::{GapAnalysis, GapType};
use crate::analysis::heatmap::HeatmapReport;
use crate::analysis::operation::Operation;
use crate::analysis::readiness::ReadinessAssessment;

/// How many ranked candidates a batch narrative lists.
pub const TOP_N: usize = 5;
const GAP_TABLE_ROWS: usize = 10;

/// System prompt for narrating an analysis back to the user.
pub const NARRATION_SYSTEM: &str = "You are an HR analytics assistant. \
    You explain capability and skill analyses to managers in plain language. \
    Use ONLY the figures provided in the analysis. \
    Do NOT invent people, roles, scores or percentages. \
    Keep the answer under 200 words and end with one concrete next step.";

/// Narration prompt template. Replace `{operation}` and `{analysis}` before sending.
pub const NARRATION_PROMPT_TEMPLATE: &str = r#"Summarize the following {operation} result for the user.

ANALYSIS (markdown, authoritative):
{analysis}

Lead with the headline number, then the two or three most important gaps or
rankings, then the recommended next step."#;

pub fn narration_prompt(operation: Operation, analysis: &str) -> String {
    NARRATION_PROMPT_TEMPLATE
        .replace("{operation}", &operation.name().replace('_', " "))
        .replace("{analysis}", analysis)
}

fn gap_label(gap_type: GapType) -> &'static str {
    match gap_type {
        GapType::Missing => "missing",
        GapType::Insufficient => "insufficient",
        GapType::Met => "met",
    }
}

pub fn gap_narrative(analysis: &GapAnalysis) -> String {
    let summary = &analysis.summary;
    let mut md = format!(
        "## Gap analysis: profile {} vs role {}\n\n",
        analysis.profile_id, analysis.role_id
    );
    md.push_str(&format!(
        "**Overall readiness:** {:.1}%  \n**Critical gaps:** {} · **Minor gaps:** {} · **Met:** {}\n\n",
        summary.overall_readiness,
        summary.critical_gaps,
        summary.minor_gaps,
        summary.met_requirements
    ));

    if analysis.gaps.is_empty() {
        md.push_str("The role lists no capability or skill requirements.\n");
        return md;
    }

    md.push_str("| Requirement | Group | Status | Current | Required | Severity |\n");
    md.push_str("|---|---|---|---|---|---|\n");
    for gap in analysis.gaps.iter().take(GAP_TABLE_ROWS) {
        let current = gap
            .held_level
            .map(|l| l.label().to_string())
            .unwrap_or_else(|| "—".to_string());
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {:.0} |\n",
            gap.name,
            gap.group_name,
            gap_label(gap.gap_type),
            current,
            gap.required_level.label(),
            gap.severity
        ));
    }
    if analysis.gaps.len() > GAP_TABLE_ROWS {
        md.push_str(&format!(
            "\n…and {} more requirement(s).\n",
            analysis.gaps.len() - GAP_TABLE_ROWS
        ));
    }

    if !analysis.recommendations.is_empty() {
        md.push_str("\n### Recommendations\n");
        for (i, rec) in analysis.recommendations.iter().enumerate() {
            md.push_str(&format!("{}. {rec}\n", i + 1));
        }
    }
    md
}

pub fn batch_narrative(operation: Operation, result: &BatchFitResult) -> String {
    let (anchor, candidates) = match operation {
        Operation::ProfileFit => ("role", "profiles"),
        _ => ("profile", "roles"),
    };
    let mut md = format!(
        "## Fit ranking: {} {} across {} {}\n\n",
        anchor,
        result.anchor_id,
        result.scores.len(),
        candidates
    );

    if result.ranking.is_empty() {
        md.push_str("No candidates could be scored.\n");
    } else {
        md.push_str(&format!("### Top {}\n", TOP_N.min(result.ranking.len())));
        for (i, ranked) in result.ranking.iter().take(TOP_N).enumerate() {
            let fit = &result.scores[&ranked.candidate_id];
            md.push_str(&format!(
                "{}. **{}** — {:.0}% (capabilities {}/{} met, skills {}/{} met)\n",
                i + 1,
                ranked.candidate_id,
                fit.score * 100.0,
                fit.details.capabilities.met,
                fit.details.capabilities.met
                    + fit.details.capabilities.insufficient
                    + fit.details.capabilities.missing,
                fit.details.skills.met,
                fit.details.skills.met + fit.details.skills.insufficient + fit.details.skills.missing,
            ));
        }
    }

    if !result.failures.is_empty() {
        let skipped: Vec<&str> = result
            .failures
            .iter()
            .map(|f| f.candidate_id.as_str())
            .collect();
        md.push_str(&format!(
            "\n_Skipped {} candidate(s): {}_\n",
            skipped.len(),
            skipped.join(", ")
        ));
    }
    md
}

pub fn readiness_narrative(assessment: &ReadinessAssessment) -> String {
    let mut md = format!(
        "## Readiness: profile {} for role {}\n\n**{}** — {:.1}/100 (capabilities {:.1}, skills {:.1})\n\n",
        assessment.profile_id,
        assessment.role_id,
        assessment.readiness_level.label(),
        assessment.score,
        assessment.capability_score,
        assessment.skill_score
    );

    if !assessment.critical_gaps.is_empty() {
        md.push_str("### Critical gaps\n");
        for gap in &assessment.critical_gaps {
            md.push_str(&format!("- {} ({}): {}\n", gap.name, gap.group_name, gap.description));
        }
        md.push('\n');
    }

    let timeline = &assessment.development_timeline;
    md.push_str("### Development timeline\n");
    for (label, bucket) in [
        ("Short term", &timeline.short_term),
        ("Medium term", &timeline.medium_term),
        ("Long term", &timeline.long_term),
    ] {
        let names: Vec<&str> = bucket.iter().map(|g| g.name.as_str()).collect();
        let listed = if names.is_empty() {
            "nothing".to_string()
        } else {
            names.join(", ")
        };
        md.push_str(&format!("- {label}: {listed}\n"));
    }
    md
}

pub fn heatmap_narrative(report: &HeatmapReport) -> String {
    let summary = &report.summary;
    let mut md = format!(
        "## Capability heatmap by {}\n\n{} roles across {} groups, {} distinct capabilities.\n\n",
        report.group_by.as_str(),
        summary.total_roles,
        summary.total_groups,
        summary.total_capabilities
    );
    md.push_str("```csv\n");
    md.push_str(&report.csv_rendering);
    md.push_str("```\n");
    md
}
