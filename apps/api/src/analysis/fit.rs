//! Fit scoring: binary met/unmet alignment of a profile against a role.
//!
//! This is the authoritative fit metric: ranking, batch scoring and the
//! `score` shown to users all come from `compute_fit`. The continuous
//! `min(held / required, 1)` metric lives in `readiness` as the readiness
//! match ratio and is never used to rank candidates.
//!
//! score = capability_alignment × 0.6 + skill_alignment × 0.4

use serde::{Deserialize, Serialize};

use crate::analysis::levels::{self, Level, SKILL_MET_THRESHOLD};
use crate::models::records::{ProfileHoldings, RequirementRecord, RoleRequirements};

pub const CAPABILITY_WEIGHT: f64 = 0.6;
pub const SKILL_WEIGHT: f64 = 0.4;

/// The 60/40 capability/skill blend used by every score in the engine.
pub fn weighted(capability: f64, skill: f64) -> f64 {
    CAPABILITY_WEIGHT * capability + SKILL_WEIGHT * skill
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFactors {
    pub capability_alignment: f64,
    pub skill_alignment: f64,
    /// Same ratio as `capability_alignment`; kept separate for display.
    pub capability_coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityFitDetails {
    pub met: usize,
    pub insufficient: usize,
    pub missing: usize,
    pub score: f64,
    pub coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFitDetails {
    pub met: usize,
    pub insufficient: usize,
    pub missing: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitDetails {
    pub capabilities: CapabilityFitDetails,
    pub skills: SkillFitDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitScore {
    pub score: f64, // 0.0 – 1.0
    pub factors: FitFactors,
    pub details: FitDetails,
}

#[derive(Debug, Default)]
struct Tally {
    met: usize,
    insufficient: usize,
    missing: usize,
}

impl Tally {
    fn count(
        requirements: &[RequirementRecord],
        holdings: &ProfileHoldings,
        is_met: impl Fn(Level, &RequirementRecord) -> bool,
    ) -> Self {
        let mut tally = Tally::default();
        for req in requirements {
            match holdings.level_for(req) {
                None => tally.missing += 1,
                Some(level) if is_met(level, req) => tally.met += 1,
                Some(_) => tally.insufficient += 1,
            }
        }
        tally
    }

    fn total(&self) -> usize {
        self.met + self.insufficient + self.missing
    }

    /// met / total, with an empty requirement set scoring 0.
    fn alignment(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.met as f64 / total as f64,
        }
    }
}

/// Scores one profile against one role.
///
/// Capabilities are met when the held level reaches the requirement's own
/// level; skills are met from [`SKILL_MET_THRESHOLD`] regardless of the
/// requirement.
pub fn compute_fit(requirements: &RoleRequirements, holdings: &ProfileHoldings) -> FitScore {
    let capabilities = Tally::count(&requirements.capabilities, holdings, |held, req| {
        levels::meets(held, req.required_level)
    });
    let skills = Tally::count(&requirements.skills, holdings, |held, _| {
        levels::meets(held, SKILL_MET_THRESHOLD)
    });

    let capability_alignment = capabilities.alignment();
    let skill_alignment = skills.alignment();

    FitScore {
        score: weighted(capability_alignment, skill_alignment),
        factors: FitFactors {
            capability_alignment,
            skill_alignment,
            capability_coverage: capability_alignment,
        },
        details: FitDetails {
            capabilities: CapabilityFitDetails {
                met: capabilities.met,
                insufficient: capabilities.insufficient,
                missing: capabilities.missing,
                score: capability_alignment,
                coverage: capability_alignment,
            },
            skills: SkillFitDetails {
                met: skills.met,
                insufficient: skills.insufficient,
                missing: skills.missing,
                score: skill_alignment,
            },
        },
    }
}
