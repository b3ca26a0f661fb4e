use serde::{Deserialize, Serialize};

use crate::analysis::levels::Level;

/// Group assigned when the source row has no group name.
pub const DEFAULT_GROUP_NAME: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Capability,
    Skill,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::Capability => "capability",
            RequirementKind::Skill => "skill",
        }
    }
}

/// One capability or skill a role requires, at a minimum level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementRecord {
    pub id: String,
    pub name: String,
    pub group_name: String,
    pub required_level: Level,
    pub kind: RequirementKind,
}

/// One capability or skill a profile holds. `held_level` is `None` when the
/// record exists but carries no level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub id: String,
    pub name: String,
    pub group_name: String,
    pub held_level: Option<Level>,
    pub kind: RequirementKind,
}

/// Everything a role requires, split by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRequirements {
    pub role_id: String,
    pub capabilities: Vec<RequirementRecord>,
    pub skills: Vec<RequirementRecord>,
}

impl RoleRequirements {
    pub fn iter(&self) -> impl Iterator<Item = &RequirementRecord> {
        self.capabilities.iter().chain(self.skills.iter())
    }
}

/// Everything a profile holds, split by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileHoldings {
    pub profile_id: String,
    pub capabilities: Vec<HoldingRecord>,
    pub skills: Vec<HoldingRecord>,
}

impl ProfileHoldings {
    pub fn of_kind(&self, kind: RequirementKind) -> &[HoldingRecord] {
        match kind {
            RequirementKind::Capability => &self.capabilities,
            RequirementKind::Skill => &self.skills,
        }
    }

    /// Finds the holding matching a requirement: same kind, id first, then a
    /// case-insensitive name match.
    pub fn find(&self, requirement: &RequirementRecord) -> Option<&HoldingRecord> {
        let pool = self.of_kind(requirement.kind);
        pool.iter()
            .find(|h| h.id == requirement.id)
            .or_else(|| {
                let wanted = requirement.name.trim().to_lowercase();
                pool.iter().find(|h| h.name.trim().to_lowercase() == wanted)
            })
    }

    /// Usable level for a requirement, or `None` when the profile has no
    /// record, no level, or an unrecognized level label.
    pub fn level_for(&self, requirement: &RequirementRecord) -> Option<Level> {
        self.find(requirement)
            .and_then(|h| h.held_level)
            .filter(|level| level.is_recognized())
    }
}

/// Normalizes an optional group name from a source row.
pub fn group_or_default(group: Option<String>) -> String {
    group
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string())
}
