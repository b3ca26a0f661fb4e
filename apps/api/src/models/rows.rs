use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::analysis::levels::{held_level, required_level};
use crate::models::records::{group_or_default, HoldingRecord, RequirementKind, RequirementRecord};

/// A capability or skill row joined with its owner's level label.
/// Shared by the role-requirement and profile-holding queries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeveledItemRow {
    pub id: String,
    pub name: String,
    pub group_name: Option<String>,
    pub level: Option<String>,
}

impl LeveledItemRow {
    pub fn into_requirement(self, kind: RequirementKind) -> RequirementRecord {
        RequirementRecord {
            required_level: required_level(self.level.as_deref()),
            id: self.id,
            name: self.name,
            group_name: group_or_default(self.group_name),
            kind,
        }
    }

    pub fn into_holding(self, kind: RequirementKind) -> HoldingRecord {
        HoldingRecord {
            held_level: held_level(self.level.as_deref()),
            id: self.id,
            name: self.name,
            group_name: group_or_default(self.group_name),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HeatmapDbRow {
    pub group_name: Option<String>,
    pub capability: String,
    pub role_count: i64,
    pub total_roles_in_group: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: Option<&str>, group: Option<&str>) -> LeveledItemRow {
        LeveledItemRow {
            id: "c1".into(),
            name: "Leadership".into(),
            group_name: group.map(String::from),
            level: level.map(String::from),
        }
    }

    #[test]
    fn test_requirement_without_level_defaults_to_intermediate() {
        let req = row(None, None).into_requirement(RequirementKind::Capability);
        assert_eq!(req.required_level.value(), 2);
        assert_eq!(req.group_name, crate::models::records::DEFAULT_GROUP_NAME);
    }

    #[test]
    fn test_holding_without_level_is_absent() {
        let held = row(None, Some("People")).into_holding(RequirementKind::Skill);
        assert_eq!(held.held_level, None);
        assert_eq!(held.group_name, "People");
        assert_eq!(held.kind, RequirementKind::Skill);
    }
}
