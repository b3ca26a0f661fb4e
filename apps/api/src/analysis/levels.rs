//! Proficiency levels: label normalization and the level arithmetic shared by
//! the gap, fit and readiness scorers.
//!
//! Every scorer goes through the helpers here so that the default requirement
//! level, the skill threshold and the severity formula live in one place.

use serde::{Deserialize, Serialize};

/// Ordinal proficiency level in `[0, 5]`. `0` means unrecognized or absent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    pub const NONE: Level = Level(0);
    #[cfg(test)]
    pub const MAX: Level = Level(5);

    /// Clamps into `[0, 5]`.
    #[cfg(test)]
    pub fn new(value: u8) -> Self {
        Level(value.min(Self::MAX.0))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_recognized(self) -> bool {
        self.0 > 0
    }

    /// Canonical label for narratives. Several source labels share a value,
    /// so this is not an inverse of [`normalize`].
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Basic",
            2 => "Intermediate",
            3 => "Proficient",
            4 => "Advanced",
            5 => "Expert",
            _ => "Unrated",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

const LEVEL_TABLE: &[(&str, u8)] = &[
    ("basic", 1),
    ("foundation", 1),
    ("beginner", 1),
    ("intermediate", 2),
    ("proficient", 3),
    ("advanced", 4),
    ("expert", 5),
    ("leadership", 5),
    ("master", 5),
];

/// Label applied when a role requirement carries no level.
pub const DEFAULT_REQUIRED_LABEL: &str = "Intermediate";

/// Skills carry no per-requirement level in the source data, so fit scoring
/// treats a skill as met from this level up.
pub const SKILL_MET_THRESHOLD: Level = Level(3);

/// Maps a free-text label to a [`Level`]. Case-insensitive, ignores
/// surrounding whitespace. Unknown and empty labels map to [`Level::NONE`].
pub fn normalize(label: &str) -> Level {
    let key = label.trim().to_lowercase();
    LEVEL_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| Level(*value))
        .unwrap_or(Level::NONE)
}

/// Level a role requires, falling back to [`DEFAULT_REQUIRED_LABEL`] when the
/// source omits it.
pub fn required_level(label: Option<&str>) -> Level {
    match label.map(str::trim) {
        Some(l) if !l.is_empty() => normalize(l),
        _ => normalize(DEFAULT_REQUIRED_LABEL),
    }
}

/// Level a profile holds. A missing or blank label is an absent level,
/// not a zero.
pub fn held_level(label: Option<&str>) -> Option<Level> {
    match label.map(str::trim) {
        Some(l) if !l.is_empty() => Some(normalize(l)),
        _ => None,
    }
}

pub fn meets(held: Level, required: Level) -> bool {
    held >= required
}

/// Gap severity in `[0, 100]` for a held level against a required one.
/// `0` when met, otherwise the shortfall as a percentage of the requirement.
pub fn severity(held: Level, required: Level) -> f64 {
    if meets(held, required) {
        return 0.0;
    }
    let required = f64::from(required.value());
    let held = f64::from(held.value());
    ((required - held) / required * 100.0).clamp(0.0, 100.0)
}

/// Continuous match in `[0, 1]`: `min(held / required, 1)`.
/// A zero requirement is trivially satisfied.
pub fn match_ratio(held: Level, required: Level) -> f64 {
    if required.value() == 0 {
        return 1.0;
    }
    (f64::from(held.value()) / f64::from(required.value())).min(1.0)
}
