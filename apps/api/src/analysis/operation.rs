//! Static registry of the public scoring operations.
//!
//! Routes, progress labels and failure types are looked up here instead of in
//! per-handler string constants.

use serde::{Deserialize, Serialize};

use crate::errors::ErrorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GapAnalysis,
    RoleFit,
    ProfileFit,
    Readiness,
    Heatmap,
}

#[derive(Debug)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub route: &'static str,
    /// Error type reported when the operation fails after input validation.
    pub failure: ErrorType,
}

/// Indexed by `Operation as usize`.
pub static OPERATIONS: [OperationDescriptor; 5] = [
    OperationDescriptor {
        name: "gap_analysis",
        route: "/api/v1/analysis/gaps",
        failure: ErrorType::AnalysisError,
    },
    OperationDescriptor {
        name: "role_fit",
        route: "/api/v1/analysis/fit/roles",
        failure: ErrorType::ScoringError,
    },
    OperationDescriptor {
        name: "profile_fit",
        route: "/api/v1/analysis/fit/profiles",
        failure: ErrorType::ScoringError,
    },
    OperationDescriptor {
        name: "readiness",
        route: "/api/v1/analysis/readiness",
        failure: ErrorType::AssessmentError,
    },
    OperationDescriptor {
        name: "heatmap",
        route: "/api/v1/analysis/heatmap",
        failure: ErrorType::AnalysisError,
    },
];

impl Operation {
    pub fn descriptor(self) -> &'static OperationDescriptor {
        &OPERATIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn route(self) -> &'static str {
        self.descriptor().route
    }

    pub fn failure_type(self) -> ErrorType {
        self.descriptor().failure
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
