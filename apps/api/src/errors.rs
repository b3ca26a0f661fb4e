use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::analysis::operation::Operation;
use crate::loader::LoadError;

/// Fixed vocabulary of failure types reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    InvalidInput,
    DataNotFound,
    AnalysisError,
    ScoringError,
    AssessmentError,
}

impl ErrorType {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorType::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorType::DataNotFound => StatusCode::NOT_FOUND,
            ErrorType::AnalysisError | ErrorType::ScoringError | ErrorType::AssessmentError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Operation-level error. Every public operation returns `Result<T, AppError>`
/// which the envelope layer turns into the caller-facing shape.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    DataNotFound(String),

    #[error("{operation} failed: {cause:#}")]
    Failed {
        operation: Operation,
        #[source]
        cause: anyhow::Error,
    },
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// Maps a loader failure into the operation's error space. Unresolved ids
    /// stay `DATA_NOT_FOUND`; anything else becomes the operation's failure type.
    pub fn from_load(operation: Operation, err: LoadError) -> Self {
        match err {
            LoadError::NotFound { entity, id } => {
                AppError::DataNotFound(format!("{entity} '{id}' not found"))
            }
            other => AppError::Failed {
                operation,
                cause: anyhow::Error::new(other),
            },
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            AppError::InvalidInput(_) => ErrorType::InvalidInput,
            AppError::DataNotFound(_) => ErrorType::DataNotFound,
            AppError::Failed { operation, .. } => operation.failure_type(),
        }
    }

    /// Structured details for the envelope: the rendered cause chain, if any.
    pub fn details(&self) -> Option<Value> {
        match self {
            AppError::Failed { operation, cause } => Some(json!({
                "operation": operation.name(),
                "cause": format!("{cause:#}"),
            })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_not_found_load_error_maps_to_data_not_found() {
        let err = AppError::from_load(
            Operation::GapAnalysis,
            LoadError::NotFound {
                entity: "role",
                id: "r-9".into(),
            },
        );
        assert_eq!(err.error_type(), ErrorType::DataNotFound);
        assert!(err.to_string().contains("r-9"));
        assert!(err.details().is_none());
    }

    #[test]
    fn test_timeout_maps_to_operation_failure_type() {
        let err = AppError::from_load(
            Operation::Readiness,
            LoadError::Timeout {
                entity: "profile",
                id: "p-1".into(),
                after: Duration::from_millis(10),
            },
        );
        assert_eq!(err.error_type(), ErrorType::AssessmentError);
        let details = err.details().unwrap();
        assert_eq!(details["operation"], "readiness");
        assert!(details["cause"].as_str().unwrap().contains("p-1"));
    }

    #[test]
    fn test_error_type_serializes_screaming_snake() {
        let value = serde_json::to_value(ErrorType::DataNotFound).unwrap();
        assert_eq!(value, "DATA_NOT_FOUND");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorType::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorType::DataNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorType::ScoringError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
