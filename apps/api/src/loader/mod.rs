//! Data boundary for the scoring engine.
//!
//! The engine only sees these traits; `PgStore` is the production backend.
//! Carried in `AnalysisContext` as `Arc<dyn RequirementLoader>` and
//! `Arc<dyn HeatmapRowSource>`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::heatmap::{GroupBy, HeatmapRow};
use crate::models::records::{ProfileHoldings, RoleRequirements};

pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("loading {entity} '{id}' timed out after {}ms", after.as_millis())]
    Timeout {
        entity: &'static str,
        id: String,
        after: Duration,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait RequirementLoader: Send + Sync {
    /// Fails with `LoadError::NotFound` when the role id does not resolve.
    async fn load_role_requirements(&self, role_id: &str) -> Result<RoleRequirements, LoadError>;

    /// Fails with `LoadError::NotFound` when the profile id does not resolve.
    async fn load_profile_holdings(&self, profile_id: &str)
        -> Result<ProfileHoldings, LoadError>;
}

#[async_trait]
pub trait HeatmapRowSource: Send + Sync {
    async fn load_heatmap_rows(
        &self,
        company_ids: &[String],
        group_by: GroupBy,
    ) -> Result<Vec<HeatmapRow>, LoadError>;
}

/// Bounds a fetch by `limit`, turning an elapsed timer into `LoadError::Timeout`.
/// Dropping the returned future drops the fetch with it.
pub async fn with_timeout<T, F>(
    limit: Duration,
    entity: &'static str,
    id: &str,
    fetch: F,
) -> Result<T, LoadError>
where
    F: Future<Output = Result<T, LoadError>>,
{
    match tokio::time::timeout(limit, fetch).await {
        Ok(result) => result,
        Err(_) => Err(LoadError::Timeout {
            entity,
            id: id.to_string(),
            after: limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_through_fast_results() {
        let result = with_timeout(Duration::from_millis(50), "role", "r1", async {
            Ok::<_, LoadError>(3)
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_reports_slow_fetch() {
        let result: Result<(), LoadError> =
            with_timeout(Duration::from_millis(20), "profile", "p7", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        match result {
            Err(LoadError::Timeout { entity, id, after }) => {
                assert_eq!(entity, "profile");
                assert_eq!(id, "p7");
                assert_eq!(after, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_message_mentions_id() {
        let err = LoadError::Timeout {
            entity: "role",
            id: "r2".into(),
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "loading role 'r2' timed out after 250ms");
    }
}
