//! Public scoring operations.
//!
//! Each operation: validate ids → load through the bounded loaders → run the
//! pure scorer → build the markdown narrative → emit progress → return.
//! Flow mirrors across operations so that every failure path ends in an
//! `AppError` and, from there, the uniform envelope.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::batch::{dedupe_candidates, fan_out, partition, BatchFitResult};
use crate::analysis::fit::compute_fit;
use crate::analysis::gaps::{self, GapAnalysis};
use crate::analysis::heatmap::{build_heatmap, GroupBy, HeatmapReport};
use crate::analysis::operation::Operation;
use crate::analysis::prompts;
use crate::analysis::readiness::{assess_readiness, ReadinessAssessment};
use crate::config::Config;
use crate::errors::AppError;
use crate::loader::{with_timeout, HeatmapRowSource, RequirementLoader};
use crate::models::records::{ProfileHoldings, RoleRequirements};
use crate::progress::{emit_progress, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub timeout: Duration,
    pub max_concurrency: usize,
}

impl FetchLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.fetch_timeout,
            max_concurrency: config.batch_concurrency,
        }
    }
}

/// Collaborators for the scoring operations. Cheap to clone.
#[derive(Clone)]
pub struct AnalysisContext {
    pub loader: Arc<dyn RequirementLoader>,
    pub heatmap_source: Arc<dyn HeatmapRowSource>,
    pub progress: Arc<dyn ProgressSink>,
    pub limits: FetchLimits,
}

/// An operation result plus its markdown narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<T> {
    #[serde(flatten)]
    pub result: T,
    pub narrative: String,
    /// Model-written summary; null unless narration was requested and succeeded.
    pub narration: Option<String>,
}

impl<T> Report<T> {
    fn new(result: T, narrative: String) -> Self {
        Self {
            result,
            narrative,
            narration: None,
        }
    }
}

/// Trims an id and rejects it when blank.
pub fn require_id<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid(format!("{field} is required")));
    }
    Ok(trimmed)
}

async fn load_profile(
    loader: &dyn RequirementLoader,
    limits: FetchLimits,
    operation: Operation,
    profile_id: &str,
) -> Result<ProfileHoldings, AppError> {
    with_timeout(
        limits.timeout,
        "profile",
        profile_id,
        loader.load_profile_holdings(profile_id),
    )
    .await
    .map_err(|e| AppError::from_load(operation, e))
}

async fn load_role(
    loader: &dyn RequirementLoader,
    limits: FetchLimits,
    operation: Operation,
    role_id: &str,
) -> Result<RoleRequirements, AppError> {
    with_timeout(
        limits.timeout,
        "role",
        role_id,
        loader.load_role_requirements(role_id),
    )
    .await
    .map_err(|e| AppError::from_load(operation, e))
}

impl AnalysisContext {
    fn emit(&self, operation: Operation, subject: String, narrative: &str) {
        emit_progress(
            self.progress.clone(),
            ProgressEvent::new(operation, subject, narrative),
        );
    }

    async fn load_pair(
        &self,
        operation: Operation,
        profile_id: &str,
        role_id: &str,
    ) -> Result<(ProfileHoldings, RoleRequirements), AppError> {
        let loader = self.loader.as_ref();
        tokio::try_join!(
            load_profile(loader, self.limits, operation, profile_id),
            load_role(loader, self.limits, operation, role_id),
        )
    }

    pub async fn analyze_gaps(
        &self,
        profile_id: &str,
        role_id: &str,
    ) -> Result<Report<GapAnalysis>, AppError> {
        let operation = Operation::GapAnalysis;
        let profile_id = require_id("profile_id", profile_id)?;
        let role_id = require_id("role_id", role_id)?;
        info!("Gap analysis: profile {profile_id} vs role {role_id}");

        let (holdings, requirements) = self.load_pair(operation, profile_id, role_id).await?;
        let analysis = gaps::analyze_gaps(&requirements, &holdings);
        info!(
            "Gap analysis done: {} requirements, readiness {:.1}",
            analysis.gaps.len(),
            analysis.summary.overall_readiness
        );

        let narrative = prompts::gap_narrative(&analysis);
        self.emit(
            operation,
            format!("profile {profile_id} / role {role_id}"),
            &narrative,
        );
        Ok(Report::new(analysis, narrative))
    }

    /// Scores many roles against one profile. `role_ids: None` is invalid
    /// input; an empty list is a valid, empty batch.
    pub async fn score_roles_for_profile(
        &self,
        profile_id: &str,
        role_ids: Option<&[String]>,
    ) -> Result<Report<BatchFitResult>, AppError> {
        let operation = Operation::RoleFit;
        let profile_id = require_id("profile_id", profile_id)?;
        let role_ids = role_ids.ok_or_else(|| AppError::invalid("role_ids is required"))?;
        info!("Scoring {} roles for profile {profile_id}", role_ids.len());

        let holdings = Arc::new(
            load_profile(self.loader.as_ref(), self.limits, operation, profile_id).await?,
        );

        let loader = self.loader.clone();
        let limits = self.limits;
        let outcomes = fan_out(
            operation,
            dedupe_candidates(role_ids),
            limits.max_concurrency,
            move |role_id| {
                let loader = loader.clone();
                let holdings = holdings.clone();
                async move {
                    let role_id = require_id("role_id", &role_id)?;
                    let requirements =
                        load_role(loader.as_ref(), limits, operation, role_id).await?;
                    Ok::<_, AppError>(compute_fit(&requirements, &holdings))
                }
            },
        )
        .await;

        self.finish_batch(operation, profile_id, outcomes)
    }

    /// Scores many profiles against one role. Same contract as
    /// [`Self::score_roles_for_profile`] with the sides swapped.
    pub async fn score_profiles_for_role(
        &self,
        role_id: &str,
        profile_ids: Option<&[String]>,
    ) -> Result<Report<BatchFitResult>, AppError> {
        let operation = Operation::ProfileFit;
        let role_id = require_id("role_id", role_id)?;
        let profile_ids =
            profile_ids.ok_or_else(|| AppError::invalid("profile_ids is required"))?;
        info!("Scoring {} profiles for role {role_id}", profile_ids.len());

        let requirements =
            Arc::new(load_role(self.loader.as_ref(), self.limits, operation, role_id).await?);

        let loader = self.loader.clone();
        let limits = self.limits;
        let outcomes = fan_out(
            operation,
            dedupe_candidates(profile_ids),
            limits.max_concurrency,
            move |profile_id| {
                let loader = loader.clone();
                let requirements = requirements.clone();
                async move {
                    let profile_id = require_id("profile_id", &profile_id)?;
                    let holdings =
                        load_profile(loader.as_ref(), limits, operation, profile_id).await?;
                    Ok::<_, AppError>(compute_fit(&requirements, &holdings))
                }
            },
        )
        .await;

        self.finish_batch(operation, role_id, outcomes)
    }

    fn finish_batch(
        &self,
        operation: Operation,
        anchor_id: &str,
        outcomes: Vec<crate::analysis::batch::CandidateOutcome>,
    ) -> Result<Report<BatchFitResult>, AppError> {
        let result = partition(anchor_id, outcomes);
        info!(
            "{operation} for {anchor_id}: {} scored, {} skipped",
            result.scores.len(),
            result.failures.len()
        );

        let narrative = prompts::batch_narrative(operation, &result);
        self.emit(operation, anchor_id.to_string(), &narrative);
        Ok(Report::new(result, narrative))
    }

    pub async fn assess_readiness(
        &self,
        profile_id: &str,
        role_id: &str,
    ) -> Result<Report<ReadinessAssessment>, AppError> {
        let operation = Operation::Readiness;
        let profile_id = require_id("profile_id", profile_id)?;
        let role_id = require_id("role_id", role_id)?;
        info!("Readiness: profile {profile_id} for role {role_id}");

        let (holdings, requirements) = self.load_pair(operation, profile_id, role_id).await?;
        let assessment = assess_readiness(&requirements, &holdings);
        info!(
            "Readiness done: {:.1} ({})",
            assessment.score,
            assessment.readiness_level.label()
        );

        let narrative = prompts::readiness_narrative(&assessment);
        self.emit(
            operation,
            format!("profile {profile_id} / role {role_id}"),
            &narrative,
        );
        Ok(Report::new(assessment, narrative))
    }

    pub async fn build_heatmap(
        &self,
        company_ids: Option<&[String]>,
        group_by: GroupBy,
    ) -> Result<Report<HeatmapReport>, AppError> {
        let operation = Operation::Heatmap;
        let company_ids: Vec<String> = company_ids
            .unwrap_or_default()
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();
        if company_ids.is_empty() {
            return Err(AppError::invalid("company_ids must name at least one company"));
        }
        let scope = company_ids.join(",");
        info!("Heatmap by {} for companies {scope}", group_by.as_str());

        let rows = with_timeout(
            self.limits.timeout,
            "companies",
            &scope,
            self.heatmap_source.load_heatmap_rows(&company_ids, group_by),
        )
        .await
        .map_err(|e| AppError::from_load(operation, e))?;

        let report = build_heatmap(&rows, group_by);
        info!(
            "Heatmap done: {}x{} matrix",
            report.summary.matrix_dimensions.rows, report.summary.matrix_dimensions.columns
        );

        let narrative = prompts::heatmap_narrative(&report);
        self.emit(operation, format!("companies {scope}"), &narrative);
        Ok(Report::new(report, narrative))
    }
}
