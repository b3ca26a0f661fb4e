//! Axum route handlers for the Analysis API.
//!
//! Handlers are thin: parse the body, call the matching `AnalysisContext`
//! operation, optionally narrate, and wrap everything in the envelope.
//! Malformed bodies become `INVALID_INPUT` envelopes, not axum rejections.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::batch::BatchFitResult;
use crate::analysis::envelope::Envelope;
use crate::analysis::gaps::GapAnalysis;
use crate::analysis::heatmap::{GroupBy, HeatmapReport};
use crate::analysis::operation::Operation;
use crate::analysis::prompts::{narration_prompt, NARRATION_SYSTEM};
use crate::analysis::readiness::ReadinessAssessment;
use crate::analysis::service::Report;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Body for the one-profile, one-role operations (gaps, readiness).
#[derive(Debug, Deserialize)]
pub struct PairRequest {
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub role_id: String,
    #[serde(default)]
    pub narrate: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoleFitRequest {
    #[serde(default)]
    pub profile_id: String,
    pub role_ids: Option<Vec<String>>,
    #[serde(default)]
    pub narrate: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProfileFitRequest {
    #[serde(default)]
    pub role_id: String,
    pub profile_ids: Option<Vec<String>>,
    #[serde(default)]
    pub narrate: bool,
}

#[derive(Debug, Deserialize)]
pub struct HeatmapRequest {
    pub company_ids: Option<Vec<String>>,
    /// Defaults to taxonomy.
    pub group_by: Option<GroupBy>,
    #[serde(default)]
    pub narrate: bool,
}

fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::invalid(rejection.body_text()))
}

/// Adds a model-written summary when asked. Never fails the report.
async fn narrate<T>(
    llm: Option<&LlmClient>,
    operation: Operation,
    requested: bool,
    mut report: Report<T>,
) -> Report<T> {
    if !requested {
        return report;
    }
    let Some(llm) = llm else {
        warn!("Narration requested for {operation} but no LLM client is configured");
        return report;
    };

    let prompt = narration_prompt(operation, &report.narrative);
    match llm.summarize(NARRATION_SYSTEM, &prompt).await {
        Ok(text) => {
            info!("Narration added for {operation} ({} chars)", text.len());
            report.narration = Some(text);
        }
        Err(e) => warn!("Narration failed for {operation}: {e}"),
    }
    report
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis/gaps
pub async fn handle_gaps(
    State(state): State<AppState>,
    payload: Result<Json<PairRequest>, JsonRejection>,
) -> Envelope<Report<GapAnalysis>> {
    let result: Result<Report<GapAnalysis>, AppError> = async {
        let req = parse(payload)?;
        let report = state
            .analysis
            .analyze_gaps(&req.profile_id, &req.role_id)
            .await?;
        Ok(narrate(state.llm.as_ref(), Operation::GapAnalysis, req.narrate, report).await)
    }
    .await;
    result.into()
}

/// POST /api/v1/analysis/fit/roles
pub async fn handle_role_fit(
    State(state): State<AppState>,
    payload: Result<Json<RoleFitRequest>, JsonRejection>,
) -> Envelope<Report<BatchFitResult>> {
    let result: Result<Report<BatchFitResult>, AppError> = async {
        let req = parse(payload)?;
        let report = state
            .analysis
            .score_roles_for_profile(&req.profile_id, req.role_ids.as_deref())
            .await?;
        Ok(narrate(state.llm.as_ref(), Operation::RoleFit, req.narrate, report).await)
    }
    .await;
    result.into()
}

/// POST /api/v1/analysis/fit/profiles
pub async fn handle_profile_fit(
    State(state): State<AppState>,
    payload: Result<Json<ProfileFitRequest>, JsonRejection>,
) -> Envelope<Report<BatchFitResult>> {
    let result: Result<Report<BatchFitResult>, AppError> = async {
        let req = parse(payload)?;
        let report = state
            .analysis
            .score_profiles_for_role(&req.role_id, req.profile_ids.as_deref())
            .await?;
        Ok(narrate(state.llm.as_ref(), Operation::ProfileFit, req.narrate, report).await)
    }
    .await;
    result.into()
}

/// POST /api/v1/analysis/readiness
pub async fn handle_readiness(
    State(state): State<AppState>,
    payload: Result<Json<PairRequest>, JsonRejection>,
) -> Envelope<Report<ReadinessAssessment>> {
    let result: Result<Report<ReadinessAssessment>, AppError> = async {
        let req = parse(payload)?;
        let report = state
            .analysis
            .assess_readiness(&req.profile_id, &req.role_id)
            .await?;
        Ok(narrate(state.llm.as_ref(), Operation::Readiness, req.narrate, report).await)
    }
    .await;
    result.into()
}

/// POST /api/v1/analysis/heatmap
pub async fn handle_heatmap(
    State(state): State<AppState>,
    payload: Result<Json<HeatmapRequest>, JsonRejection>,
) -> Envelope<Report<HeatmapReport>> {
    let result: Result<Report<HeatmapReport>, AppError> = async {
        let req = parse(payload)?;
        let group_by = req.group_by.unwrap_or(GroupBy::Taxonomy);
        let report = state
            .analysis
            .build_heatmap(req.company_ids.as_deref(), group_by)
            .await?;
        Ok(narrate(state.llm.as_ref(), Operation::Heatmap, req.narrate, report).await)
    }
    .await;
    result.into()
}
