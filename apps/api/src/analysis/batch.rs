//! Batch Fit Scorer: one anchor (profile or role) against many candidates.
//!
//! Candidates are scored concurrently, bounded by a semaphore. Every
//! candidate yields a `Result`; the final partition step splits them into the
//! score map and the failure list, so one bad candidate never sinks the batch.
//! Outcomes are keyed by candidate id, not completion order.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::analysis::fit::FitScore;
use crate::analysis::operation::Operation;
use crate::errors::{AppError, ErrorType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub candidate_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub candidate_id: String,
    pub error_type: ErrorType,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFitResult {
    /// The fixed side of the batch: the profile for role fit, the role for profile fit.
    pub anchor_id: String,
    pub scores: BTreeMap<String, FitScore>,
    /// Score descending, candidate id ascending on ties.
    pub ranking: Vec<RankedCandidate>,
    pub failures: Vec<CandidateFailure>,
}

pub type CandidateOutcome = (String, Result<FitScore, AppError>);

/// Trims ids and drops repeats, keeping first-seen order. `" r1 "` and
/// `"r1"` are the same candidate; every blank id collapses to one `""`.
pub fn dedupe_candidates(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Runs `score_one` for every candidate with at most `max_concurrency` in
/// flight. Dropping the returned future aborts the in-flight tasks.
pub async fn fan_out<F, Fut>(
    operation: Operation,
    candidate_ids: Vec<String>,
    max_concurrency: usize,
    score_one: F,
) -> Vec<CandidateOutcome>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<FitScore, AppError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for candidate_id in &candidate_ids {
        let semaphore = semaphore.clone();
        let scoring = score_one(candidate_id.clone());
        let candidate_id = candidate_id.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (candidate_id, scoring.await)
        });
    }

    let mut outcomes = Vec::with_capacity(candidate_ids.len());
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!("Candidate scoring task did not complete: {e}"),
        }
    }

    // A panicked task loses its id in the JoinError; recover it by elimination.
    if outcomes.len() < candidate_ids.len() {
        let finished: HashSet<String> = outcomes.iter().map(|(id, _)| id.clone()).collect();
        for candidate_id in candidate_ids {
            if !finished.contains(&candidate_id) {
                let cause = anyhow::anyhow!("scoring task for candidate '{candidate_id}' aborted");
                outcomes.push((candidate_id, Err(AppError::Failed { operation, cause })));
            }
        }
    }

    outcomes
}

pub fn rank(scores: &BTreeMap<String, FitScore>) -> Vec<RankedCandidate> {
    let mut ranking: Vec<RankedCandidate> = scores
        .iter()
        .map(|(id, fit)| RankedCandidate {
            candidate_id: id.clone(),
            score: fit.score,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });
    ranking
}

/// Splits outcomes into scores and failures and ranks the scores.
pub fn partition(anchor_id: &str, outcomes: Vec<CandidateOutcome>) -> BatchFitResult {
    let mut scores = BTreeMap::new();
    let mut failures = Vec::new();

    for (candidate_id, outcome) in outcomes {
        match outcome {
            Ok(fit) => {
                scores.insert(candidate_id, fit);
            }
            Err(err) => {
                warn!("Skipping candidate {candidate_id} for {anchor_id}: {err}");
                failures.push(CandidateFailure {
                    candidate_id,
                    error_type: err.error_type(),
                    message: err.to_string(),
                });
            }
        }
    }
    failures.sort_by(|a, b| a.candidate_id.cmp(&b.candidate_id));

    BatchFitResult {
        anchor_id: anchor_id.to_string(),
        ranking: rank(&scores),
        scores,
        failures,
    }
}
