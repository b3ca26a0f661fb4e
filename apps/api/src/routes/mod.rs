pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::analysis::operation::Operation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            Operation::GapAnalysis.route(),
            post(handlers::handle_gaps),
        )
        .route(Operation::RoleFit.route(), post(handlers::handle_role_fit))
        .route(
            Operation::ProfileFit.route(),
            post(handlers::handle_profile_fit),
        )
        .route(
            Operation::Readiness.route(),
            post(handlers::handle_readiness),
        )
        .route(Operation::Heatmap.route(), post(handlers::handle_heatmap))
        .with_state(state)
}
