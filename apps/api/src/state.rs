use crate::analysis::service::AnalysisContext;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analysis: AnalysisContext,
    /// Narration client; `None` when no API key is configured.
    pub llm: Option<LlmClient>,
}
