//! Progress sink: fire-and-forget markdown updates for the chat/log surface.
//!
//! Sink failures are logged and dropped; they never reach the scoring caller.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::operation::Operation;

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub operation: Operation,
    /// What the update is about, e.g. `profile p-1 / role r-2`.
    pub subject: String,
    /// Markdown narrative.
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(operation: Operation, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation,
            subject: subject.into(),
            message: message.into(),
            emitted_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, event: &ProgressEvent) -> Result<()>;
}

/// Appends progress events to the `analysis_progress` table.
pub struct PgProgressSink {
    pool: PgPool,
}

impl PgProgressSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressSink for PgProgressSink {
    async fn report(&self, event: &ProgressEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analysis_progress (id, operation, subject, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.operation.name())
        .bind(&event.subject)
        .bind(&event.message)
        .bind(event.emitted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Hands the event to the sink on a background task and returns immediately.
pub fn emit_progress(sink: Arc<dyn ProgressSink>, event: ProgressEvent) {
    tokio::spawn(async move {
        match sink.report(&event).await {
            Ok(()) => debug!("Progress reported for {} ({})", event.operation, event.subject),
            Err(e) => warn!(
                "Progress sink failed for {} ({}): {e:#}",
                event.operation, event.subject
            ),
        }
    });
}
