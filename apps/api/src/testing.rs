//! Test fixtures: record builders, an in-memory store and progress sinks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::analysis::heatmap::{GroupBy, HeatmapRow};
use crate::analysis::levels::{held_level, required_level};
use crate::analysis::service::{AnalysisContext, FetchLimits};
use crate::loader::{HeatmapRowSource, LoadError, RequirementLoader};
use crate::models::records::{
    HoldingRecord, ProfileHoldings, RequirementKind, RequirementRecord, RoleRequirements,
    DEFAULT_GROUP_NAME,
};
use crate::progress::{ProgressEvent, ProgressSink};

fn req(kind: RequirementKind, id: &str, name: &str, level: Option<&str>) -> RequirementRecord {
    RequirementRecord {
        id: id.to_string(),
        name: name.to_string(),
        group_name: DEFAULT_GROUP_NAME.to_string(),
        required_level: required_level(level),
        kind,
    }
}

fn held(kind: RequirementKind, id: &str, name: &str, level: Option<&str>) -> HoldingRecord {
    HoldingRecord {
        id: id.to_string(),
        name: name.to_string(),
        group_name: DEFAULT_GROUP_NAME.to_string(),
        held_level: held_level(level),
        kind,
    }
}

pub fn capability_req(id: &str, name: &str, level: Option<&str>) -> RequirementRecord {
    req(RequirementKind::Capability, id, name, level)
}

pub fn skill_req(id: &str, name: &str, level: Option<&str>) -> RequirementRecord {
    req(RequirementKind::Skill, id, name, level)
}

pub fn capability_held(id: &str, name: &str, level: Option<&str>) -> HoldingRecord {
    held(RequirementKind::Capability, id, name, level)
}

pub fn skill_held(id: &str, name: &str, level: Option<&str>) -> HoldingRecord {
    held(RequirementKind::Skill, id, name, level)
}

pub fn requirements(
    capabilities: Vec<RequirementRecord>,
    skills: Vec<RequirementRecord>,
) -> RoleRequirements {
    RoleRequirements {
        role_id: "role-1".to_string(),
        capabilities,
        skills,
    }
}

pub fn holdings(capabilities: Vec<HoldingRecord>, skills: Vec<HoldingRecord>) -> ProfileHoldings {
    ProfileHoldings {
        profile_id: "profile-1".to_string(),
        capabilities,
        skills,
    }
}

/// In-memory loader and heatmap source with injectable failures and delays.
#[derive(Default)]
pub struct MemoryStore {
    roles: HashMap<String, RoleRequirements>,
    profiles: HashMap<String, ProfileHoldings>,
    heatmap_rows: Vec<HeatmapRow>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl MemoryStore {
    pub fn with_role(
        mut self,
        id: &str,
        capabilities: Vec<RequirementRecord>,
        skills: Vec<RequirementRecord>,
    ) -> Self {
        let mut role = requirements(capabilities, skills);
        role.role_id = id.to_string();
        self.roles.insert(id.to_string(), role);
        self
    }

    pub fn with_profile(
        mut self,
        id: &str,
        capabilities: Vec<HoldingRecord>,
        skills: Vec<HoldingRecord>,
    ) -> Self {
        let mut profile = holdings(capabilities, skills);
        profile.profile_id = id.to_string();
        self.profiles.insert(id.to_string(), profile);
        self
    }

    pub fn with_heatmap_rows(mut self, rows: Vec<HeatmapRow>) -> Self {
        self.heatmap_rows = rows;
        self
    }

    /// Loads of this id fail with a backend error.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Loads of this id sleep before answering.
    pub fn delayed(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    async fn gate(&self, id: &str) -> Result<(), LoadError> {
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(id) {
            return Err(LoadError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl RequirementLoader for MemoryStore {
    async fn load_role_requirements(&self, role_id: &str) -> Result<RoleRequirements, LoadError> {
        self.gate(role_id).await?;
        self.roles
            .get(role_id)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                entity: "role",
                id: role_id.to_string(),
            })
    }

    async fn load_profile_holdings(
        &self,
        profile_id: &str,
    ) -> Result<ProfileHoldings, LoadError> {
        self.gate(profile_id).await?;
        self.profiles
            .get(profile_id)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                entity: "profile",
                id: profile_id.to_string(),
            })
    }
}

#[async_trait]
impl HeatmapRowSource for MemoryStore {
    async fn load_heatmap_rows(
        &self,
        company_ids: &[String],
        _group_by: GroupBy,
    ) -> Result<Vec<HeatmapRow>, LoadError> {
        for id in company_ids {
            self.gate(id).await?;
        }
        Ok(self.heatmap_rows.clone())
    }
}

/// Forwards every event to a channel.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn report(&self, event: &ProgressEvent) -> Result<()> {
        self.tx.send(event.clone())?;
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl ProgressSink for FailingSink {
    async fn report(&self, _event: &ProgressEvent) -> Result<()> {
        anyhow::bail!("progress sink offline")
    }
}

pub fn context(store: MemoryStore, progress: Arc<dyn ProgressSink>) -> AnalysisContext {
    let store = Arc::new(store);
    AnalysisContext {
        loader: store.clone(),
        heatmap_source: store,
        progress,
        limits: FetchLimits {
            timeout: Duration::from_secs(1),
            max_concurrency: 4,
        },
    }
}
