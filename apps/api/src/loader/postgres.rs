use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::analysis::heatmap::{GroupBy, HeatmapRow};
use crate::loader::{HeatmapRowSource, LoadError, RequirementLoader};
use crate::models::records::{
    group_or_default, ProfileHoldings, RequirementKind, RoleRequirements,
};
use crate::models::rows::{HeatmapDbRow, LeveledItemRow};

const ROLE_CAPABILITIES_SQL: &str = r#"
    SELECT c.id::text AS id, c.name, c.group_name, rc.capability_level AS level
    FROM role_capabilities rc
    JOIN capabilities c ON c.id = rc.capability_id
    WHERE rc.role_id::text = $1
    ORDER BY c.name
"#;

// Role skills carry no level column.
const ROLE_SKILLS_SQL: &str = r#"
    SELECT s.id::text AS id, s.name, s.group_name, NULL::text AS level
    FROM role_skills rs
    JOIN skills s ON s.id = rs.skill_id
    WHERE rs.role_id::text = $1
    ORDER BY s.name
"#;

const PROFILE_CAPABILITIES_SQL: &str = r#"
    SELECT c.id::text AS id, c.name, c.group_name, pc.capability_level AS level
    FROM profile_capabilities pc
    JOIN capabilities c ON c.id = pc.capability_id
    WHERE pc.profile_id::text = $1
    ORDER BY c.name
"#;

const PROFILE_SKILLS_SQL: &str = r#"
    SELECT s.id::text AS id, s.name, s.group_name, ps.skill_level AS level
    FROM profile_skills ps
    JOIN skills s ON s.id = ps.skill_id
    WHERE ps.profile_id::text = $1
    ORDER BY s.name
"#;

/// Postgres-backed requirement loader and heatmap row source.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, table: &'static str, id: &str) -> Result<bool, LoadError> {
        // `table` is always one of the literals below, never caller input.
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id::text = $1)");
        Ok(sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn items(&self, sql: &'static str, owner_id: &str) -> Result<Vec<LeveledItemRow>, LoadError> {
        Ok(sqlx::query_as::<_, LeveledItemRow>(sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl RequirementLoader for PgStore {
    async fn load_role_requirements(&self, role_id: &str) -> Result<RoleRequirements, LoadError> {
        if !self.exists("roles", role_id).await? {
            return Err(LoadError::NotFound {
                entity: "role",
                id: role_id.to_string(),
            });
        }

        let capabilities = self.items(ROLE_CAPABILITIES_SQL, role_id).await?;
        let skills = self.items(ROLE_SKILLS_SQL, role_id).await?;
        debug!(
            "Loaded role {role_id}: {} capabilities, {} skills",
            capabilities.len(),
            skills.len()
        );

        Ok(RoleRequirements {
            role_id: role_id.to_string(),
            capabilities: capabilities
                .into_iter()
                .map(|r| r.into_requirement(RequirementKind::Capability))
                .collect(),
            skills: skills
                .into_iter()
                .map(|r| r.into_requirement(RequirementKind::Skill))
                .collect(),
        })
    }

    async fn load_profile_holdings(
        &self,
        profile_id: &str,
    ) -> Result<ProfileHoldings, LoadError> {
        if !self.exists("profiles", profile_id).await? {
            return Err(LoadError::NotFound {
                entity: "profile",
                id: profile_id.to_string(),
            });
        }

        let capabilities = self.items(PROFILE_CAPABILITIES_SQL, profile_id).await?;
        let skills = self.items(PROFILE_SKILLS_SQL, profile_id).await?;
        debug!(
            "Loaded profile {profile_id}: {} capabilities, {} skills",
            capabilities.len(),
            skills.len()
        );

        Ok(ProfileHoldings {
            profile_id: profile_id.to_string(),
            capabilities: capabilities
                .into_iter()
                .map(|r| r.into_holding(RequirementKind::Capability))
                .collect(),
            skills: skills
                .into_iter()
                .map(|r| r.into_holding(RequirementKind::Skill))
                .collect(),
        })
    }
}

#[async_trait]
impl HeatmapRowSource for PgStore {
    async fn load_heatmap_rows(
        &self,
        company_ids: &[String],
        group_by: GroupBy,
    ) -> Result<Vec<HeatmapRow>, LoadError> {
        let sql = heatmap_sql(group_by);
        let rows = sqlx::query_as::<_, HeatmapDbRow>(&sql)
            .bind(company_ids)
            .fetch_all(&self.pool)
            .await?;
        debug!(
            "Loaded {} heatmap rows grouped by {}",
            rows.len(),
            group_by.as_str()
        );

        Ok(rows
            .into_iter()
            .map(|r| HeatmapRow {
                group: group_or_default(r.group_name),
                capability: r.capability,
                role_count: u64::try_from(r.role_count).unwrap_or(0),
                total_roles_in_group: u64::try_from(r.total_roles_in_group).unwrap_or(0),
            })
            .collect())
    }
}

/// Builds the heatmap query for a grouping. The group expression comes from
/// [`GroupBy::column`], a compile-time constant.
fn heatmap_sql(group_by: GroupBy) -> String {
    format!(
        r#"
        WITH scoped AS (
            SELECT r.id, {group} AS group_name
            FROM roles r
            JOIN companies co ON co.id = r.company_id
            WHERE r.company_id::text = ANY($1)
        ),
        totals AS (
            SELECT group_name, COUNT(*) AS total
            FROM scoped
            GROUP BY group_name
        )
        SELECT s.group_name,
               c.name AS capability,
               COUNT(DISTINCT s.id) AS role_count,
               t.total AS total_roles_in_group
        FROM scoped s
        JOIN role_capabilities rc ON rc.role_id = s.id
        JOIN capabilities c ON c.id = rc.capability_id
        JOIN totals t ON t.group_name IS NOT DISTINCT FROM s.group_name
        GROUP BY s.group_name, c.name, t.total
        ORDER BY s.group_name, role_count DESC, c.name
        "#,
        group = group_by.column()
    )
}
