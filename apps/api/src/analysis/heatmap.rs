//! Heatmap Aggregator: capability coverage cross-tabulated by an
//! organizational dimension.
//!
//! Rows arrive pre-aggregated from the row source. Groups are laid out
//! alphabetically; capability columns in first-seen order while walking the
//! groups in that order. The CSV shape is read by the narration layer and
//! must stay stable.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analysis::round1;

const GROUP_TOP_N: usize = 5;
const GLOBAL_TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Taxonomy,
    Division,
    Region,
    Company,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Taxonomy => "taxonomy",
            GroupBy::Division => "division",
            GroupBy::Region => "region",
            GroupBy::Company => "company",
        }
    }

    /// SQL expression for the group column (`r` = roles, `co` = companies).
    pub fn column(&self) -> &'static str {
        match self {
            GroupBy::Taxonomy => "r.taxonomy",
            GroupBy::Division => "r.division",
            GroupBy::Region => "r.region",
            GroupBy::Company => "co.name",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub group: String,
    pub capability: String,
    pub role_count: u64,
    pub total_roles_in_group: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub group: String,
    pub capability: String,
    pub role_count: u64,
    pub total_roles_in_group: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapMatrixRow {
    pub group: String,
    pub total_roles: u64,
    /// One cell per column, in column order. Absent combinations are 0.
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityCount {
    pub capability: String,
    pub role_count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityTotal {
    pub capability: String,
    pub total: u64,
    pub average_per_group: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub total_roles: u64,
    pub top_capabilities: Vec<CapabilityCount>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatrixDimensions {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapSummary {
    pub total_roles: u64,
    pub total_capabilities: usize,
    pub total_groups: usize,
    pub matrix_dimensions: MatrixDimensions,
    pub groups: Vec<GroupSummary>,
    pub top_capabilities: Vec<CapabilityTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapReport {
    pub group_by: GroupBy,
    pub csv_rendering: String,
    pub summary: HeatmapSummary,
    pub matrix: Vec<HeatmapMatrixRow>,
}

/// `count / total × 100`, one decimal. A group with no roles is 0.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

#[derive(Default)]
struct GroupAcc {
    total_roles: u64,
    // input order, duplicates merged
    counts: Vec<(String, u64)>,
}

impl GroupAcc {
    fn add(&mut self, row: &HeatmapRow) {
        self.total_roles = self.total_roles.max(row.total_roles_in_group);
        match self.counts.iter_mut().find(|(c, _)| *c == row.capability) {
            Some((_, count)) => *count += row.role_count,
            None => self.counts.push((row.capability.clone(), row.role_count)),
        }
    }

    fn count_of(&self, capability: &str) -> u64 {
        self.counts
            .iter()
            .find(|(c, _)| c == capability)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

pub fn build_heatmap(rows: &[HeatmapRow], group_by: GroupBy) -> HeatmapReport {
    let mut groups: BTreeMap<&str, GroupAcc> = BTreeMap::new();
    for row in rows {
        groups.entry(row.group.as_str()).or_default().add(row);
    }

    let mut columns: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for acc in groups.values() {
        for (capability, _) in &acc.counts {
            if seen.insert(capability.as_str()) {
                columns.push(capability.as_str());
            }
        }
    }

    let matrix: Vec<HeatmapMatrixRow> = groups
        .iter()
        .map(|(group, acc)| HeatmapMatrixRow {
            group: group.to_string(),
            total_roles: acc.total_roles,
            cells: columns
                .iter()
                .map(|capability| {
                    let role_count = acc.count_of(capability);
                    HeatmapCell {
                        group: group.to_string(),
                        capability: capability.to_string(),
                        role_count,
                        total_roles_in_group: acc.total_roles,
                        percentage: percentage(role_count, acc.total_roles),
                    }
                })
                .collect(),
        })
        .collect();

    let group_summaries: Vec<GroupSummary> = groups
        .iter()
        .map(|(group, acc)| GroupSummary {
            name: group.to_string(),
            total_roles: acc.total_roles,
            top_capabilities: top_for_group(acc),
        })
        .collect();

    let top_capabilities = global_top(&matrix, &columns);
    let summary = HeatmapSummary {
        total_roles: groups.values().map(|acc| acc.total_roles).sum(),
        total_capabilities: columns.len(),
        total_groups: groups.len(),
        matrix_dimensions: MatrixDimensions {
            rows: groups.len(),
            columns: columns.len(),
        },
        groups: group_summaries,
        top_capabilities,
    };

    HeatmapReport {
        group_by,
        csv_rendering: render_csv(&matrix, &columns, &summary),
        summary,
        matrix,
    }
}

fn top_for_group(acc: &GroupAcc) -> Vec<CapabilityCount> {
    let mut counts: Vec<&(String, u64)> = acc.counts.iter().filter(|(_, n)| *n > 0).collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
        .into_iter()
        .take(GROUP_TOP_N)
        .map(|(capability, role_count)| CapabilityCount {
            capability: capability.clone(),
            role_count: *role_count,
            percentage: percentage(*role_count, acc.total_roles),
        })
        .collect()
}

fn global_top(matrix: &[HeatmapMatrixRow], columns: &[&str]) -> Vec<CapabilityTotal> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for row in matrix {
        for cell in &row.cells {
            *totals.entry(cell.capability.as_str()).or_default() += cell.role_count;
        }
    }

    let mut ranked: Vec<(&str, u64)> = columns
        .iter()
        .map(|c| (*c, totals.get(c).copied().unwrap_or(0)))
        .filter(|(_, total)| *total > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let group_count = matrix.len().max(1) as f64;
    ranked
        .into_iter()
        .take(GLOBAL_TOP_N)
        .map(|(capability, total)| CapabilityTotal {
            capability: capability.to_string(),
            total,
            average_per_group: round1(total as f64 / group_count),
        })
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Header `group,total,<capabilities…>`, one row per group, then a summary
/// section separated by a blank line.
fn render_csv(matrix: &[HeatmapMatrixRow], columns: &[&str], summary: &HeatmapSummary) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(matrix.len() + 8);

    let mut header = vec!["group".to_string(), "total".to_string()];
    header.extend(columns.iter().map(|c| csv_field(c)));
    lines.push(header.join(","));

    for row in matrix {
        let mut fields = vec![csv_field(&row.group), row.total_roles.to_string()];
        fields.extend(row.cells.iter().map(|cell| cell.role_count.to_string()));
        lines.push(fields.join(","));
    }

    lines.push(String::new());
    lines.push("summary".to_string());
    lines.push(format!("total_roles,{}", summary.total_roles));
    lines.push(format!("total_groups,{}", summary.total_groups));
    lines.push(format!("total_capabilities,{}", summary.total_capabilities));
    lines.push("capability,total,average_per_group".to_string());
    for top in &summary.top_capabilities {
        lines.push(format!(
            "{},{},{:.1}",
            csv_field(&top.capability),
            top.total,
            top.average_per_group
        ));
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}
