use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{MonthlyAnalyticsEntry, ProjectRecord};

#[derive(Debug, Deserialize)]
struct ProjectRow {
    id: Option<String>,
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    stage: String,
    /// Semicolon separated user ids.
    #[serde(default)]
    assignees: String,
    project_type: String,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct AnalyticsRow {
    id: Option<String>,
    project_id: String,
    month: String,
    user_engagement: u64,
    new_users: u64,
    clicks: u64,
    referrals: u64,
    notes: Option<String>,
    #[serde(default)]
    recorded_by: String,
}

fn id_or_new(id: Option<String>, prefix: &str) -> String {
    id.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| format!("{prefix}-{}", Uuid::new_v4()))
}

pub fn read_projects<R: Read>(reader: R) -> anyhow::Result<Vec<ProjectRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut projects = Vec::new();

    for (line, result) in reader.deserialize::<ProjectRow>().enumerate() {
        let row = result.with_context(|| format!("invalid project row {}", line + 1))?;
        projects.push(ProjectRecord {
            id: id_or_new(row.id, "proj"),
            name: row.name,
            status: row.status,
            stage: row.stage,
            assignees: row
                .assignees
                .split(';')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
            project_type: row.project_type,
            created_at: row.created_at,
        });
    }

    Ok(projects)
}

pub fn read_analytics<R: Read>(reader: R) -> anyhow::Result<Vec<MonthlyAnalyticsEntry>> {
    let mut reader = csv::Reader::from_reader(reader);
    let imported_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut entries = Vec::new();

    for (line, result) in reader.deserialize::<AnalyticsRow>().enumerate() {
        let row = result.with_context(|| format!("invalid analytics row {}", line + 1))?;
        entries.push(MonthlyAnalyticsEntry {
            id: id_or_new(row.id, "ma"),
            project_id: row.project_id,
            month: row.month,
            user_engagement: row.user_engagement,
            new_users: row.new_users,
            clicks: row.clicks,
            referrals: row.referrals,
            notes: row.notes.filter(|n| !n.trim().is_empty()),
            created_at: imported_at.clone(),
            updated_at: imported_at.clone(),
            recorded_by: row.recorded_by,
        });
    }

    Ok(entries)
}

pub fn read_projects_file(path: &Path) -> anyhow::Result<Vec<ProjectRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_projects(file)
}

pub fn read_analytics_file(path: &Path) -> anyhow::Result<Vec<MonthlyAnalyticsEntry>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_analytics(file)
}
