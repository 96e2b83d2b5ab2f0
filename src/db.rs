use anyhow::Context;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::{MonthlyAnalyticsEntry, ProjectRecord};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn counter(value: u64) -> anyhow::Result<i64> {
    i64::try_from(value).context("counter does not fit in BIGINT")
}

fn stored_counter(column: &str, value: i64) -> anyhow::Result<u64> {
    u64::try_from(value).with_context(|| format!("negative {column} value {value}"))
}

fn read_counter(row: &PgRow, column: &str) -> anyhow::Result<u64> {
    let value: i64 = row.try_get(column)?;
    stored_counter(column, value)
}

pub async fn fetch_projects(pool: &PgPool) -> anyhow::Result<Vec<ProjectRecord>> {
    let rows = sqlx::query(
        "SELECT id, name, status, stage, assignees, project_type, created_at \
         FROM agency_reporting.projects \
         ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await
    .context("failed to load projects")?;

    let mut projects = Vec::with_capacity(rows.len());
    for row in rows {
        projects.push(ProjectRecord {
            id: row.get("id"),
            name: row.get("name"),
            status: row.get("status"),
            stage: row.get("stage"),
            assignees: row.get("assignees"),
            project_type: row.get("project_type"),
            created_at: row.get("created_at"),
        });
    }

    Ok(projects)
}

pub async fn fetch_monthly_analytics(
    pool: &PgPool,
    project_id: Option<&str>,
) -> anyhow::Result<Vec<MonthlyAnalyticsEntry>> {
    let mut query = String::from(
        "SELECT id, project_id, month, user_engagement, new_users, clicks, referrals, \
         notes, created_at, updated_at, recorded_by \
         FROM agency_reporting.monthly_analytics",
    );

    if project_id.is_some() {
        query.push_str(" WHERE project_id = $1");
    }
    query.push_str(" ORDER BY created_at, id");

    let mut rows = sqlx::query(&query);
    if let Some(value) = project_id {
        rows = rows.bind(value);
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to load monthly analytics")?;
    let mut entries = Vec::with_capacity(records.len());

    for row in records {
        entries.push(MonthlyAnalyticsEntry {
            id: row.get("id"),
            project_id: row.get("project_id"),
            month: row.get("month"),
            user_engagement: read_counter(&row, "user_engagement")?,
            new_users: read_counter(&row, "new_users")?,
            clicks: read_counter(&row, "clicks")?,
            referrals: read_counter(&row, "referrals")?,
            notes: row.get("notes"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            recorded_by: row.get("recorded_by"),
        });
    }

    Ok(entries)
}

/// Returns `true` when the row was inserted rather than updated.
pub async fn upsert_project(pool: &PgPool, project: &ProjectRecord) -> anyhow::Result<bool> {
    let inserted: bool = sqlx::query(
        r#"
        INSERT INTO agency_reporting.projects
        (id, name, status, stage, assignees, project_type, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            status = EXCLUDED.status,
            stage = EXCLUDED.stage,
            assignees = EXCLUDED.assignees,
            project_type = EXCLUDED.project_type,
            created_at = EXCLUDED.created_at
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&project.id)
    .bind(&project.name)
    .bind(&project.status)
    .bind(&project.stage)
    .bind(&project.assignees)
    .bind(&project.project_type)
    .bind(&project.created_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to save project {}", project.id))?
    .get("inserted");

    Ok(inserted)
}

pub async fn upsert_monthly_entry(
    pool: &PgPool,
    entry: &MonthlyAnalyticsEntry,
) -> anyhow::Result<bool> {
    let inserted: bool = sqlx::query(
        r#"
        INSERT INTO agency_reporting.monthly_analytics
        (id, project_id, month, user_engagement, new_users, clicks, referrals,
         notes, created_at, updated_at, recorded_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE
        SET project_id = EXCLUDED.project_id,
            month = EXCLUDED.month,
            user_engagement = EXCLUDED.user_engagement,
            new_users = EXCLUDED.new_users,
            clicks = EXCLUDED.clicks,
            referrals = EXCLUDED.referrals,
            notes = EXCLUDED.notes,
            updated_at = EXCLUDED.updated_at,
            recorded_by = EXCLUDED.recorded_by
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.project_id)
    .bind(&entry.month)
    .bind(counter(entry.user_engagement)?)
    .bind(counter(entry.new_users)?)
    .bind(counter(entry.clicks)?)
    .bind(counter(entry.referrals)?)
    .bind(&entry.notes)
    .bind(&entry.created_at)
    .bind(&entry.updated_at)
    .bind(&entry.recorded_by)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to save monthly entry {}", entry.id))?
    .get("inserted");

    Ok(inserted)
}

pub async fn delete_project(pool: &PgPool, id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM agency_reporting.projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_monthly_entry(pool: &PgPool, id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM agency_reporting.monthly_analytics WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
