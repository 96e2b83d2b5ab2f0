use std::fmt::Write;

use chrono::NaiveDate;

use crate::buckets::{self, MonthBuckets};
use crate::metrics;
use crate::models::{AggregateTotals, MonthlyAnalyticsEntry, MonthlyPoint, ProjectRecord};
use crate::store::{AnalyticsStore, ProjectStore, StoreResult};

const RECENT_MONTHS: usize = 3;

#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub project_id: String,
    pub project_name: String,
    pub totals: AggregateTotals,
    /// One point per month, newest first.
    pub months: Vec<MonthlyPoint>,
    /// `(month, note)` pairs, newest month first.
    pub notes: Vec<(String, String)>,
}

/// One summary per project that has at least one analytics entry, in
/// project order. Entries pointing at unknown projects are ignored.
pub fn summarize_projects(
    projects: &[ProjectRecord],
    entries: &[MonthlyAnalyticsEntry],
) -> Vec<ProjectSummary> {
    projects
        .iter()
        .filter_map(|project| {
            let scoped = metrics::filter_by_project(entries, &project.id);
            if scoped.is_empty() {
                return None;
            }

            let mut months = metrics::monthly_series(&scoped);
            months.reverse();
            let totals = metrics::aggregate_monthly(&scoped);
            let notes = metrics::sort_by_month_descending(scoped)
                .into_iter()
                .filter_map(|entry| entry.notes.map(|note| (entry.month, note)))
                .collect();

            Some(ProjectSummary {
                project_id: project.id.clone(),
                project_name: project.name.clone(),
                totals,
                months,
                notes,
            })
        })
        .collect()
}

/// Groups, summarizes and renders everything currently in the two stores.
pub fn report_from_stores(
    now: NaiveDate,
    projects: &impl ProjectStore,
    analytics: &impl AnalyticsStore,
) -> StoreResult<String> {
    let projects = projects.list()?;
    let entries = analytics.list_for_project(None)?;
    Ok(render(now, &projects, &entries))
}

pub fn render(
    now: NaiveDate,
    projects: &[ProjectRecord],
    entries: &[MonthlyAnalyticsEntry],
) -> String {
    let grouped = buckets::build_month_buckets(projects, now);
    let summaries = summarize_projects(projects, entries);
    build_report(now, &grouped, &summaries)
}

pub fn write_totals(output: &mut String, totals: &AggregateTotals) {
    let _ = writeln!(
        output,
        "- engagement {} / new users {} / clicks {} / referrals {}",
        totals.user_engagement, totals.new_users, totals.clicks, totals.referrals
    );
}

pub fn build_report(now: NaiveDate, buckets: &MonthBuckets, summaries: &[ProjectSummary]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Project Activity Report");
    let _ = writeln!(output, "Generated {now}");

    for (category, months) in buckets.iter() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "## {} projects ({})",
            category.display_name(),
            months.project_count()
        );

        for bucket in months.iter() {
            let _ = writeln!(output);
            let _ = writeln!(output, "### {}", bucket.label);
            if bucket.projects.is_empty() {
                let _ = writeln!(output, "No projects this month");
                continue;
            }
            for project in bucket.projects.iter() {
                let _ = writeln!(
                    output,
                    "- {} ({}, {})",
                    project.name, project.status, project.stage
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Analytics");

    if summaries.is_empty() {
        let _ = writeln!(output, "No analytics recorded yet.");
        return output;
    }

    for summary in summaries {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {}", summary.project_name);
        write_totals(&mut output, &summary.totals);
        let shown: Vec<&MonthlyPoint> = summary.months.iter().take(RECENT_MONTHS).collect();
        for point in shown.iter() {
            let _ = write!(
                output,
                "- {}: engagement {}, new users {}, clicks {}, referrals {}",
                point.month,
                point.totals.user_engagement,
                point.totals.new_users,
                point.totals.clicks,
                point.totals.referrals
            );
            if point.entry_count > 1 {
                let _ = writeln!(output, " ({} entries)", point.entry_count);
            } else {
                let _ = writeln!(output);
            }
        }
        for (month, note) in summary.notes.iter() {
            if shown.iter().any(|point| &point.month == month) {
                let _ = writeln!(output, "  - {month}: {note}");
            }
        }
    }

    output
}
