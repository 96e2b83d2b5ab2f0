use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::models::{MonthBucket, ProjectRecord, ProjectType};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Zero-based calendar month the window opens on (November).
const WINDOW_START_MONTH: u32 = 10;

pub fn month_label(month_index: u32, year: i32) -> String {
    format!("{} {}", MONTH_NAMES[(month_index % 12) as usize], year)
}

/// The twelve `(month_index, year)` slots of the window anchored on `now`:
/// November and December of the previous calendar year, then January
/// through October of the current one. Where `now` falls inside the year
/// does not move the window.
pub fn fiscal_window(now: NaiveDate) -> [(u32, i32); 12] {
    let current_year = now.year();
    let previous_year = current_year - 1;

    std::array::from_fn(|offset| {
        let month_index = (WINDOW_START_MONTH + offset as u32) % 12;
        let year = if month_index >= WINDOW_START_MONTH {
            previous_year
        } else {
            current_year
        };
        (month_index, year)
    })
}

/// Month buckets for a single category, in window order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBuckets {
    buckets: Vec<MonthBucket>,
}

impl CategoryBuckets {
    fn for_window(window: &[(u32, i32); 12]) -> Self {
        let buckets = window
            .iter()
            .map(|&(month_index, year)| MonthBucket {
                label: month_label(month_index, year),
                month_index,
                year,
                projects: Vec::new(),
            })
            .collect();
        Self { buckets }
    }

    pub fn get(&self, label: &str) -> Option<&MonthBucket> {
        self.buckets.iter().find(|bucket| bucket.label == label)
    }

    fn get_mut(&mut self, label: &str) -> Option<&mut MonthBucket> {
        self.buckets.iter_mut().find(|bucket| bucket.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthBucket> {
        self.buckets.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|bucket| bucket.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn project_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.projects.len()).sum()
    }
}

/// Grouped view of projects: one ordered set of month buckets per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBuckets {
    website: CategoryBuckets,
    social_media: CategoryBuckets,
}

impl MonthBuckets {
    fn empty(now: NaiveDate) -> Self {
        let window = fiscal_window(now);
        Self {
            website: CategoryBuckets::for_window(&window),
            social_media: CategoryBuckets::for_window(&window),
        }
    }

    pub fn get(&self, category: ProjectType) -> &CategoryBuckets {
        match category {
            ProjectType::Website => &self.website,
            ProjectType::SocialMedia => &self.social_media,
        }
    }

    fn get_mut(&mut self, category: ProjectType) -> &mut CategoryBuckets {
        match category {
            ProjectType::Website => &mut self.website,
            ProjectType::SocialMedia => &mut self.social_media,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProjectType, &CategoryBuckets)> {
        ProjectType::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }
}

/// Groups `projects` into the month window anchored on `now`.
///
/// A project is kept when it was created in November or December of any
/// year, or in any month of a year at or after `now`'s year. The bucket is
/// then looked up by the project's own month and year, so kept projects
/// that fall outside the window are dropped at lookup. Projects with an
/// unknown category or an unreadable creation date are dropped too.
pub fn build_month_buckets(projects: &[ProjectRecord], now: NaiveDate) -> MonthBuckets {
    let current_year = now.year();
    let mut grouped = MonthBuckets::empty(now);

    for project in projects {
        let Some(created) = project.created_date() else {
            debug!(project = %project.id, created_at = %project.created_at, "unreadable creation date");
            continue;
        };

        let project_month = created.month0();
        let project_year = created.year();
        if project_month < WINDOW_START_MONTH && project_year < current_year {
            continue;
        }

        let Some(category) = project.category() else {
            debug!(project = %project.id, project_type = %project.project_type, "unknown project type");
            continue;
        };

        // keyed by the project's own year, not the slot's
        let label = month_label(project_month, project_year);

        match grouped.get_mut(category).get_mut(&label) {
            Some(bucket) => bucket.projects.push(project.clone()),
            None => debug!(project = %project.id, %label, "no bucket for project month"),
        }
    }

    grouped
}

/// Same as [`build_month_buckets`] with today's local date as `now`.
pub fn build_month_buckets_now(projects: &[ProjectRecord]) -> MonthBuckets {
    build_month_buckets(projects, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn project(id: &str, project_type: &str, created_at: &str) -> ProjectRecord {
        ProjectRecord {
            id: id.to_string(),
            name: format!("Project {id}"),
            status: "active".to_string(),
            stage: "planning".to_string(),
            assignees: vec!["dev-1".to_string()],
            project_type: project_type.to_string(),
            created_at: created_at.to_string(),
        }
    }

    fn ids(bucket: &MonthBucket) -> Vec<&str> {
        bucket.projects.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn window_runs_november_to_october() {
        let window = fiscal_window(date(2025, 3, 15));
        assert_eq!(window[0], (10, 2024));
        assert_eq!(window[1], (11, 2024));
        assert_eq!(window[2], (0, 2025));
        assert_eq!(window[11], (9, 2025));
    }

    #[test]
    fn window_is_anchored_to_calendar_year() {
        assert_eq!(fiscal_window(date(2025, 1, 1)), fiscal_window(date(2025, 12, 31)));
    }

    #[test]
    fn every_category_gets_twelve_unique_buckets() {
        for now in [date(2025, 3, 15), date(2024, 12, 31), date(2000, 1, 1)] {
            let grouped = build_month_buckets(&[], now);
            for (_, buckets) in grouped.iter() {
                assert_eq!(buckets.len(), 12);
                let mut labels = buckets.labels();
                labels.sort();
                labels.dedup();
                assert_eq!(labels.len(), 12);
                assert!(buckets.iter().all(|bucket| bucket.projects.is_empty()));
            }
        }
    }

    #[test]
    fn labels_cover_previous_november_through_october() {
        let grouped = build_month_buckets(&[], date(2025, 3, 15));
        let labels = grouped.get(ProjectType::Website).labels();
        assert_eq!(
            labels,
            vec![
                "November 2024",
                "December 2024",
                "January 2025",
                "February 2025",
                "March 2025",
                "April 2025",
                "May 2025",
                "June 2025",
                "July 2025",
                "August 2025",
                "September 2025",
                "October 2025",
            ]
        );
    }

    #[test]
    fn projects_land_in_their_creation_month() {
        let projects = vec![
            project("w-1", "website", "2024-11-05T09:00:00Z"),
            project("s-1", "social_media", "2025-02-10T14:00:00Z"),
        ];
        let grouped = build_month_buckets(&projects, date(2025, 3, 15));

        let website = grouped.get(ProjectType::Website);
        assert_eq!(ids(website.get("November 2024").unwrap()), vec!["w-1"]);
        assert_eq!(website.project_count(), 1);

        let social = grouped.get(ProjectType::SocialMedia);
        assert_eq!(ids(social.get("February 2025").unwrap()), vec!["s-1"]);
        assert_eq!(social.project_count(), 1);
    }

    #[test]
    fn categories_never_mix() {
        let projects = vec![
            project("w-1", "website", "2025-01-03"),
            project("s-1", "social_media", "2025-01-04"),
        ];
        let grouped = build_month_buckets(&projects, date(2025, 6, 1));
        let website = grouped.get(ProjectType::Website).get("January 2025").unwrap();
        let social = grouped.get(ProjectType::SocialMedia).get("January 2025").unwrap();
        assert_eq!(ids(website), vec!["w-1"]);
        assert_eq!(ids(social), vec!["s-1"]);
    }

    #[test]
    fn bucket_keeps_input_order() {
        let projects = vec![
            project("b", "website", "2025-04-20"),
            project("a", "website", "2025-04-02"),
            project("c", "website", "2025-04-11"),
        ];
        let grouped = build_month_buckets(&projects, date(2025, 5, 1));
        let april = grouped.get(ProjectType::Website).get("April 2025").unwrap();
        assert_eq!(ids(april), vec!["b", "a", "c"]);
    }

    #[test]
    fn october_of_previous_year_is_excluded() {
        let projects = vec![project("old", "website", "2024-10-15")];
        let grouped = build_month_buckets(&projects, date(2025, 3, 15));
        assert_eq!(grouped.get(ProjectType::Website).project_count(), 0);
    }

    #[test]
    fn projects_outside_window_are_dropped() {
        let projects = vec![
            // passes the month filter but has no bucket
            project("nov-2023", "website", "2023-11-20"),
            // passes the year filter but has no bucket
            project("jan-2026", "website", "2026-01-08"),
            // current year, after the window closes
            project("nov-2025", "website", "2025-11-02"),
        ];
        let grouped = build_month_buckets(&projects, date(2025, 3, 15));
        assert_eq!(grouped.get(ProjectType::Website).project_count(), 0);
    }

    #[test]
    fn unknown_categories_and_bad_dates_are_dropped() {
        let projects = vec![
            project("seo", "seo", "2025-02-01"),
            project("bad-date", "website", "sometime in spring"),
            project("ok", "website", "2025-02-01"),
        ];
        let grouped = build_month_buckets(&projects, date(2025, 3, 15));
        let website = grouped.get(ProjectType::Website);
        assert_eq!(website.project_count(), 1);
        assert_eq!(ids(website.get("February 2025").unwrap()), vec!["ok"]);
        assert_eq!(grouped.get(ProjectType::SocialMedia).project_count(), 0);
    }

    #[test]
    fn wall_clock_variant_builds_full_window() {
        let grouped = build_month_buckets_now(&[]);
        let today = Local::now().date_naive();
        let labels = grouped.get(ProjectType::SocialMedia).labels();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[11], format!("October {}", today.year()));
    }

    #[test]
    fn grouping_is_deterministic() {
        let projects = vec![
            project("w-1", "website", "2024-12-01"),
            project("s-1", "social_media", "2025-07-30"),
            project("w-2", "website", "2025-10-31"),
        ];
        let now = date(2025, 8, 1);
        assert_eq!(build_month_buckets(&projects, now), build_month_buckets(&projects, now));
    }
}
