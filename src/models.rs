use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Project categories the dashboard groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Website,
    SocialMedia,
}

impl ProjectType {
    pub const ALL: [ProjectType; 2] = [ProjectType::Website, ProjectType::SocialMedia];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Website => "website",
            ProjectType::SocialMedia => "social_media",
        }
    }

    pub fn parse(value: &str) -> Option<ProjectType> {
        match value {
            "website" => Some(ProjectType::Website),
            "social_media" => Some(ProjectType::SocialMedia),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProjectType::Website => "Website",
            ProjectType::SocialMedia => "Social Media",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project as it comes out of the project store.
///
/// `project_type` and `created_at` stay as the stored strings so that
/// records with unknown categories or unparseable dates still round-trip
/// through persistence; they are only interpreted when grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub created_at: String,
}

impl ProjectRecord {
    pub fn category(&self) -> Option<ProjectType> {
        ProjectType::parse(&self.project_type)
    }

    /// Calendar date the project was created, or `None` when `created_at`
    /// cannot be read as a date.
    pub fn created_date(&self) -> Option<NaiveDate> {
        parse_date(&self.created_at)
    }
}

/// Accepts RFC 3339 timestamps (date taken in the timestamp's own offset),
/// naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamps (`T` or space separated)
/// and bare `YYYY-MM-DD` dates.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(stamp.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// One admin-entered set of engagement metrics for a project and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAnalyticsEntry {
    pub id: String,
    pub project_id: String,
    /// `YYYY-MM`
    pub month: String,
    #[serde(default)]
    pub user_engagement: u64,
    #[serde(default)]
    pub new_users: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub referrals: u64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub recorded_by: String,
}

impl MonthlyAnalyticsEntry {
    /// First day of the entry's month, if `month` is a well-formed `YYYY-MM`.
    pub fn parsed_month(&self) -> Option<NaiveDate> {
        parse_month_key(&self.month)
    }
}

pub fn parse_month_key(key: &str) -> Option<NaiveDate> {
    let (year, month) = key.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateTotals {
    pub user_engagement: u64,
    pub new_users: u64,
    pub clicks: u64,
    pub referrals: u64,
}

/// Metrics for one calendar month, summed over every entry for that month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub month: String,
    pub entry_count: usize,
    pub totals: AggregateTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    pub label: String,
    /// Calendar month, 0 = January.
    pub month_index: u32,
    pub year: i32,
    pub projects: Vec<ProjectRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(project_type: &str, created_at: &str) -> ProjectRecord {
        ProjectRecord {
            id: "p-1".to_string(),
            name: "Spring launch".to_string(),
            status: "active".to_string(),
            stage: "design".to_string(),
            assignees: vec![],
            project_type: project_type.to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn project_type_parses_known_names_only() {
        assert_eq!(ProjectType::parse("website"), Some(ProjectType::Website));
        assert_eq!(ProjectType::parse("social_media"), Some(ProjectType::SocialMedia));
        assert_eq!(ProjectType::parse("seo"), None);
        assert_eq!(ProjectType::parse("Website"), None);
    }

    #[test]
    fn created_date_accepts_common_timestamp_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 11, 5);
        assert_eq!(project("website", "2024-11-05T10:30:00Z").created_date(), expected);
        assert_eq!(project("website", "2024-11-05T10:30:00.123+02:00").created_date(), expected);
        assert_eq!(project("website", "2024-11-05T10:30:00").created_date(), expected);
        assert_eq!(project("website", "2024-11-05").created_date(), expected);
    }

    #[test]
    fn created_date_accepts_space_separated_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 11, 5);
        assert_eq!(project("website", "2024-11-05 10:30:00").created_date(), expected);
        assert_eq!(project("website", "2024-11-05 10:30:00.250").created_date(), expected);
    }

    #[test]
    fn project_fields_default_when_missing() {
        let record: ProjectRecord = serde_json::from_str(r#"{"id": "draft"}"#).unwrap();
        assert_eq!(record.name, "");
        assert_eq!(record.category(), None);
        assert_eq!(record.created_date(), None);
    }

    #[test]
    fn created_date_keeps_the_offset_calendar_day() {
        let record = project("website", "2024-11-30T23:30:00-05:00");
        assert_eq!(record.created_date(), NaiveDate::from_ymd_opt(2024, 11, 30));
    }

    #[test]
    fn malformed_created_at_is_none() {
        assert_eq!(project("website", "not a date").created_date(), None);
        assert_eq!(project("website", "").created_date(), None);
        assert_eq!(project("website", "2024-13-01").created_date(), None);
    }

    #[test]
    fn month_keys_require_fixed_width() {
        assert_eq!(parse_month_key("2024-03"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_month_key("2024-3"), None);
        assert_eq!(parse_month_key("2024-13"), None);
        assert_eq!(parse_month_key("March"), None);
    }

    #[test]
    fn records_use_camel_case_json() {
        let json = r#"{
            "id": "a-1",
            "projectId": "p-1",
            "month": "2024-05",
            "userEngagement": 12,
            "newUsers": 3,
            "clicks": 40,
            "referrals": 2,
            "notes": null,
            "createdAt": "2024-06-01T00:00:00Z",
            "updatedAt": "2024-06-01T00:00:00Z",
            "recordedBy": "u-admin"
        }"#;
        let entry: MonthlyAnalyticsEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.project_id, "p-1");
        assert_eq!(entry.user_engagement, 12);
        assert_eq!(entry.parsed_month(), NaiveDate::from_ymd_opt(2024, 5, 1));
    }
}
