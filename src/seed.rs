use crate::models::{MonthlyAnalyticsEntry, ProjectRecord};

fn project(
    id: &str,
    name: &str,
    status: &str,
    stage: &str,
    assignees: &[&str],
    project_type: &str,
    created_at: &str,
) -> ProjectRecord {
    ProjectRecord {
        id: id.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        stage: stage.to_string(),
        assignees: assignees.iter().map(|a| a.to_string()).collect(),
        project_type: project_type.to_string(),
        created_at: created_at.to_string(),
    }
}

fn entry(
    id: &str,
    project_id: &str,
    month: &str,
    counts: [u64; 4],
    notes: Option<&str>,
) -> MonthlyAnalyticsEntry {
    let recorded = format!("{month}-28T17:00:00Z");
    MonthlyAnalyticsEntry {
        id: id.to_string(),
        project_id: project_id.to_string(),
        month: month.to_string(),
        user_engagement: counts[0],
        new_users: counts[1],
        clicks: counts[2],
        referrals: counts[3],
        notes: notes.map(str::to_string),
        created_at: recorded.clone(),
        updated_at: recorded,
        recorded_by: "admin-rhea".to_string(),
    }
}

pub fn sample_projects() -> Vec<ProjectRecord> {
    vec![
        project(
            "proj-harbor-web",
            "Harbor Coffee storefront",
            "in_progress",
            "development",
            &["dev-omar", "coord-lina"],
            "website",
            "2025-11-04T09:15:00Z",
        ),
        project(
            "proj-fern-social",
            "Fern & Co. spring campaign",
            "active",
            "content",
            &["coord-lina"],
            "social_media",
            "2026-02-12T13:40:00Z",
        ),
        project(
            "proj-atlas-web",
            "Atlas Dental booking site",
            "review",
            "qa",
            &["dev-omar", "dev-sana"],
            "website",
            "2026-02-27T08:05:00Z",
        ),
        project(
            "proj-kite-social",
            "Kite Cycles launch",
            "planning",
            "strategy",
            &["coord-jules"],
            "social_media",
            "2026-07-01T10:00:00Z",
        ),
        project(
            "proj-legacy-web",
            "Legacy microsite",
            "completed",
            "handover",
            &["dev-sana"],
            "website",
            "2025-06-18T16:20:00Z",
        ),
    ]
}

pub fn sample_analytics() -> Vec<MonthlyAnalyticsEntry> {
    vec![
        entry("ma-001", "proj-harbor-web", "2026-01", [1240, 310, 842, 37], None),
        entry(
            "ma-002",
            "proj-harbor-web",
            "2026-02",
            [1515, 402, 1020, 51],
            Some("Valentine's promo landed"),
        ),
        entry("ma-003", "proj-harbor-web", "2026-03", [1388, 290, 955, 44], None),
        entry("ma-004", "proj-fern-social", "2026-03", [4020, 880, 2310, 120], None),
        entry(
            "ma-005",
            "proj-fern-social",
            "2026-04",
            [5230, 1104, 2987, 164],
            Some("Reel went semi-viral"),
        ),
        entry("ma-006", "proj-atlas-web", "2026-04", [640, 150, 410, 12], None),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn sample_ids_are_unique() {
        let projects: HashSet<String> = sample_projects().into_iter().map(|p| p.id).collect();
        assert_eq!(projects.len(), sample_projects().len());
        let entries: HashSet<String> = sample_analytics().into_iter().map(|e| e.id).collect();
        assert_eq!(entries.len(), sample_analytics().len());
    }

    #[test]
    fn sample_analytics_reference_sample_projects() {
        let projects: HashSet<String> = sample_projects().into_iter().map(|p| p.id).collect();
        assert!(sample_analytics()
            .iter()
            .all(|entry| projects.contains(&entry.project_id)));
    }

    #[test]
    fn sample_records_are_well_formed() {
        assert!(sample_projects()
            .iter()
            .all(|p| p.category().is_some() && p.created_date().is_some()));
        assert!(sample_analytics().iter().all(|e| e.parsed_month().is_some()));
    }
}
