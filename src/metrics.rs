use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{AggregateTotals, MonthlyAnalyticsEntry, MonthlyPoint};

impl AggregateTotals {
    pub fn add_entry(&mut self, entry: &MonthlyAnalyticsEntry) {
        self.user_engagement = self.user_engagement.saturating_add(entry.user_engagement);
        self.new_users = self.new_users.saturating_add(entry.new_users);
        self.clicks = self.clicks.saturating_add(entry.clicks);
        self.referrals = self.referrals.saturating_add(entry.referrals);
    }
}

/// Sums the four counters over every entry passed in. Callers narrow the
/// list to one project first.
pub fn aggregate_monthly(entries: &[MonthlyAnalyticsEntry]) -> AggregateTotals {
    let mut totals = AggregateTotals::default();
    for entry in entries {
        totals.add_entry(entry);
    }
    totals
}

/// Newest month first. `YYYY-MM` keys order correctly as strings; entries
/// sharing a key keep their relative order.
pub fn sort_by_month_descending(
    mut entries: Vec<MonthlyAnalyticsEntry>,
) -> Vec<MonthlyAnalyticsEntry> {
    entries.sort_by(|a, b| b.month.cmp(&a.month));
    entries
}

pub fn filter_by_project(
    entries: &[MonthlyAnalyticsEntry],
    project_id: &str,
) -> Vec<MonthlyAnalyticsEntry> {
    entries
        .iter()
        .filter(|entry| entry.project_id == project_id)
        .cloned()
        .collect()
}

/// Per-month totals in chronological order. Entries sharing a month are
/// summed; entries whose month key is not `YYYY-MM` are left out.
pub fn monthly_series(entries: &[MonthlyAnalyticsEntry]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<String, MonthlyPoint> = BTreeMap::new();

    for entry in entries {
        if entry.parsed_month().is_none() {
            debug!(entry = %entry.id, month = %entry.month, "skipping malformed month key");
            continue;
        }

        let point = months
            .entry(entry.month.clone())
            .or_insert_with(|| MonthlyPoint {
                month: entry.month.clone(),
                entry_count: 0,
                totals: AggregateTotals::default(),
            });
        point.entry_count += 1;
        point.totals.add_entry(entry);
    }

    months.into_values().collect()
}
