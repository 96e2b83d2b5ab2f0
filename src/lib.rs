pub mod buckets;
pub mod db;
pub mod import;
pub mod metrics;
pub mod models;
pub mod report;
pub mod seed;
pub mod store;

pub use buckets::{build_month_buckets, build_month_buckets_now, CategoryBuckets, MonthBuckets};
pub use metrics::{aggregate_monthly, sort_by_month_descending};
pub use models::{AggregateTotals, MonthBucket, MonthlyAnalyticsEntry, ProjectRecord, ProjectType};
