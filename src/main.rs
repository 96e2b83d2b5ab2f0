use std::path::PathBuf;

use agency_reporting::buckets;
use agency_reporting::db;
use agency_reporting::import;
use agency_reporting::metrics;
use agency_reporting::models::{MonthlyAnalyticsEntry, ProjectRecord, ProjectType};
use agency_reporting::report;
use agency_reporting::seed;
use agency_reporting::store::{AnalyticsStore, JsonFileStore, RecordStore};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agency-report")]
#[command(about = "Project grouping and monthly analytics reports for the agency dashboard", long_about = None)]
struct Cli {
    /// Read and write JSON record files in this directory instead of Postgres
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the storage schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import projects from a CSV file
    ImportProjects {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import monthly analytics entries from a CSV file
    ImportAnalytics {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Remove a project by id
    DeleteProject { id: String },
    /// Remove a monthly analytics entry by id
    DeleteAnalytics { id: String },
    /// Group projects into the November to October month window
    Buckets {
        /// Reference date for the window, defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, value_parser = parse_category)]
        category: Option<ProjectType>,
    },
    /// Show summed analytics and monthly history for one project
    Totals {
        #[arg(long)]
        project: String,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_category(value: &str) -> Result<ProjectType, String> {
    ProjectType::parse(value).ok_or_else(|| {
        format!("unknown project type '{value}', expected 'website' or 'social_media'")
    })
}

/// Where records live: Postgres, or JSON files standing in for the
/// portals' local storage.
enum Backend {
    Postgres(PgPool),
    Json {
        projects: JsonFileStore<ProjectRecord>,
        analytics: JsonFileStore<MonthlyAnalyticsEntry>,
    },
}

impl Backend {
    async fn open(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(dir) = data_dir {
            debug!(dir = %dir.display(), "using JSON record files");
            return Ok(Backend::Json {
                projects: JsonFileStore::projects(&dir),
                analytics: JsonFileStore::monthly_analytics(&dir),
            });
        }

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set when --data-dir is not given")?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .context("failed to connect to Postgres")?;
        Ok(Backend::Postgres(pool))
    }

    async fn init(&self) -> anyhow::Result<()> {
        match self {
            Backend::Postgres(pool) => db::init_db(pool).await,
            Backend::Json {
                projects,
                analytics,
            } => {
                projects.init()?;
                analytics.init()?;
                Ok(())
            }
        }
    }

    async fn projects(&self) -> anyhow::Result<Vec<ProjectRecord>> {
        match self {
            Backend::Postgres(pool) => db::fetch_projects(pool).await,
            Backend::Json { projects, .. } => Ok(projects.list()?),
        }
    }

    async fn analytics(&self, project_id: Option<&str>) -> anyhow::Result<Vec<MonthlyAnalyticsEntry>> {
        match self {
            Backend::Postgres(pool) => db::fetch_monthly_analytics(pool, project_id).await,
            Backend::Json { analytics, .. } => Ok(analytics.list_for_project(project_id)?),
        }
    }

    async fn save_projects(&mut self, records: Vec<ProjectRecord>) -> anyhow::Result<usize> {
        let mut inserted = 0usize;
        for record in records {
            let is_new = match self {
                Backend::Postgres(pool) => db::upsert_project(pool, &record).await?,
                Backend::Json { projects, .. } => projects.upsert(record)?,
            };
            if is_new {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn save_analytics(&mut self, records: Vec<MonthlyAnalyticsEntry>) -> anyhow::Result<usize> {
        let mut inserted = 0usize;
        for record in records {
            let is_new = match self {
                Backend::Postgres(pool) => db::upsert_monthly_entry(pool, &record).await?,
                Backend::Json { analytics, .. } => analytics.upsert(record)?,
            };
            if is_new {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn report(&self, now: NaiveDate) -> anyhow::Result<String> {
        match self {
            Backend::Postgres(pool) => {
                let projects = db::fetch_projects(pool).await?;
                let entries = db::fetch_monthly_analytics(pool, None).await?;
                Ok(report::render(now, &projects, &entries))
            }
            Backend::Json {
                projects,
                analytics,
            } => Ok(report::report_from_stores(now, projects, analytics)?),
        }
    }

    async fn delete_project(&mut self, id: &str) -> anyhow::Result<bool> {
        match self {
            Backend::Postgres(pool) => db::delete_project(pool, id).await,
            Backend::Json { projects, .. } => Ok(projects.delete(id)?),
        }
    }

    async fn delete_analytics(&mut self, id: &str) -> anyhow::Result<bool> {
        match self {
            Backend::Postgres(pool) => db::delete_monthly_entry(pool, id).await,
            Backend::Json { analytics, .. } => Ok(analytics.delete(id)?),
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut backend = Backend::open(cli.data_dir).await?;

    match cli.command {
        Commands::InitDb => {
            backend.init().await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            backend.init().await?;
            let projects = backend.save_projects(seed::sample_projects()).await?;
            let entries = backend.save_analytics(seed::sample_analytics()).await?;
            info!(projects, entries, "seeded sample data");
            println!("Seed data inserted.");
        }
        Commands::ImportProjects { csv } => {
            let records = import::read_projects_file(&csv)?;
            let total = records.len();
            let inserted = backend.save_projects(records).await?;
            println!(
                "Imported {total} projects from {} ({inserted} new).",
                csv.display()
            );
        }
        Commands::ImportAnalytics { csv } => {
            let records = import::read_analytics_file(&csv)?;
            let total = records.len();
            let inserted = backend.save_analytics(records).await?;
            println!(
                "Imported {total} monthly entries from {} ({inserted} new).",
                csv.display()
            );
        }
        Commands::DeleteProject { id } => {
            if backend.delete_project(&id).await? {
                println!("Deleted project {id}.");
            } else {
                println!("No project with id {id}.");
            }
        }
        Commands::DeleteAnalytics { id } => {
            if backend.delete_analytics(&id).await? {
                println!("Deleted monthly entry {id}.");
            } else {
                println!("No monthly entry with id {id}.");
            }
        }
        Commands::Buckets { today, category } => {
            let now = today.unwrap_or_else(|| Local::now().date_naive());
            let projects = backend.projects().await?;
            let grouped = buckets::build_month_buckets(&projects, now);

            for (project_type, months) in grouped.iter() {
                if category.is_some_and(|wanted| wanted != project_type) {
                    continue;
                }
                println!("{} projects:", project_type.display_name());
                for bucket in months.iter() {
                    if bucket.projects.is_empty() {
                        println!("  {}: No projects this month", bucket.label);
                        continue;
                    }
                    println!("  {}:", bucket.label);
                    for project in bucket.projects.iter() {
                        println!("    - {} [{}] {}", project.name, project.id, project.status);
                    }
                }
            }
        }
        Commands::Totals { project } => {
            let entries = backend.analytics(Some(&project)).await?;
            if entries.is_empty() {
                println!("No monthly analytics recorded for {project}.");
                return Ok(());
            }

            let totals = metrics::aggregate_monthly(&entries);
            println!("Totals for {project}:");
            println!("  User engagement: {}", totals.user_engagement);
            println!("  New users: {}", totals.new_users);
            println!("  Clicks: {}", totals.clicks);
            println!("  Referrals: {}", totals.referrals);
            println!("By month:");
            for point in metrics::monthly_series(&entries).iter().rev() {
                print!(
                    "  {} engagement {} new users {} clicks {} referrals {}",
                    point.month,
                    point.totals.user_engagement,
                    point.totals.new_users,
                    point.totals.clicks,
                    point.totals.referrals
                );
                if point.entry_count > 1 {
                    println!(" ({} entries)", point.entry_count);
                } else {
                    println!();
                }
            }
        }
        Commands::Report { today, out } => {
            let now = today.unwrap_or_else(|| Local::now().date_naive());
            let body = backend.report(now).await?;
            std::fs::write(&out, body)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
