//! Command-line front-end.
//!
//! Every flag falls back to its `KOZEN_DELTA_*` environment variable, so
//! the binary drops into CI pipelines without argument plumbing. This is
//! the only place environment variables are read; the engine itself is
//! configured explicitly.

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use delta::{
    mongo::{MongoRunner, MongoTool, MongoTracker},
    shell::{EvalRunner, ExecRunner},
    sqlite::SqliteTracker,
    Action, Filter, FilterKind, MemoryTracker, Migration, MigrationService, Registry, Request,
};
use sqlx::sqlite::SqlitePoolOptions;

#[derive(Parser)]
#[command(name = "delta", version, about = "Change management for document databases")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand)]
enum Command {
    /// Apply every available change in order
    Commit,
    /// Roll back applied changes, most recent first
    Rollback,
    /// Show the composed migration status
    Status,
    /// Compare the live schema against the migration set
    Compare,
    /// Scaffold a paired commit/rollback artifact
    Create {
        /// Logical name of the new change
        name: String,
    },
}

#[derive(Args)]
struct Options {
    /// Directory scanned for migration artifacts
    #[arg(long, global = true, env = "KOZEN_DELTA_PATH")]
    path: Option<PathBuf>,

    /// Runner driver name
    #[arg(long, global = true, env = "KOZEN_DELTA_RUNNER")]
    runner: Option<String>,

    /// Tracker driver name
    #[arg(long, global = true, env = "KOZEN_DELTA_TRACKER")]
    tracker: Option<String>,

    /// Artifact extension filter
    #[arg(long, global = true, env = "KOZEN_DELTA_EXTENSION", default_value = "js")]
    extension: String,

    /// Stat artifacts even when the filename carries a timestamp
    #[arg(long, global = true, env = "KOZEN_DELTA_STAT")]
    stat: bool,

    /// Key prefix for resolving migration modules
    #[arg(long, global = true, env = "KOZEN_DELTA_KEY")]
    prefix: Option<String>,

    /// Only changes carrying this tag
    #[arg(long, global = true, env = "KOZEN_DELTA_TAG")]
    tag: Option<String>,

    #[arg(long = "filter-id", global = true, env = "KOZEN_DELTA_FILTER_ID")]
    filter_id: Option<String>,

    /// Regex matched against artifact paths
    #[arg(long = "filter-name", global = true, env = "KOZEN_DELTA_FILTER_NAME")]
    filter_name: Option<String>,

    /// Regex matched against artifact paths
    #[arg(long = "filter-file", global = true, env = "KOZEN_DELTA_FILTER_FILE")]
    filter_file: Option<String>,

    /// Lower bound on the change timestamp (RFC 3339)
    #[arg(long = "filter-date", global = true, env = "KOZEN_DELTA_FILTER_DATE")]
    filter_date: Option<DateTime<Utc>>,

    /// include, exclude, start or stop
    #[arg(long = "filter-type", global = true, env = "KOZEN_DELTA_FILTER_TYPE")]
    filter_type: Option<String>,

    /// Take-limit on available changes
    #[arg(long, global = true, env = "KOZEN_DELTA_COUNT")]
    count: Option<usize>,

    /// MongoDB connection string
    #[arg(long, global = true, env = "MDB_URI", default_value = "mongodb://localhost:27017")]
    mdb_uri: String,

    /// MongoDB database name
    #[arg(long, global = true, env = "MDB_DBNAME", default_value = "delta")]
    mdb_dbname: String,

    /// SQLite connection string for the relational tracker
    #[arg(long, global = true, env = "SQLITE_URI", default_value = "sqlite://delta.db")]
    sqlite_uri: String,
}

impl Options {
    fn filter(&self) -> anyhow::Result<Option<Filter>> {
        let kind = match self.filter_type.as_deref() {
            None => FilterKind::default(),
            Some("include") => FilterKind::Include,
            Some("exclude") => FilterKind::Exclude,
            Some("start") => FilterKind::Start,
            Some("stop") => FilterKind::Stop,
            Some(other) => anyhow::bail!("unknown filter type `{other}`"),
        };

        let filter = Filter {
            id: self.filter_id.clone(),
            tag: self.tag.clone(),
            count: self.count,
            created: self.filter_date,
            name: self.filter_name.clone(),
            file: self.filter_file.clone(),
            kind,
        };

        let empty = filter.id.is_none()
            && filter.tag.is_none()
            && filter.count.is_none()
            && filter.created.is_none()
            && filter.name.is_none()
            && filter.file.is_none();

        Ok(if empty { None } else { Some(filter) })
    }

    fn request(&self, action: Action) -> anyhow::Result<Request> {
        let mut req = Request::new(action)
            .extension(self.extension.clone())
            .stat(self.stat);

        if let Some(path) = &self.path {
            req = req.path(path.clone());
        }
        if let Some(runner) = &self.runner {
            req = req.runner(runner.clone());
        }
        if let Some(tracker) = &self.tracker {
            req = req.tracker(tracker.clone());
        }
        if let Some(prefix) = &self.prefix {
            req = req.prefix(prefix.clone());
        }
        if let Some(filter) = self.filter()? {
            req = req.filter(filter);
        }

        Ok(req)
    }
}

/// Registers the shipped drivers.
///
/// Migration modules would be inserted into `migrations` by embedding
/// applications; the standalone binary starts with an empty registry and
/// is mostly useful with the shell runners.
async fn build_service(options: &Options) -> anyhow::Result<MigrationService> {
    let service = MigrationService::new();

    let client = mongodb::Client::with_uri_str(&options.mdb_uri).await?;
    let db = client.database(&options.mdb_dbname);
    let migrations: Arc<Registry<dyn Migration<MongoTool>>> = Arc::new(Registry::new());

    service.register_tracker("mdb", Arc::new(MongoTracker::new(db.clone())));
    service.register_runner("mdb", Arc::new(MongoRunner::new(client, db, migrations)));

    let pool = SqlitePoolOptions::new().connect_lazy(&options.sqlite_uri)?;
    service.register_tracker("sqlite", Arc::new(SqliteTracker::new(pool)));

    service.register_tracker("mem", Arc::new(MemoryTracker::new()));

    service.register_runner("shell", Arc::new(ExecRunner::new()));
    service.register_runner("mongosh", Arc::new(EvalRunner::new(options.mdb_uri.clone())));

    Ok(service)
}

fn render<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let service = build_service(&cli.options).await?;

    match cli.command {
        Command::Commit => {
            let req = cli.options.request(Action::Commit)?;
            let report = service.commit(&req).await?;

            if let Some(halt) = &report.halted {
                tracing::warn!(name = %halt.name, reason = %halt.reason, "batch halted");
            }

            render(&report)
        }
        Command::Rollback => {
            let req = cli.options.request(Action::Rollback)?;
            let report = service.rollback(&req).await?;

            if let Some(halt) = &report.halted {
                tracing::warn!(name = %halt.name, reason = %halt.reason, "batch halted");
            }

            render(&report)
        }
        Command::Status => {
            let req = cli.options.request(Action::Status)?;

            render(&service.status(&req).await?)
        }
        Command::Compare => {
            let req = cli.options.request(Action::Compare)?;
            let outcome = service.compare(&req).await?;
            println!("{outcome}");

            Ok(())
        }
        Command::Create { name } => {
            let req = cli.options.request(Action::Create)?;
            let created = service.create(&name, &req).await?;

            for file in created {
                println!("{}", file.display());
            }

            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "delta failed");
            ExitCode::FAILURE
        }
    }
}
