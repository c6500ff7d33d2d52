//! churn-analyzer: churn rate of active users from refresh-token activity
//!
//! # Usage
//!
//! ```bash
//! # Connection parameters come from DB_HOST, DB_PORT, DB_NAME, DB_USER,
//! # DB_PASSWORD, DB_SSLMODE, DB_SCHEMA and DB_CONNECT_TIMEOUT
//! churn-analyzer --days 90 --user 123456789
//! churn-analyzer --days 30 --format json --list-users
//! ```

mod churn;
mod clean;
mod config;
mod entities;
mod error;
mod pipeline;
mod report;
mod source;
mod timestamp;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::DatabaseConfig;
use entities::UserId;
use pipeline::Analysis;
use source::postgres::PostgresSource;
use timestamp::TimestampParsing;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Compute the churn rate of active users from their refresh-token activity
#[derive(Parser, Debug)]
#[command(name = "churn-analyzer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Inactivity window in days
    #[arg(short, long, default_value_t = 90)]
    days: u32,

    /// User id to report the status of
    #[arg(short, long)]
    user: Option<UserId>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Include the active and inactive user ids in the output
    #[arg(long)]
    list_users: bool,

    /// Also accept RFC 3339 and other common LastUsedDate layouts
    #[arg(long)]
    lenient_timestamps: bool,

    /// Schema holding ActiveUsers and RefreshTokens (overrides DB_SCHEMA)
    #[arg(long)]
    schema: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref().unwrap_or("info"))?;

    let mut config = DatabaseConfig::from_env().context("loading database configuration")?;
    if let Some(schema) = cli.schema {
        config = config.with_schema(schema);
    }

    let parsing = if cli.lenient_timestamps {
        TimestampParsing::Lenient
    } else {
        TimestampParsing::Strict
    };

    let mut analysis = Analysis::new(cli.days).with_parsing(parsing);
    if let Some(user) = cli.user {
        analysis = analysis.with_target(user);
    }

    let source = PostgresSource::new(config);
    let churn_report = pipeline::run(&source, &analysis)
        .await
        .context("churn analysis failed")?;

    match cli.format {
        OutputFormat::Text => print!("{}", report::render_text(&churn_report, cli.list_users)),
        OutputFormat::Json => println!("{}", report::render_json(&churn_report, cli.list_users)?),
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only the report.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
