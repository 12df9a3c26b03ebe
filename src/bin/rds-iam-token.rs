use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use rds_iam_auth::config::loader::file_to_config;
use rds_iam_auth::config::provider::build_provider;
use rds_iam_auth::config::settings::ServiceConfig;
use rds_iam_auth::observability::metrics::get_metrics;
use rds_iam_auth::session::Session;
use rds_iam_auth::utils::logging::{self, LogLevel};
use tracing::{debug, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG")]
    config: Option<String>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// database user the token is issued for
    #[arg(short, long, env = "PGUSER")]
    user: String,
    /// database endpoint
    #[arg(long, env = "PGHOST")]
    host: String,
    #[arg(short, long, env = "PGPORT", default_value_t = 5432)]
    port: u16,
    /// overrides the configured and ambient region
    #[arg(short, long)]
    region: Option<String>,
    #[arg(long)]
    cache_timeout: Option<i64>,
    /// write the prometheus metrics to stderr after issuing
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let mut service_config = match &args.config {
        Some(path) => file_to_config(Path::new(path)).await?,
        None => ServiceConfig::default(),
    };
    if let Some(cache_timeout) = args.cache_timeout {
        service_config.settings.cache_timeout = Some(cache_timeout);
    }
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build provider from the ambient session
    // -------------------------------

    let session = Session::load().await;
    debug!(ambient_region = ?session.region(), "session loaded");
    let provider = build_provider(&service_config.settings, session)?;

    // -------------------------------
    // 3. Issue token, stdout carries only the token
    // -------------------------------

    let token = provider
        .generate_auth_token(&args.user, &args.host, args.port, args.region.as_deref())
        .with_context(|| format!("generating token for {}@{}:{}", args.user, args.host, args.port))?;
    info!(user = %args.user, host = %args.host, port = args.port, "token issued");
    println!("{}", token);

    if args.print_metrics {
        eprint!("{}", get_metrics().gather_text());
    }

    Ok(())
}
