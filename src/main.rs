mod app;
mod bootstrap;
mod config;
mod error;
mod prompt;
mod provider;
mod public_ip;
mod reconcile;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use app::{Mode, RunOutcome};
use config::Config;
use prompt::Prompter;
use provider::cloudflare::{CloudflareClient, CLOUDFLARE_API_BASE};
use public_ip::{HttpIpSource, DEFAULT_IP_SERVICE};

#[derive(Parser, Debug)]
#[command(name = "cf-dns-updater")]
#[command(about = "Keeps selected Cloudflare A records pointed at this host's public IP")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Choose which subdomains of each domain to keep updated
    #[arg(long, conflicts_with = "test")]
    select: bool,

    /// Show which records would change without updating them
    #[arg(long)]
    test: bool,

    /// Cloudflare API base URL
    #[arg(long, default_value = CLOUDFLARE_API_BASE)]
    api_url: String,

    /// Service returning the caller's public IP as plain text
    #[arg(long, default_value = DEFAULT_IP_SERVICE)]
    ip_url: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger (env var takes precedence)
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&args.log_level)
    ).init();

    match run(args).await {
        Ok(outcome) if outcome.is_clean() => ExitCode::SUCCESS,
        Ok(outcome) => {
            warn!(
                "Finished with failures: {} domain(s) skipped, {} record update(s) failed",
                outcome.failed_domains.len(),
                outcome.failed_records
            );
            ExitCode::from(error::exit::PROVIDER)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(error::exit_code_for(&e))
        }
    }
}

async fn run(args: Args) -> Result<RunOutcome> {
    let mode = Mode::from_flags(args.select, args.test);
    info!("Loading configuration from: {}", args.config.display());

    let mut config = Config::load(&args.config);
    let mut prompter = Prompter::stdio();
    let http = reqwest::Client::new();

    let api = bootstrap::run(&mut config, &args.config, &mut prompter, |token| {
        Ok(CloudflareClient::new(http.clone(), &args.api_url, token))
    })
    .await
    .context("Failed to complete configuration")?;

    let outcome = match mode {
        Mode::Select => {
            app::select_subdomains(&mut config, &args.config, &api, &mut prompter).await?
        }
        Mode::Test => {
            let ip_source = HttpIpSource::new(http, &args.ip_url);
            app::check_records(&config, &api, &ip_source, &mut io::stdout()).await?
        }
        Mode::Update => {
            let ip_source = HttpIpSource::new(http, &args.ip_url);
            app::update_records(&config, &api, &ip_source).await?
        }
    };

    Ok(outcome)
}
