//! Sitekeeper - analytics and deploys for a static website
//!
//! A CLI tool that fetches visit statistics from a GoatCounter-style
//! API and renders them to an image, and that commits and pushes the
//! site repository in one step.
//!
//! Exit codes:
//!   0 - Success (including "nothing to commit")
//!   1 - Runtime error, invalid arguments, or an aborted deploy

mod analysis;
mod cli;
mod config;
mod deploy;
mod models;
mod report;
mod stats;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{AnalyticsArgs, Args, Command, DeployArgs, OutputFormat};
use config::Config;
use deploy::{DeployOutcome, DeployTarget, FixedPrompt, GitCli, Prompt, StdinPrompt};
use indicatif::{ProgressBar, ProgressStyle};
use stats::{DateWindow, StatsClient};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Sitekeeper v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", args.command);

    let result = match args.command.clone() {
        Some(Command::Analytics(analytics)) => run_analytics(&args, analytics).await,
        Some(Command::Deploy(deploy)) => run_deploy(&args, deploy),
        None => Ok(1),
    };

    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sitekeeper.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   The API token is read from GOATCOUNTER_TOKEN, never from this file.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        // A config file that exists but does not parse is fatal.
        Err(e) => Err(e),
    }
}

/// Fetch, aggregate and render the analytics charts. Returns exit code.
async fn run_analytics(args: &Args, analytics: AnalyticsArgs) -> Result<i32> {
    let command = Command::Analytics(analytics.clone());
    let mut config = load_config(args)?;
    config.merge_with_args(&command);
    config.validate().map_err(anyhow::Error::msg)?;

    let token = cli::api_token().map_err(anyhow::Error::msg)?;

    let output = PathBuf::from(&config.analytics.output);
    let format = analytics
        .format
        .unwrap_or_else(|| OutputFormat::from_path(&output));

    let window = DateWindow::last_days(Utc::now(), config.analytics.days_back)
        .context("Date window reaches past the supported calendar range")?;
    let base_url = config.site.base_url();
    let timeout = config.analytics.timeout_seconds.map(Duration::from_secs);

    println!("📈 Fetching stats for {}", config.site.site_code);
    println!("   API: {}", base_url);
    println!("   Window: {} .. {}", window.start, window.end);

    let client = StatsClient::new(&base_url, &token, timeout)?;

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Fetching stats...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let fetched = client
        .fetch_hits(&window, config.analytics.request_limit)
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let hits = fetched?;
    info!("Fetched {} paths", hits.len());

    let aggregate = analysis::aggregate(&hits, analysis::TOP_PAGES);
    if aggregate.is_empty() {
        warn!("No hits in the requested window; charts will be empty");
    }

    report::write_output(
        &aggregate,
        &config.style,
        config.analytics.days_back,
        &output,
        format,
    )?;

    // Print summary
    println!("\n📊 Analytics Summary:");
    println!("   Days with visits: {}", aggregate.daily.len());
    println!("   Total visits: {}", analysis::total_visits(&aggregate));
    if let Some(day) = analysis::busiest_day(&aggregate) {
        println!("   Busiest day: {} ({})", day.day, day.count);
    }
    for (rank, page) in aggregate.top_pages.iter().enumerate() {
        println!("   {:>2}. {}", rank + 1, page);
    }
    println!("\n✅ Saved {}", output.display());

    Ok(0)
}

/// Commit and push the site repository. Returns exit code.
fn run_deploy(args: &Args, deploy_args: DeployArgs) -> Result<i32> {
    let command = Command::Deploy(deploy_args.clone());
    let mut config = load_config(args)?;
    config.merge_with_args(&command);
    config.validate().map_err(anyhow::Error::msg)?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let mut vcs = GitCli::discover(&cwd)?;
    info!("Repository at: {}", vcs.workdir().display());

    if let Some(current) = vcs.current_branch() {
        if current != config.deploy.branch {
            warn!(
                "Checked out branch is {} but pushing {}",
                current, config.deploy.branch
            );
        }
    }

    let target = DeployTarget {
        remote: config.deploy.remote.clone(),
        branch: config.deploy.branch.clone(),
        site_url: config.deploy.site_url.clone(),
        dry_run: deploy_args.dry_run,
    };

    let mut prompt: Box<dyn Prompt> = match deploy_args.message {
        Some(message) => Box::new(FixedPrompt(message)),
        None => Box::new(StdinPrompt),
    };

    let outcome = deploy::run_deploy(&mut vcs, prompt.as_mut(), &target)?;

    if outcome == DeployOutcome::Deployed {
        if let Some(id) = vcs.head_short_id() {
            info!("Deployed commit {}", id);
        }
    }

    Ok(outcome.exit_code())
}
