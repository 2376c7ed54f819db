//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Environment variable holding the stats API bearer token.
pub const TOKEN_ENV: &str = "GOATCOUNTER_TOKEN";

/// Sitekeeper - analytics charts and deploys for a static website
///
/// Fetch visit statistics and render them to an image, or push local
/// changes of the site repository in one step.
///
/// Examples:
///   sitekeeper analytics
///   sitekeeper analytics --days 7 --output weekly.svg
///   sitekeeper deploy
///   sitekeeper deploy --message "Add new post" --branch gh-pages
///   sitekeeper --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sitekeeper.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .sitekeeper.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch visit statistics and render the analytics charts
    Analytics(AnalyticsArgs),
    /// Commit all changes and push them to the site remote
    Deploy(DeployArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyticsArgs {
    /// GoatCounter site code
    #[arg(long, value_name = "CODE", env = "SITEKEEPER_SITE")]
    pub site: Option<String>,

    /// Stats API base URL (overrides the one derived from the site code)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Number of days back to fetch
    #[arg(long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Maximum number of paths to request
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<u32>,

    /// Output file path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (png, svg, json); inferred from the output extension when omitted
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DeployArgs {
    /// Remote to push to
    #[arg(long, value_name = "REMOTE")]
    pub remote: Option<String>,

    /// Branch to push
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Commit message (prompted for when omitted)
    #[arg(short, long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Show pending changes and the commands that would run, then exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format for the analytics file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// PNG image (default)
    #[default]
    Png,
    /// SVG document
    Svg,
    /// Aggregated series as JSON
    Json,
}

impl OutputFormat {
    /// Infer the format from a file extension, falling back to PNG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("svg") => OutputFormat::Svg,
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Png,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("A subcommand is required (analytics or deploy)".to_string());
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match command {
            Command::Analytics(args) => {
                if let Some(ref api_url) = args.api_url {
                    config::validate_api_url(api_url)?;
                }
                if let Some(ref site) = args.site {
                    config::validate_site_code(site)?;
                }
                if let Some(days) = args.days {
                    config::validate_days_back(days)?;
                }
                if args.limit == Some(0) {
                    return Err("Limit must be at least 1".to_string());
                }
                if args.timeout == Some(0) {
                    return Err("Timeout must be at least 1 second".to_string());
                }
            }
            Command::Deploy(args) => {
                if let Some(ref remote) = args.remote {
                    config::validate_ref_name("remote", remote)?;
                }
                if let Some(ref branch) = args.branch {
                    config::validate_ref_name("branch", branch)?;
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Read the stats API token from `GOATCOUNTER_TOKEN`. There is no flag for it.
pub fn api_token() -> Result<String, String> {
    resolve_token(std::env::var(TOKEN_ENV).ok())
}

/// Check a raw token value, rejecting missing or blank ones.
pub fn resolve_token(raw: Option<String>) -> Result<String, String> {
    raw.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("No API token: set {}", TOKEN_ENV))
}
