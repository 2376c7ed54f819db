//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sitekeeper.toml` files. Secrets such as the API token are never
//! part of the file; they come from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".sitekeeper.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site identity.
    #[serde(default)]
    pub site: SiteConfig,

    /// Analytics fetch and output settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Chart styling, used only by the renderer.
    #[serde(default)]
    pub style: ChartStyle,

    /// Deploy settings.
    #[serde(default)]
    pub deploy: DeployConfig,
}

/// Site identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// GoatCounter site code.
    #[serde(default = "default_site_code")]
    pub site_code: String,

    /// Explicit API base URL. Derived from `site_code` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_code: default_site_code(),
            api_url: None,
        }
    }
}

fn default_site_code() -> String {
    "prameyavismaya".to_string()
}

impl SiteConfig {
    /// The API base URL to use for requests.
    pub fn base_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| crate::stats::base_url_for(&self.site_code))
    }
}

/// Analytics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// How many days back to fetch.
    #[serde(default = "default_days_back")]
    pub days_back: u32,

    /// Maximum number of paths requested from the API.
    #[serde(default = "default_request_limit")]
    pub request_limit: u32,

    /// Output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds. Library default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            request_limit: default_request_limit(),
            output: default_output(),
            timeout_seconds: None,
        }
    }
}

fn default_days_back() -> u32 {
    30
}

fn default_request_limit() -> u32 {
    100
}

fn default_output() -> String {
    "analytics.png".to_string()
}

/// Colors, size and title of the rendered charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    #[serde(default = "default_title")]
    pub title: String,

    /// Figure background.
    #[serde(default = "default_background")]
    pub background: String,

    /// Plot area background.
    #[serde(default = "default_panel")]
    pub panel: String,

    /// Titles.
    #[serde(default = "default_accent")]
    pub accent: String,

    /// Daily visits line and area.
    #[serde(default = "default_line")]
    pub line: String,

    /// Top pages bars.
    #[serde(default = "default_bar")]
    pub bar: String,

    /// Labels and tick text.
    #[serde(default = "default_text")]
    pub text: String,

    /// Grid lines and panel borders.
    #[serde(default = "default_grid")]
    pub grid: String,

    /// Figure width in SVG units.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Figure height in SVG units.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Raster scale factor applied when writing PNG.
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title: default_title(),
            background: default_background(),
            panel: default_panel(),
            accent: default_accent(),
            line: default_line(),
            bar: default_bar(),
            text: default_text(),
            grid: default_grid(),
            width: default_width(),
            height: default_height(),
            scale: default_scale(),
        }
    }
}

fn default_title() -> String {
    "The Mathematical Archive — Analytics".to_string()
}

fn default_background() -> String {
    "#1a1f2e".to_string()
}

fn default_panel() -> String {
    "#232940".to_string()
}

fn default_accent() -> String {
    "#d4a574".to_string()
}

fn default_line() -> String {
    "#88c0d0".to_string()
}

fn default_bar() -> String {
    "#b48ead".to_string()
}

fn default_text() -> String {
    "#cdd6f4".to_string()
}

fn default_grid() -> String {
    "#2e3452".to_string()
}

fn default_width() -> u32 {
    1400
}

fn default_height() -> u32 {
    600
}

fn default_scale() -> f32 {
    1.5 // 144 dpi
}

/// Deploy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Remote to push to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch to push.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Public URL printed after a successful deploy.
    #[serde(default = "default_site_url", skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
            site_url: default_site_url(),
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_site_url() -> Option<String> {
    Some("https://prameyavismaya.github.io".to_string())
}

/// Largest accepted `days_back`, roughly a century.
pub const MAX_DAYS_BACK: u32 = 36_500;

/// Site codes become part of the API host name.
pub fn validate_site_code(site: &str) -> Result<(), String> {
    if site.is_empty() || !site.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(format!("Invalid site code: {:?}", site));
    }
    Ok(())
}

pub fn validate_api_url(api_url: &str) -> Result<(), String> {
    if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
        return Err("API URL must start with 'http://' or 'https://'".to_string());
    }
    Ok(())
}

pub fn validate_days_back(days: u32) -> Result<(), String> {
    if days == 0 {
        return Err("Days must be at least 1".to_string());
    }
    if days > MAX_DAYS_BACK {
        return Err(format!("Days must be at most {}", MAX_DAYS_BACK));
    }
    Ok(())
}

/// Remote and branch names are passed to git as arguments and must not look like options.
pub fn validate_ref_name(kind: &str, name: &str) -> Result<(), String> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(format!("Invalid {} name: {:?}", kind, name));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_if_exists(Path::new(CONFIG_FILE))
    }

    /// Load `path` when it exists. A file that exists but does not parse is an error.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, command: &crate::cli::Command) {
        match command {
            crate::cli::Command::Analytics(args) => {
                if let Some(ref site) = args.site {
                    self.site.site_code = site.clone();
                }
                if let Some(ref api_url) = args.api_url {
                    self.site.api_url = Some(api_url.clone());
                }
                if let Some(days) = args.days {
                    self.analytics.days_back = days;
                }
                if let Some(limit) = args.limit {
                    self.analytics.request_limit = limit;
                }
                if let Some(ref output) = args.output {
                    self.analytics.output = output.display().to_string();
                }
                if let Some(timeout) = args.timeout {
                    self.analytics.timeout_seconds = Some(timeout);
                }
            }
            crate::cli::Command::Deploy(args) => {
                if let Some(ref remote) = args.remote {
                    self.deploy.remote = remote.clone();
                }
                if let Some(ref branch) = args.branch {
                    self.deploy.branch = branch.clone();
                }
            }
        }
    }

    /// Check the merged settings before they reach the network or git.
    pub fn validate(&self) -> Result<(), String> {
        validate_site_code(&self.site.site_code)?;
        if let Some(ref api_url) = self.site.api_url {
            validate_api_url(api_url)?;
        }

        validate_days_back(self.analytics.days_back)?;
        if self.analytics.request_limit == 0 {
            return Err("Request limit must be at least 1".to_string());
        }
        if self.analytics.timeout_seconds == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }
        if self.analytics.output.trim().is_empty() {
            return Err("Output path must not be empty".to_string());
        }

        validate_ref_name("remote", &self.deploy.remote)?;
        validate_ref_name("branch", &self.deploy.branch)?;

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
