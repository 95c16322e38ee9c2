use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use xivfeed_core::assemble::BrandingRules;

pub const SORT_MODES: [&str; 3] = ["updated", "name", "author"];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub branding: BrandingRules,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedsConfig {
    /// Primary plugin-list feed: an `https://` URL or a local path.
    /// A failure to load this one is fatal.
    #[serde(default = "default_plugins_feed")]
    pub plugins: String,
    /// Trusted-source allowlist; unavailable or malformed degrades to
    /// empty (priority resolution never triggers).
    #[serde(default = "default_allowlist_feed")]
    pub allowlist: Option<String>,
    /// Current platform API level, only used to mark listing badges.
    #[serde(default = "default_platform_version_feed")]
    pub platform_version: Option<String>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            plugins: default_plugins_feed(),
            allowlist: default_allowlist_feed(),
            platform_version: default_platform_version_feed(),
        }
    }
}

fn default_plugins_feed() -> String {
    "./data/plugins.json".to_string()
}
fn default_allowlist_feed() -> Option<String> {
    Some("./data/priority-repos.json".to_string())
}
fn default_platform_version_feed() -> Option<String> {
    Some("./data/dalamud-version.json".to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_sort")]
    pub default_sort: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_sort: default_sort(),
            limit: default_limit(),
        }
    }
}

fn default_sort() -> String {
    "updated".to_string()
}
fn default_limit() -> usize {
    50
}

/// Load configuration from `path`, falling back to built-in defaults when
/// the file does not exist. A file that exists but fails to parse or
/// validate is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.feeds.plugins.trim().is_empty() {
        bail!("feeds.plugins must not be empty");
    }

    if config.listing.limit < 1 {
        bail!("listing.limit must be >= 1");
    }

    if !SORT_MODES.contains(&config.listing.default_sort.as_str()) {
        bail!(
            "Unknown listing.default_sort: '{}'. Must be updated, name, or author.",
            config.listing.default_sort
        );
    }

    // An empty prefix would brand every repository; a relative one can
    // never match a repository URL.
    if !config.branding.aggregator_url_prefix.starts_with("http") {
        bail!("branding.aggregator_url_prefix must be an absolute http(s) URL prefix");
    }

    Ok(config)
}
