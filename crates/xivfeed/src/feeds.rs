//! Feed fetch layer.
//!
//! Each configured input is either an `http(s)://` URL fetched with
//! reqwest or a local filesystem path. The primary plugin feed is fatal
//! on transport failure; the allowlist and platform-version feeds degrade
//! to empty/absent with a diagnostic. There is no retry and no caching —
//! one fetch pass per command run.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use log::warn;
use serde_json::Value;

use xivfeed_core::models::{parse_allowlist, parse_repository_feed, RepositoryDocument};

use crate::config::Config;

/// Everything a single fetch pass produces.
pub struct FeedData {
    pub repositories: Vec<RepositoryDocument>,
    pub trusted_urls: HashSet<String>,
    pub platform_api_level: Option<i64>,
}

/// One fetch pass over all three inputs, concurrently. Only the primary
/// feed can fail the pass.
pub async fn load_all(config: &Config) -> Result<FeedData> {
    let (repositories, trusted_urls, platform_api_level) = tokio::join!(
        load_repositories(config),
        load_allowlist(config),
        load_platform_api_level(config),
    );
    Ok(FeedData {
        repositories: repositories?,
        trusted_urls,
        platform_api_level,
    })
}

/// Load and parse the primary repository feed. Transport failure is
/// fatal; malformed content degrades to empty per the input contract.
pub async fn load_repositories(config: &Config) -> Result<Vec<RepositoryDocument>> {
    let text = load_text(&config.feeds.plugins).await?;
    Ok(parse_repository_feed(&text))
}

/// Load the trusted-source allowlist; any failure yields an empty set.
pub async fn load_allowlist(config: &Config) -> HashSet<String> {
    let Some(source) = &config.feeds.allowlist else {
        return HashSet::new();
    };
    match load_text(source).await {
        Ok(text) => parse_allowlist(&text),
        Err(err) => {
            warn!("trusted-source allowlist unavailable ({err:#}); showing all forks");
            HashSet::new()
        }
    }
}

/// Current platform API level, from either the prebuilt
/// `{"apiLevel": N, ...}` shape or the upstream distribution's
/// `{"AssemblyVersion": "X.Y.Z.W", ...}` version document (API level =
/// major component). Unavailable or malformed → `None`.
pub async fn load_platform_api_level(config: &Config) -> Option<i64> {
    let source = config.feeds.platform_version.as_ref()?;
    let text = match load_text(source).await {
        Ok(text) => text,
        Err(err) => {
            warn!("platform version feed unavailable ({err:#})");
            return None;
        }
    };
    let level = parse_platform_api_level(&text);
    if level.is_none() {
        warn!("platform version feed carried no usable API level");
    }
    level
}

fn parse_platform_api_level(json: &str) -> Option<i64> {
    let value: Value = serde_json::from_str(json).ok()?;
    if let Some(level) = value.get("apiLevel").and_then(Value::as_i64) {
        return (level != 0).then_some(level);
    }
    let assembly = value.get("AssemblyVersion")?.as_str()?;
    let major = assembly.split('.').next()?.trim().parse::<i64>().ok()?;
    (major != 0).then_some(major)
}

async fn load_text(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("xivfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let response = client
            .get(source)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {source}"))?;
        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {source}"))
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
    }
}
