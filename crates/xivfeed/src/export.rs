//! Export the merged listing as JSON for the browsing frontend.
//!
//! The payload carries the processed entities, the distinct API levels
//! observed (for the filter control), and the current platform API level
//! when the version feed was reachable.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use xivfeed_core::merge::process_repositories;
use xivfeed_core::models::ProcessedPlugin;

use crate::config::Config;
use crate::feeds;

#[derive(Serialize)]
struct ExportData<'a> {
    plugins: &'a [ProcessedPlugin],
    api_levels: &'a [i64],
    platform_api_level: Option<i64>,
}

/// Fetch, merge, and emit JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes to
/// stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let data = feeds::load_all(config).await?;
    let merged = process_repositories(&data.repositories, &data.trusted_urls, &config.branding);

    let payload = ExportData {
        plugins: &merged.plugins,
        api_levels: &merged.api_levels,
        platform_api_level: data.platform_api_level,
    };
    let json = serde_json::to_string_pretty(&payload)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Exported {} plugins to {}",
                merged.plugins.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
