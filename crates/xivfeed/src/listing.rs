//! The `list` command: fetch, merge, and print the ranked plugin table.

use anyhow::{bail, Result};

use xivfeed_core::merge::process_repositories;
use xivfeed_core::models::ProcessedPlugin;
use xivfeed_core::timestamp;

use crate::config::{Config, SORT_MODES};
use crate::feeds;

pub async fn run_list(config: &Config, sort: Option<String>, limit: Option<usize>) -> Result<()> {
    let sort = sort.unwrap_or_else(|| config.listing.default_sort.clone());
    if !SORT_MODES.contains(&sort.as_str()) {
        bail!("Unknown sort mode: {sort}. Use updated, name, or author.");
    }

    let data = feeds::load_all(config).await?;
    let mut output = process_repositories(&data.repositories, &data.trusted_urls, &config.branding);
    sort_plugins(&mut output.plugins, &sort);
    output.plugins.truncate(limit.unwrap_or(config.listing.limit));

    print_table(&output.plugins, data.platform_api_level);
    Ok(())
}

/// Sort semantics of the browsing UI: `updated` is newest-first with a
/// name tie-break; `name` and `author` are case-insensitive ascending.
pub fn sort_plugins(plugins: &mut [ProcessedPlugin], sort: &str) {
    match sort {
        "name" => plugins.sort_by(|a, b| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
        }),
        "author" => plugins.sort_by(|a, b| {
            a.display_author()
                .to_lowercase()
                .cmp(&b.display_author().to_lowercase())
                .then_with(|| {
                    a.display_name()
                        .to_lowercase()
                        .cmp(&b.display_name().to_lowercase())
                })
        }),
        _ => plugins.sort_by(|a, b| {
            b.last_updated_max_ts
                .cmp(&a.last_updated_max_ts)
                .then_with(|| {
                    a.display_name()
                        .to_lowercase()
                        .cmp(&b.display_name().to_lowercase())
                })
        }),
    }
}

/// Print the merged listing. The current platform level, when known, is
/// marked with `*` on matching API badges.
pub fn print_table(plugins: &[ProcessedPlugin], platform_api_level: Option<i64>) {
    if plugins.is_empty() {
        println!("No plugins found.");
        return;
    }

    println!(
        "{:<32} {:<20} {:<12} UPDATED",
        "NAME", "AUTHOR", "API"
    );
    for plugin in plugins {
        let badges = if plugin.api_levels.is_empty() {
            "-".to_string()
        } else {
            plugin
                .api_levels
                .iter()
                .map(|level| {
                    if Some(*level) == platform_api_level {
                        format!("{level}*")
                    } else {
                        level.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        };
        println!(
            "{:<32} {:<20} {:<12} {}",
            clip(plugin.display_name(), 32),
            clip(plugin.display_author(), 20),
            badges,
            timestamp::format_relative_now(plugin.last_updated_max_ts)
        );
    }
    println!();
    println!("{} plugins listed.", plugins.len());
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(max - 1).collect();
        clipped.push('…');
        clipped
    }
}
