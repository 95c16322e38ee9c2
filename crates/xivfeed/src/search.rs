//! The `search` command: substring matching over the pre-normalized
//! search keys (name, description, author, repository label).

use anyhow::Result;

use xivfeed_core::merge::process_repositories;
use xivfeed_core::normalize::normalize_for_search;

use crate::config::Config;
use crate::feeds;
use crate::listing::{print_table, sort_plugins};

pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    let normalized = normalize_for_search(Some(query));
    if normalized.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let data = feeds::load_all(config).await?;
    let mut output = process_repositories(&data.repositories, &data.trusted_urls, &config.branding);
    output.plugins.retain(|plugin| plugin.search.matches(&normalized));

    if output.plugins.is_empty() {
        println!("No results.");
        return Ok(());
    }

    sort_plugins(&mut output.plugins, &config.listing.default_sort);
    print_table(&output.plugins, data.platform_api_level);
    Ok(())
}
