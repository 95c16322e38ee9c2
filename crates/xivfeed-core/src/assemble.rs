//! Final entity assembly and aggregator branding.
//!
//! Takes the winning reduced occurrence for one (identity, developer)
//! pair and builds the display-ready [`ProcessedPlugin`] in a single
//! explicit step: merged record fields, the owning-repository snapshot,
//! the API-level union, aggregated freshness, branding flags, and the
//! pre-normalized search-key bundle.

use serde::Deserialize;

use crate::merge::DeveloperPick;
use crate::models::{ProcessedPlugin, SearchMeta};
use crate::normalize::normalize_for_search;

/// Aggregator branding policy, supplied by the caller.
///
/// When a winning occurrence's repository URL starts with
/// `aggregator_url_prefix`, the entity is flagged as affiliated, its
/// contact link becomes `community_url`, and `keywords` fold into the
/// repository search key so searching for the aggregator's name surfaces
/// its plugins.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandingRules {
    #[serde(default = "default_aggregator_url_prefix")]
    pub aggregator_url_prefix: String,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_community_url")]
    pub community_url: String,
}

impl Default for BrandingRules {
    fn default() -> Self {
        Self {
            aggregator_url_prefix: default_aggregator_url_prefix(),
            keywords: default_keywords(),
            community_url: default_community_url(),
        }
    }
}

fn default_aggregator_url_prefix() -> String {
    "https://puni.sh/".to_string()
}
fn default_keywords() -> Vec<String> {
    vec!["puni.sh".to_string()]
}
fn default_community_url() -> String {
    "https://puni.sh/".to_string()
}

impl BrandingRules {
    fn applies_to(&self, repo_url: &str) -> bool {
        !self.aggregator_url_prefix.is_empty() && repo_url.starts_with(&self.aggregator_url_prefix)
    }
}

/// Build one [`ProcessedPlugin`] from a winning pick.
pub fn assemble(pick: DeveloperPick, branding: &BrandingRules) -> ProcessedPlugin {
    let DeveloperPick {
        occurrence,
        mut api_levels,
        last_updated_max_ts,
    } = pick;
    let record = occurrence.record;
    let repo = occurrence.repo;

    // The aggregation already walked this developer's occurrences, but the
    // winning record's own level must never be missing from its badges.
    if let Some(own_level) = record.parsed_api_level() {
        if !api_levels.contains(&own_level) {
            api_levels.push(own_level);
        }
    }
    api_levels.sort_unstable_by(|a, b| b.cmp(a));
    api_levels.dedup();

    let aggregator_affiliated = branding.applies_to(&repo.repo_url);
    let contact_url = if aggregator_affiliated {
        Some(branding.community_url.clone())
    } else {
        repo.repo_discord_url.clone()
    };

    let mut repo_key = normalize_for_search(repo.repo_name.as_deref());
    if aggregator_affiliated {
        for keyword in &branding.keywords {
            repo_key.push_str(&normalize_for_search(Some(keyword)));
        }
    }

    let search = SearchMeta {
        name: normalize_for_search(record.name.as_deref().or(record.internal_name.as_deref())),
        description: normalize_for_search(record.description.as_deref()),
        author: normalize_for_search(record.author.as_deref()),
        repo: repo_key,
    };

    ProcessedPlugin {
        internal_name: record.internal_name,
        name: record.name,
        description: record.description,
        author: record.author,
        repo_url: record.repo_url,
        is_closed_source: record.is_closed_source,
        repo,
        api_levels,
        last_updated_max_ts,
        aggregator_affiliated,
        contact_url,
        search,
    }
}
