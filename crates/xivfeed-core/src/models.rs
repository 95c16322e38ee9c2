//! Feed data model and lenient wire-format parsing.
//!
//! Field names follow the casing third-party feeds actually publish:
//! plugin records carry Dalamud's pluginmaster PascalCase keys, repository
//! documents carry the aggregated feed's snake_case `repo_*` keys. The two
//! numeric fields upstream emits as either numbers or numeric strings
//! (`LastUpdate`, `DalamudApiLevel`) are kept as raw [`serde_json::Value`]
//! and coerced on demand.
//!
//! Parsing is deliberately lenient: the repositories are independent,
//! mutually-untrusted publishers, and one malformed document must never
//! take the whole listing down. Anomalies absorb to a safe default and
//! emit a `warn!` diagnostic.

use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp;

/// One third-party repository feed: self-declared metadata plus the plugin
/// records it distributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryDocument {
    #[serde(default)]
    pub repo_name: Option<String>,
    /// The distribution endpoint; doubles as the repository's identity.
    pub repo_url: String,
    #[serde(default)]
    pub repo_developer_name: Option<String>,
    #[serde(default)]
    pub repo_source_url: Option<String>,
    #[serde(default)]
    pub repo_discord_url: Option<String>,
    /// Absent or non-array `plugins` deserializes to empty rather than
    /// failing the whole document.
    #[serde(default, deserialize_with = "lenient_plugins")]
    pub plugins: Vec<PluginRecord>,
}

fn lenient_plugins<'de, D>(deserializer: D) -> Result<Vec<PluginRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("skipping malformed plugin record: {err}");
                None
            }
        })
        .collect())
}

/// One plugin entry as published in a repository's pluginmaster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginRecord {
    #[serde(rename = "InternalName", default)]
    pub internal_name: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Author", default)]
    pub author: Option<String>,
    /// Self-declared source location, overriding the repository's.
    #[serde(rename = "RepoUrl", default)]
    pub repo_url: Option<String>,
    /// Epoch seconds or milliseconds, as a number or numeric string.
    #[serde(rename = "LastUpdate", default)]
    pub last_update: Option<Value>,
    /// Integer or numeric string.
    #[serde(rename = "DalamudApiLevel", default)]
    pub api_level: Option<Value>,
    #[serde(default)]
    pub is_closed_source: Option<bool>,
}

impl PluginRecord {
    /// Grouping identity: the stable internal name, else the display name.
    /// A record with neither is unidentifiable and gets dropped upstream.
    pub fn identity(&self) -> Option<&str> {
        non_empty(self.internal_name.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }

    /// Declared API level coerced to an integer; zero or unparseable means
    /// "not declared".
    pub fn parsed_api_level(&self) -> Option<i64> {
        parse_api_level(self.api_level.as_ref())
    }

    /// `LastUpdate` in canonical epoch milliseconds (`0` = unknown).
    pub fn last_update_millis(&self) -> i64 {
        timestamp::normalize_millis(self.last_update.as_ref())
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Coerce a raw `DalamudApiLevel` value to an integer API level.
///
/// Zero and anything unparseable are treated as absent.
pub fn parse_api_level(raw: Option<&Value>) -> Option<i64> {
    let level = match raw? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))?,
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))?
        }
        _ => return None,
    };
    (level != 0).then_some(level)
}

/// Repository metadata carried alongside each plugin record once the
/// owning document's plugin list has been flattened away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub repo_name: Option<String>,
    pub repo_url: String,
    pub repo_developer_name: Option<String>,
    pub repo_source_url: Option<String>,
    pub repo_discord_url: Option<String>,
}

impl From<&RepositoryDocument> for RepositorySnapshot {
    fn from(doc: &RepositoryDocument) -> Self {
        Self {
            repo_name: doc.repo_name.clone(),
            repo_url: doc.repo_url.clone(),
            repo_developer_name: doc.repo_developer_name.clone(),
            repo_source_url: doc.repo_source_url.clone(),
            repo_discord_url: doc.repo_discord_url.clone(),
        }
    }
}

/// Pre-normalized search keys, computed once per entity so query-time
/// matching is a substring scan with no per-keystroke normalization cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMeta {
    pub name: String,
    pub description: String,
    pub author: String,
    pub repo: String,
}

impl SearchMeta {
    /// True if any key contains the already-normalized query term.
    pub fn matches(&self, normalized_term: &str) -> bool {
        self.name.contains(normalized_term)
            || self.description.contains(normalized_term)
            || self.author.contains(normalized_term)
            || self.repo.contains(normalized_term)
    }
}

/// The final, display-ready plugin entity exposed to the presentation
/// layer. Built once per merge pass and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedPlugin {
    pub internal_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    /// The winning record's self-declared source location.
    pub repo_url: Option<String>,
    pub is_closed_source: Option<bool>,
    /// Snapshot of the repository that carried the winning record.
    pub repo: RepositorySnapshot,
    /// Every API level the winning group has shipped, sorted descending.
    pub api_levels: Vec<i64>,
    /// Freshest normalized `LastUpdate` across the winning group.
    pub last_updated_max_ts: i64,
    pub aggregator_affiliated: bool,
    /// Community link for affiliated entries, else the repository's own
    /// declared contact link.
    pub contact_url: Option<String>,
    pub search: SearchMeta,
}

impl ProcessedPlugin {
    pub fn display_name(&self) -> &str {
        non_empty(self.name.as_deref())
            .or_else(|| non_empty(self.internal_name.as_deref()))
            .unwrap_or("Unnamed Plugin")
    }

    pub fn display_author(&self) -> &str {
        non_empty(self.author.as_deref())
            .or_else(|| non_empty(self.repo.repo_developer_name.as_deref()))
            .unwrap_or("Unknown Author")
    }

    /// Source-code location: the record's own declaration wins over the
    /// repository-level one.
    pub fn source_url(&self) -> Option<&str> {
        non_empty(self.repo_url.as_deref()).or_else(|| non_empty(self.repo.repo_source_url.as_deref()))
    }
}

/// Everything the presentation layer consumes: the merged entities plus
/// the distinct API levels observed (for a filter control).
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutput {
    pub plugins: Vec<ProcessedPlugin>,
    pub api_levels: Vec<i64>,
}

/// Parse the primary feed: a JSON array of repository documents.
///
/// A top level that is not an array counts as "no repositories", and
/// individual elements that fail to deserialize are skipped; both cases
/// emit a diagnostic instead of an error.
pub fn parse_repository_feed(json: &str) -> Vec<RepositoryDocument> {
    let value: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(err) => {
            warn!("repository feed is not valid JSON, treating as empty: {err}");
            return Vec::new();
        }
    };
    let Value::Array(entries) = value else {
        warn!("repository feed is not a JSON array, treating as empty");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RepositoryDocument>(entry) {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn!("skipping malformed repository document: {err}");
                None
            }
        })
        .collect()
}

/// Parse the trusted-source allowlist: a JSON array of repository URLs.
///
/// Anything malformed degrades to an empty set, which disables priority
/// resolution entirely (every developer's fork stays visible).
pub fn parse_allowlist(json: &str) -> HashSet<String> {
    let value: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(err) => {
            warn!("trusted-source allowlist is not valid JSON, ignoring: {err}");
            return HashSet::new();
        }
    };
    let Value::Array(entries) = value else {
        warn!("trusted-source allowlist is not a JSON array, ignoring");
        return HashSet::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(url) => Some(url),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feed_with_non_array_top_level_is_empty() {
        assert!(parse_repository_feed("{\"oops\": true}").is_empty());
        assert!(parse_repository_feed("not json at all").is_empty());
    }

    #[test]
    fn malformed_document_is_skipped_not_fatal() {
        let feed = json!([
            {"repo_url": "https://a.example/repo.json", "plugins": []},
            {"plugins": []},
            42
        ]);
        let docs = parse_repository_feed(&feed.to_string());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].repo_url, "https://a.example/repo.json");
    }

    #[test]
    fn non_array_plugins_field_means_no_plugins() {
        let feed = json!([
            {"repo_url": "https://a.example/repo.json", "plugins": "nope"},
            {"repo_url": "https://b.example/repo.json"}
        ]);
        let docs = parse_repository_feed(&feed.to_string());
        assert_eq!(docs.len(), 2);
        assert!(docs[0].plugins.is_empty());
        assert!(docs[1].plugins.is_empty());
    }

    #[test]
    fn plugin_records_use_pluginmaster_casing() {
        let feed = json!([{
            "repo_url": "https://a.example/repo.json",
            "plugins": [{
                "InternalName": "NoClippy",
                "Name": "No Clippy!",
                "Author": "someone",
                "DalamudApiLevel": "9",
                "LastUpdate": "1700000000",
                "is_closed_source": true
            }]
        }]);
        let docs = parse_repository_feed(&feed.to_string());
        let record = &docs[0].plugins[0];
        assert_eq!(record.identity(), Some("NoClippy"));
        assert_eq!(record.parsed_api_level(), Some(9));
        assert_eq!(record.last_update_millis(), 1_700_000_000_000);
        assert_eq!(record.is_closed_source, Some(true));
    }

    #[test]
    fn identity_falls_back_to_display_name() {
        let record = PluginRecord {
            name: Some("Display Only".to_string()),
            ..Default::default()
        };
        assert_eq!(record.identity(), Some("Display Only"));

        let blank = PluginRecord {
            internal_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.identity(), None);
    }

    #[test]
    fn api_level_zero_and_garbage_are_absent() {
        assert_eq!(parse_api_level(Some(&json!(0))), None);
        assert_eq!(parse_api_level(Some(&json!("0"))), None);
        assert_eq!(parse_api_level(Some(&json!("abc"))), None);
        assert_eq!(parse_api_level(Some(&json!(null))), None);
        assert_eq!(parse_api_level(None), None);
        assert_eq!(parse_api_level(Some(&json!(9))), Some(9));
        assert_eq!(parse_api_level(Some(&json!("11"))), Some(11));
        assert_eq!(parse_api_level(Some(&json!(9.7))), Some(9));
    }

    #[test]
    fn allowlist_ignores_non_string_entries_and_garbage() {
        let urls = parse_allowlist(r#"["https://a.example/repo.json", 5, null]"#);
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://a.example/repo.json"));

        assert!(parse_allowlist("{\"nope\": 1}").is_empty());
        assert!(parse_allowlist("garbage").is_empty());
    }
}
