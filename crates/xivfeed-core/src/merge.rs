//! The merge/ranking engine.
//!
//! Raw repository documents flow through four stages, each a pure fold
//! from an immutable input to a new output collection:
//!
//! 1. Flatten every repository's plugin list and group occurrences by
//!    plugin identity (`InternalName`, else `Name`; records with neither
//!    are dropped with a diagnostic).
//! 2. Within each identity, reduce each publishing developer to a single
//!    best occurrence plus aggregated metadata (API-level union, freshest
//!    timestamp).
//! 3. If any reduced occurrence comes from a trusted repository, collapse
//!    the identity to the single best trusted one; otherwise keep one
//!    entry per developer, side by side.
//! 4. Assemble display-ready entities ([`crate::assemble`]).
//!
//! Identities are emitted in sorted order and developers in first-seen
//! order, so the output is deterministic for a given input — no stage
//! depends on hash-map iteration order.

use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};

use crate::assemble::{assemble, BrandingRules};
use crate::models::{MergeOutput, PluginRecord, RepositoryDocument, RepositorySnapshot};

/// Developer key used when neither the repository nor the record names one.
pub const UNKNOWN_DEVELOPER: &str = "Unknown Developer";

/// One (repository, plugin record) pairing prior to reduction.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub record: PluginRecord,
    pub repo: RepositorySnapshot,
}

/// A developer's single reduced occurrence within one identity group.
#[derive(Debug, Clone)]
pub struct DeveloperPick {
    pub occurrence: Occurrence,
    /// Every API level this developer has shipped for the identity,
    /// sorted descending, de-duplicated.
    pub api_levels: Vec<i64>,
    /// Freshest normalized `LastUpdate` across the developer's occurrences.
    pub last_updated_max_ts: i64,
}

impl DeveloperPick {
    /// Highest aggregated API level (`0` when none was declared).
    pub fn max_api_level(&self) -> i64 {
        self.api_levels.first().copied().unwrap_or(0)
    }
}

/// Run the whole merge: group → reduce → resolve → assemble.
pub fn process_repositories(
    documents: &[RepositoryDocument],
    trusted_urls: &HashSet<String>,
    branding: &BrandingRules,
) -> MergeOutput {
    let groups = group_by_identity(documents);
    debug!(
        "{} identity groups from {} repositories",
        groups.len(),
        documents.len()
    );

    let mut plugins = Vec::new();
    for (_, occurrences) in groups {
        let picks = reduce_by_developer(occurrences);
        for pick in resolve_priority(picks, trusted_urls) {
            plugins.push(assemble(pick, branding));
        }
    }

    let mut api_levels: Vec<i64> = plugins
        .iter()
        .flat_map(|plugin| plugin.api_levels.iter().copied())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    api_levels.sort_unstable_by(|a, b| b.cmp(a));

    MergeOutput { plugins, api_levels }
}

/// Stage 1: flatten every repository's plugin list into identity groups.
///
/// Discovery order is preserved within each group; group keys come back
/// sorted so downstream output order is stable.
pub fn group_by_identity(documents: &[RepositoryDocument]) -> BTreeMap<String, Vec<Occurrence>> {
    let mut groups: BTreeMap<String, Vec<Occurrence>> = BTreeMap::new();
    for doc in documents {
        let snapshot = RepositorySnapshot::from(doc);
        for record in &doc.plugins {
            let Some(identity) = record.identity() else {
                warn!(
                    "dropping plugin with neither InternalName nor Name from {}",
                    doc.repo_url
                );
                continue;
            };
            groups
                .entry(identity.to_string())
                .or_default()
                .push(Occurrence {
                    record: record.clone(),
                    repo: snapshot.clone(),
                });
        }
    }
    groups
}

/// Stage 2: within one identity, reduce each developer to their best
/// occurrence plus the union of their API levels and their freshest
/// timestamp.
///
/// A developer may publish the same plugin through several mirrors; only
/// the freshest/highest-capability one represents them, while every API
/// level they have ever shipped stays advertised. Developer sub-groups
/// keep first-seen order.
pub fn reduce_by_developer(occurrences: Vec<Occurrence>) -> Vec<DeveloperPick> {
    let mut by_developer: Vec<(String, Vec<Occurrence>)> = Vec::new();
    for occ in occurrences {
        let developer = developer_key(&occ);
        match by_developer.iter_mut().find(|(key, _)| *key == developer) {
            Some((_, group)) => group.push(occ),
            None => by_developer.push((developer, vec![occ])),
        }
    }

    by_developer
        .into_iter()
        .filter_map(|(_, group)| reduce_group(group))
        .collect()
}

fn developer_key(occ: &Occurrence) -> String {
    occ.repo
        .repo_developer_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            occ.record
                .author
                .as_deref()
                .filter(|name| !name.trim().is_empty())
        })
        .unwrap_or(UNKNOWN_DEVELOPER)
        .to_string()
}

fn reduce_group(group: Vec<Occurrence>) -> Option<DeveloperPick> {
    let mut occurrences = group.into_iter();
    let first = occurrences.next()?;

    let mut api_levels: Vec<i64> = first.record.parsed_api_level().into_iter().collect();
    let mut last_updated_max_ts = first.record.last_update_millis();
    let mut best = first;

    for occ in occurrences {
        if let Some(level) = occ.record.parsed_api_level() {
            if !api_levels.contains(&level) {
                api_levels.push(level);
            }
        }
        last_updated_max_ts = last_updated_max_ts.max(occ.record.last_update_millis());
        best = pick_better(best, occ);
    }

    api_levels.sort_unstable_by(|a, b| b.cmp(a));
    Some(DeveloperPick {
        occurrence: best,
        api_levels,
        last_updated_max_ts,
    })
}

/// The challenger wins on a strictly higher API level, a strictly newer
/// timestamp at the same level, or a shorter repository URL on a full
/// tie; otherwise the earlier-seen occurrence stays.
fn pick_better(current: Occurrence, challenger: Occurrence) -> Occurrence {
    let current_level = current.record.parsed_api_level().unwrap_or(0);
    let challenger_level = challenger.record.parsed_api_level().unwrap_or(0);
    if challenger_level != current_level {
        return if challenger_level > current_level {
            challenger
        } else {
            current
        };
    }

    let current_ts = current.record.last_update_millis();
    let challenger_ts = challenger.record.last_update_millis();
    if challenger_ts != current_ts {
        return if challenger_ts > current_ts {
            challenger
        } else {
            current
        };
    }

    if challenger.repo.repo_url.len() < current.repo.repo_url.len() {
        challenger
    } else {
        current
    }
}

/// Stage 3: trusted-source resolution for one identity.
///
/// A non-empty trusted subset collapses the identity to its single best
/// member — highest aggregated API level, then freshest, then first seen —
/// and suppresses every other developer's fork. With no trusted occurrence
/// every developer's version is kept: absent an authoritative source the
/// engine must not pick a winner among equally-unverified developers.
pub fn resolve_priority(
    picks: Vec<DeveloperPick>,
    trusted_urls: &HashSet<String>,
) -> Vec<DeveloperPick> {
    let is_trusted =
        |pick: &DeveloperPick| trusted_urls.contains(&pick.occurrence.repo.repo_url);

    if !picks.iter().any(is_trusted) {
        return picks;
    }

    let mut best: Option<DeveloperPick> = None;
    for pick in picks.into_iter().filter(is_trusted) {
        best = Some(match best {
            None => pick,
            Some(current) => better_trusted(current, pick),
        });
    }
    best.into_iter().collect()
}

fn better_trusted(current: DeveloperPick, challenger: DeveloperPick) -> DeveloperPick {
    if challenger.max_api_level() != current.max_api_level() {
        return if challenger.max_api_level() > current.max_api_level() {
            challenger
        } else {
            current
        };
    }
    if challenger.last_updated_max_ts > current.last_updated_max_ts {
        challenger
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(internal: &str, api: i64, ts: i64) -> PluginRecord {
        PluginRecord {
            internal_name: Some(internal.to_string()),
            api_level: (api != 0).then(|| json!(api)),
            last_update: (ts != 0).then(|| json!(ts)),
            ..Default::default()
        }
    }

    fn repo(url: &str, developer: Option<&str>, plugins: Vec<PluginRecord>) -> RepositoryDocument {
        RepositoryDocument {
            repo_name: Some(url.to_string()),
            repo_url: url.to_string(),
            repo_developer_name: developer.map(str::to_string),
            repo_source_url: None,
            repo_discord_url: None,
            plugins,
        }
    }

    fn merge(
        documents: &[RepositoryDocument],
        trusted: &[&str],
    ) -> MergeOutput {
        let trusted: HashSet<String> = trusted.iter().map(|u| u.to_string()).collect();
        process_repositories(documents, &trusted, &BrandingRules::default())
    }

    #[test]
    fn same_identity_groups_across_repos() {
        let docs = vec![
            repo("https://a.example/repo.json", Some("dev-a"), vec![record("Foo", 9, 0)]),
            repo("https://b.example/repo.json", Some("dev-b"), vec![record("Foo", 8, 0)]),
        ];
        let groups = group_by_identity(&docs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["Foo"].len(), 2);
    }

    #[test]
    fn name_fallback_joins_the_same_group() {
        let named_only = PluginRecord {
            name: Some("Foo".to_string()),
            ..Default::default()
        };
        let docs = vec![
            repo("https://a.example/repo.json", Some("dev-a"), vec![record("Foo", 9, 0)]),
            repo("https://b.example/repo.json", Some("dev-b"), vec![named_only]),
        ];
        let groups = group_by_identity(&docs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["Foo"].len(), 2);
    }

    #[test]
    fn record_without_any_name_is_dropped() {
        let docs = vec![repo(
            "https://a.example/repo.json",
            Some("dev-a"),
            vec![PluginRecord::default(), record("Kept", 9, 0)],
        )];
        let output = merge(&docs, &[]);
        assert_eq!(output.plugins.len(), 1);
        assert_eq!(output.plugins[0].internal_name.as_deref(), Some("Kept"));
    }

    #[test]
    fn developer_reduced_to_one_with_level_union() {
        // Same developer, three mirrors of the same plugin.
        let docs = vec![
            repo("https://m1.example/repo.json", Some("dev"), vec![record("Foo", 9, 1_600_000_000)]),
            repo("https://m2.example/repo.json", Some("dev"), vec![record("Foo", 10, 1_700_000_000)]),
            repo("https://m3.example/repo.json", Some("dev"), vec![record("Foo", 10, 1_650_000_000)]),
        ];
        let picks = reduce_by_developer(group_by_identity(&docs).remove("Foo").unwrap());
        assert_eq!(picks.len(), 1);
        let pick = &picks[0];
        assert_eq!(pick.api_levels, vec![10, 9]);
        assert_eq!(pick.last_updated_max_ts, 1_700_000_000_000);
        // Best = level 10 with the newer timestamp.
        assert_eq!(pick.occurrence.repo.repo_url, "https://m2.example/repo.json");
    }

    #[test]
    fn full_tie_prefers_shorter_repo_url() {
        let docs = vec![
            repo("https://long-mirror.example/repo.json", Some("dev"), vec![record("Foo", 9, 1_700_000_000)]),
            repo("https://s.example/repo.json", Some("dev"), vec![record("Foo", 9, 1_700_000_000)]),
        ];
        let picks = reduce_by_developer(group_by_identity(&docs).remove("Foo").unwrap());
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].occurrence.repo.repo_url, "https://s.example/repo.json");

        // Same winner regardless of discovery order.
        let reversed: Vec<_> = docs.into_iter().rev().collect();
        let picks = reduce_by_developer(group_by_identity(&reversed).remove("Foo").unwrap());
        assert_eq!(picks[0].occurrence.repo.repo_url, "https://s.example/repo.json");
    }

    #[test]
    fn missing_developer_name_falls_back_to_author_then_sentinel() {
        let mut anonymous = record("Foo", 9, 0);
        anonymous.author = None;
        let mut authored = record("Foo", 8, 0);
        authored.author = Some("author-b".to_string());

        let docs = vec![
            repo("https://a.example/repo.json", None, vec![anonymous]),
            repo("https://b.example/repo.json", None, vec![authored]),
        ];
        let picks = reduce_by_developer(group_by_identity(&docs).remove("Foo").unwrap());
        // One group under the sentinel, one under the record author.
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn trusted_source_suppresses_forks() {
        let docs = vec![
            repo("https://a.example/repo.json", Some("dev-a"), vec![record("Foo", 9, 1_700_000_000)]),
            repo("https://b.example/repo.json", Some("dev-b"), vec![record("Foo", 10, 1_700_000_100)]),
            repo("https://c.example/repo.json", Some("dev-c"), vec![record("Foo", 10, 1_700_000_200)]),
        ];
        let output = merge(&docs, &["https://a.example/repo.json"]);
        assert_eq!(output.plugins.len(), 1);
        // The trusted occurrence wins even though untrusted forks carry a
        // higher API level: comparison happens only inside the trusted set.
        assert_eq!(output.plugins[0].repo.repo_url, "https://a.example/repo.json");
    }

    #[test]
    fn no_trusted_source_keeps_every_developer() {
        let docs = vec![
            repo("https://a.example/repo.json", Some("dev-a"), vec![record("Foo", 9, 0)]),
            repo("https://b.example/repo.json", Some("dev-b"), vec![record("Foo", 8, 0)]),
            repo("https://c.example/repo.json", Some("dev-c"), vec![record("Foo", 7, 0)]),
        ];
        let output = merge(&docs, &[]);
        assert_eq!(output.plugins.len(), 3);
    }

    #[test]
    fn best_trusted_wins_by_level_then_freshness() {
        let docs = vec![
            repo("https://a.example/repo.json", Some("dev-a"), vec![record("Foo", 10, 1_700_000_000)]),
            repo("https://b.example/repo.json", Some("dev-b"), vec![record("Foo", 10, 1_700_000_500)]),
            repo("https://c.example/repo.json", Some("dev-c"), vec![record("Foo", 9, 1_700_000_900)]),
        ];
        let output = merge(
            &docs,
            &[
                "https://a.example/repo.json",
                "https://b.example/repo.json",
                "https://c.example/repo.json",
            ],
        );
        assert_eq!(output.plugins.len(), 1);
        assert_eq!(output.plugins[0].repo.repo_url, "https://b.example/repo.json");
    }

    #[test]
    fn trusted_repo_wins_mixed_unit_timestamps() {
        // Repository A is allowlisted and publishes API 9 with a seconds
        // timestamp; B publishes API 8 with the same instant in millis.
        let docs = vec![
            repo(
                "https://trusted.example/repo.json",
                Some("dev-a"),
                vec![record("Foo", 9, 1_700_000_000)],
            ),
            repo(
                "https://other.example/repo.json",
                Some("dev-b"),
                vec![record("Foo", 8, 1_700_000_000_000)],
            ),
        ];
        let output = merge(&docs, &["https://trusted.example/repo.json"]);
        assert_eq!(output.plugins.len(), 1);
        let winner = &output.plugins[0];
        assert_eq!(winner.repo.repo_url, "https://trusted.example/repo.json");
        assert_eq!(winner.api_levels, vec![9]);
        assert_eq!(winner.last_updated_max_ts, 1_700_000_000_000);
        assert_eq!(output.api_levels, vec![9]);
    }

    #[test]
    fn distinct_api_levels_cover_all_emitted_plugins() {
        let docs = vec![
            repo("https://a.example/repo.json", Some("dev-a"), vec![record("Foo", 9, 0)]),
            repo("https://b.example/repo.json", Some("dev-b"), vec![record("Bar", 11, 0), record("Baz", 9, 0)]),
        ];
        let output = merge(&docs, &[]);
        assert_eq!(output.api_levels, vec![11, 9]);
    }

    #[test]
    fn output_order_is_stable_across_runs() {
        let docs = vec![
            repo("https://b.example/repo.json", Some("dev-b"), vec![record("Zeta", 9, 0), record("Alpha", 9, 0)]),
            repo("https://a.example/repo.json", Some("dev-a"), vec![record("Alpha", 9, 0)]),
        ];
        let first = merge(&docs, &[]);
        let second = merge(&docs, &[]);
        let names = |out: &MergeOutput| {
            out.plugins
                .iter()
                .map(|p| (p.internal_name.clone(), p.repo.repo_url.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
        // Identities come out sorted.
        assert_eq!(first.plugins[0].internal_name.as_deref(), Some("Alpha"));
    }
}
