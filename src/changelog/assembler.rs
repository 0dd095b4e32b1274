use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::git::{Commit, HistoryError, HistoryProvider, Release};

use super::category::{CATCH_ALL_CATEGORY, GroupingMode};

/// The assembled changelog, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogDocument {
    pub generated_at: DateTime<Utc>,
    /// Commits since the newest release, when requested.
    pub unreleased: Option<SectionBody>,
    /// One section per release, newest first.
    pub releases: Vec<ReleaseSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSection {
    pub release: Release,
    pub body: SectionBody,
}

/// What a section contains. A failed history query is content too: it
/// renders as an error line inside the section instead of aborting the
/// whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBody {
    Changes(Vec<CategoryGroup>),
    Empty,
    Failed(String),
}

/// A named category and its merged entries. Categories are sorted
/// ascending with the catch-all last; entries keep the order in which
/// their first commit appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub catch_all: bool,
    pub entries: Vec<MergedEntry>,
}

/// One bullet line: a display message plus a link per underlying commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEntry {
    pub message: String,
    pub links: Vec<CommitLink>,
    pub commit_count: usize,
}

impl MergedEntry {
    /// Links in their rendered form, space separated:
    /// `([abc1234](../../commit/<full id>))`.
    pub fn link_tokens(&self) -> String {
        self.links
            .iter()
            .map(|link| format!("([{}](../../commit/{}))", link.short_sha, link.sha))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLink {
    pub short_sha: String,
    pub sha: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblerOptions {
    pub grouping: GroupingMode,
    pub include_unreleased: bool,
}

/// Walks the release history and builds the document section by
/// section. Generic over the provider so tests can feed canned history.
pub struct ChangelogAssembler<P> {
    provider: P,
    options: AssemblerOptions,
}

impl<P: HistoryProvider> ChangelogAssembler<P> {
    pub fn new(provider: P, options: AssemblerOptions) -> Self {
        Self { provider, options }
    }

    /// Build the full document: list releases once, then one commit
    /// query per section, newest first. Only the release listing can
    /// fail the run; section queries degrade to a `Failed` body.
    pub fn assemble(&self) -> Result<ChangelogDocument, HistoryError> {
        let releases = self.provider.list_releases()?;
        debug!(releases = releases.len(), "assembling changelog");

        let unreleased = if self.options.include_unreleased {
            releases.first().map(|latest| {
                self.section_body("unreleased", self.provider.commits_since(&latest.name))
            })
        } else {
            None
        };

        let mut sections = Vec::with_capacity(releases.len());
        for (index, release) in releases.iter().enumerate() {
            let previous = releases.get(index + 1).map(|older| older.name.as_str());
            let body = self.section_body(
                &release.name,
                self.provider.commits_between(previous, &release.name),
            );
            sections.push(ReleaseSection {
                release: release.clone(),
                body,
            });
        }

        Ok(ChangelogDocument {
            generated_at: Utc::now(),
            unreleased,
            releases: sections,
        })
    }

    fn section_body(&self, name: &str, result: Result<Vec<Commit>, HistoryError>) -> SectionBody {
        match result {
            Err(error) => {
                warn!(section = name, %error, "failed to retrieve commits");
                SectionBody::Failed(error.to_string())
            }
            Ok(commits) if commits.is_empty() => SectionBody::Empty,
            Ok(commits) => SectionBody::Changes(group_commits(&commits, self.options.grouping)),
        }
    }
}

fn group_commits(commits: &[Commit], mode: GroupingMode) -> Vec<CategoryGroup> {
    let mut keyed: Vec<(String, Vec<(String, &Commit)>)> = Vec::new();
    for commit in commits {
        let (category, display) = mode.classify(&commit.message);
        let category = if category.is_empty() {
            CATCH_ALL_CATEGORY.to_string()
        } else {
            category
        };
        match keyed.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push((display, commit)),
            None => keyed.push((category, vec![(display, commit)])),
        }
    }
    keyed.sort_by(|(a, _), (b, _)| compare_categories(a, b));
    keyed
        .into_iter()
        .map(|(name, members)| CategoryGroup {
            catch_all: name == CATCH_ALL_CATEGORY,
            entries: merge_entries(&members),
            name,
        })
        .collect()
}

/// Ascending by name, catch-all pinned to the end.
fn compare_categories(a: &str, b: &str) -> Ordering {
    match (a == CATCH_ALL_CATEGORY, b == CATCH_ALL_CATEGORY) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

fn merge_entries(members: &[(String, &Commit)]) -> Vec<MergedEntry> {
    let mut entries: Vec<MergedEntry> = Vec::new();
    for (display, commit) in members {
        let link = CommitLink {
            short_sha: commit.short_sha().to_string(),
            sha: commit.sha.clone(),
        };
        match entries.iter_mut().find(|entry| entry.message == *display) {
            Some(entry) => {
                entry.links.push(link);
                entry.commit_count += 1;
            }
            None => entries.push(MergedEntry {
                message: display.clone(),
                links: vec![link],
                commit_count: 1,
            }),
        }
    }
    entries
}
