use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Sort};
use regex::Regex;
use tracing::debug;

use super::error::HistoryError;
use super::provider::HistoryProvider;
use super::types::{Commit, Release};

/// History provider backed by a git repository on disk.
///
/// Every query opens the repository afresh, so a provider can be built
/// for a path that does not exist yet and the failure surfaces as
/// [`HistoryError::RepositoryUnavailable`] on first use.
pub struct GitHistoryProvider {
    path: PathBuf,
    tag_pattern: Option<Regex>,
}

impl GitHistoryProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tag_pattern: None,
        }
    }

    /// Restrict releases to tags matching `pattern`.
    ///
    /// Tags that do not match are invisible: they neither get a section
    /// nor take part in release pairing.
    pub fn with_tag_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.tag_pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    fn open(&self) -> Result<Repository, HistoryError> {
        Repository::open(&self.path).map_err(|_| HistoryError::RepositoryUnavailable {
            path: self.path.display().to_string(),
        })
    }

    fn resolve_tag<'repo>(
        &self,
        repo: &'repo Repository,
        name: &str,
    ) -> Result<git2::Commit<'repo>, HistoryError> {
        let object = repo
            .revparse_single(&format!("refs/tags/{name}"))
            .map_err(|_| HistoryError::ReleaseNotFound {
                name: name.to_string(),
            })?;
        object
            .peel_to_commit()
            .map_err(|_| HistoryError::ReleaseNotFound {
                name: name.to_string(),
            })
    }

    fn walk(
        &self,
        repo: &Repository,
        from: Option<Oid>,
        to: Oid,
    ) -> Result<Vec<Commit>, HistoryError> {
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(to)?;
        if let Some(from) = from {
            revwalk.hide(from)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            // merge commits carry no changes of their own
            if commit.parent_count() > 1 {
                continue;
            }
            commits.push(to_commit(&commit));
        }
        // the walker interleaves branches; the document wants strict date order
        commits.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(commits)
    }
}

fn to_commit(commit: &git2::Commit<'_>) -> Commit {
    Commit {
        sha: commit.id().to_string(),
        message: commit.summary().unwrap_or("").to_string(),
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        date: timestamp(commit.author().when().seconds()),
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_else(Utc::now)
}

impl HistoryProvider for GitHistoryProvider {
    fn list_releases(&self) -> Result<Vec<Release>, HistoryError> {
        let repo = self.open()?;
        let names = repo.tag_names(None)?;

        let mut releases = Vec::new();
        for name in names.iter().flatten() {
            if let Some(pattern) = &self.tag_pattern {
                if !pattern.is_match(name) {
                    continue;
                }
            }
            let Ok(object) = repo.revparse_single(&format!("refs/tags/{name}")) else {
                continue;
            };
            // tags can point at trees or blobs; only commit tags anchor a release
            let Ok(commit) = object.peel_to_commit() else {
                continue;
            };
            let annotation = object
                .as_tag()
                .and_then(|tag| tag.message())
                .map(|message| message.trim().to_string())
                .filter(|message| !message.is_empty());
            releases.push(Release {
                name: name.to_string(),
                date: timestamp(commit.author().when().seconds()),
                revision: commit.id().to_string(),
                annotation,
            });
        }
        releases.sort_by(|a, b| b.date.cmp(&a.date));
        debug!(count = releases.len(), "listed releases");
        Ok(releases)
    }

    fn commits_between(
        &self,
        previous: Option<&str>,
        current: &str,
    ) -> Result<Vec<Commit>, HistoryError> {
        let repo = self.open()?;
        let to = self.resolve_tag(&repo, current)?.id();
        let from = match previous {
            Some(name) => Some(self.resolve_tag(&repo, name)?.id()),
            None => None,
        };
        self.walk(&repo, from, to)
    }

    fn commits_since(&self, release: &str) -> Result<Vec<Commit>, HistoryError> {
        let repo = self.open()?;
        let from = self.resolve_tag(&repo, release)?.id();
        let head = repo.head()?.peel_to_commit()?.id();
        self.walk(&repo, Some(from), head)
    }
}
