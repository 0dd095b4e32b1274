use super::error::HistoryError;
use super::types::{Commit, Release};

/// What the changelog assembler needs to know about a repository.
///
/// The assembler only ever asks these three questions, so anything that
/// can answer them can feed a changelog. The production implementation
/// is [`super::GitHistoryProvider`]; tests substitute an in-memory one.
pub trait HistoryProvider {
    /// All releases in the repository, newest first.
    fn list_releases(&self) -> Result<Vec<Release>, HistoryError>;

    /// Commits reachable from `current` but not from `previous`,
    /// newest first, with merge commits dropped. `previous` is `None`
    /// for the oldest release, which then covers history from the
    /// beginning.
    fn commits_between(
        &self,
        previous: Option<&str>,
        current: &str,
    ) -> Result<Vec<Commit>, HistoryError>;

    /// Commits on the current head that are not reachable from
    /// `release`. Feeds the optional unreleased section.
    fn commits_since(&self, release: &str) -> Result<Vec<Commit>, HistoryError>;
}
