use thiserror::Error;

/// Errors reported by a history provider.
///
/// Only `RepositoryUnavailable` is fatal to a whole run; a
/// `ReleaseNotFound` from a single section query is reported inside
/// that section and the remaining sections still render.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The repository could not be opened at all.
    #[error("repository unavailable: {path}")]
    RepositoryUnavailable { path: String },

    /// A release name did not resolve to a commit.
    #[error("tag '{name}' not found or is not a commit")]
    ReleaseNotFound { name: String },

    /// Any other failure from the underlying git library.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_not_found_names_the_tag() {
        let error = HistoryError::ReleaseNotFound {
            name: "v9.9.9".to_string(),
        };
        assert_eq!(error.to_string(), "tag 'v9.9.9' not found or is not a commit");
    }

    #[test]
    fn repository_unavailable_names_the_path() {
        let error = HistoryError::RepositoryUnavailable {
            path: "/tmp/missing".to_string(),
        };
        assert_eq!(error.to_string(), "repository unavailable: /tmp/missing");
    }
}
