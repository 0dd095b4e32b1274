use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A release anchor: a tag name together with the commit it points at.
///
/// Annotated and lightweight tags both qualify; for annotated tags the
/// tag message is carried along as [`Release::annotation`]. The date is
/// always the author date of the tagged commit, never the tag's own
/// timestamp, so lightweight tags sort the same way annotated ones do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Tag name, e.g. `v1.2.0`.
    pub name: String,
    /// Author date of the tagged commit.
    pub date: DateTime<Utc>,
    /// Full hex id of the tagged commit.
    pub revision: String,
    /// Message of the annotated tag, if any.
    pub annotation: Option<String>,
}

impl Release {
    /// Abbreviated form of the tagged commit id.
    #[must_use]
    pub fn short_revision(&self) -> &str {
        &self.revision[..7.min(self.revision.len())]
    }
}

/// A single commit as it appears in a changelog section.
///
/// The message holds only the summary line of the original commit;
/// bodies never reach the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full hex commit id.
    pub sha: String,
    /// Summary line of the commit message.
    pub message: String,
    /// Author name.
    pub author: String,
    /// Author date.
    pub date: DateTime<Utc>,
}

impl Commit {
    /// Abbreviated commit id, as used in rendered links.
    #[must_use]
    pub fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }
}
