use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category used for commits that fit nowhere else. Always sorts after
/// every named category and renders without its own subheading.
pub const CATCH_ALL_CATEGORY: &str = "Other";

/// How commit messages are sorted into categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Group by a leading `[tag]` prefix; the prefix is stripped from
    /// the displayed message.
    #[default]
    Bracket,
    /// Group into fixed buckets by leading keyword (`feat`, `fix`,
    /// `docs`, ...); messages are displayed unchanged.
    Keyword,
}

impl FromStr for GroupingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bracket" => Ok(GroupingMode::Bracket),
            "keyword" => Ok(GroupingMode::Keyword),
            _ => Err(format!("Unknown grouping mode: {s}")),
        }
    }
}

impl GroupingMode {
    /// Split a commit message into its category and the text shown for
    /// it. An empty category means the commit belongs to the catch-all
    /// group.
    pub fn classify(&self, message: &str) -> (String, String) {
        match self {
            GroupingMode::Bracket => (extract_category(message), normalize_message(message)),
            GroupingMode::Keyword => (keyword_bucket(message).to_string(), message.to_string()),
        }
    }
}

/// Text between the first `[` and the first `]`, trimmed.
///
/// Returns an empty string when either bracket is missing or the first
/// `]` comes before the first `[`; such messages are perfectly valid,
/// they just land in the catch-all group.
pub fn extract_category(message: &str) -> String {
    let open = match message.find('[') {
        Some(index) => index,
        None => return String::new(),
    };
    let close = match message.find(']') {
        Some(index) => index,
        None => return String::new(),
    };
    if close <= open {
        return String::new();
    }
    message[open + 1..close].trim().to_string()
}

/// The message as displayed and as merged on: everything after the
/// first whitespace that follows the first `]`, trimmed.
///
/// Without a `]`, or without whitespace after it, the message is kept
/// unchanged. Note this keys on `]` alone, so `a] b` normalizes to `b`
/// even though it has no category.
pub fn normalize_message(message: &str) -> String {
    let close = match message.find(']') {
        Some(index) => index,
        None => return message.to_string(),
    };
    match message[close + 1..].split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim().to_string(),
        None => message.to_string(),
    }
}

fn keyword_bucket(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.starts_with("feat") {
        "Features"
    } else if lower.starts_with("fix") || lower.starts_with("bugfix") {
        "Bug Fixes"
    } else if lower.starts_with("docs") || lower.starts_with("documentation") {
        "Documentation"
    } else {
        ""
    }
}
