use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Number of hex characters of the SHA-256 digest kept as the content hash.
pub const HASH_LEN: usize = 12;

// ---------------------------------------------------------------------------
// Hashtag matching
// ---------------------------------------------------------------------------

static HASHTAG_RE: OnceLock<Regex> = OnceLock::new();
static SPACES_RE: OnceLock<Regex> = OnceLock::new();

fn hashtag_re() -> &'static Regex {
    HASHTAG_RE.get_or_init(|| Regex::new(r"#(\w+)").unwrap())
}

fn spaces_re() -> &'static Regex {
    SPACES_RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

/// Hashtags in order of appearance, without the `#`. Repeats are dropped.
pub fn extract_labels(text: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for cap in hashtag_re().captures_iter(text) {
        let label = &cap[1];
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}

/// The text with every hashtag removed and whitespace tidied.
pub fn clean_summary(text: &str) -> String {
    let stripped = hashtag_re().replace_all(text, "");
    spaces_re().replace_all(stripped.trim(), " ").into_owned()
}

/// Short SHA-256 of the trimmed text. Stable across whitespace at the ends of
/// the line, sensitive to everything else.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.trim().as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(HASH_LEN);
    hex
}

// ---------------------------------------------------------------------------
// TaskLine
// ---------------------------------------------------------------------------

/// One line of the task file, parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLine {
    pub raw: String,
    pub summary: String,
    pub labels: Vec<String>,
    pub content_hash: String,
}

impl TaskLine {
    /// Parse a raw line. Blank lines are not tasks.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut summary = clean_summary(trimmed);
        if summary.is_empty() {
            summary = trimmed.to_string();
        }
        Some(Self {
            raw: trimmed.to_string(),
            summary,
            labels: extract_labels(trimmed),
            content_hash: content_hash(trimmed),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtags_become_labels() {
        assert_eq!(
            extract_labels("Fix login redirect #web #urgent"),
            vec!["web", "urgent"]
        );
    }

    #[test]
    fn repeated_hashtags_collapse() {
        assert_eq!(extract_labels("#a x #b #a"), vec!["a", "b"]);
    }

    #[test]
    fn hashtags_removed_from_summary() {
        assert_eq!(
            clean_summary("Fix #web login redirect #urgent"),
            "Fix login redirect"
        );
    }

    #[test]
    fn unicode_word_hashtags() {
        assert_eq!(extract_labels("Réunion #équipe"), vec!["équipe"]);
        assert_eq!(clean_summary("Réunion #équipe"), "Réunion");
    }

    #[test]
    fn bare_hash_is_not_a_label() {
        let line = TaskLine::parse("Call Bob re: issue # 42").unwrap();
        assert!(line.labels.is_empty());
        assert_eq!(line.summary, "Call Bob re: issue # 42");
    }

    #[test]
    fn hashtag_only_line_keeps_raw_summary() {
        let line = TaskLine::parse("  #inbox #later ").unwrap();
        assert_eq!(line.summary, "#inbox #later");
        assert_eq!(line.labels, vec!["inbox", "later"]);
    }

    #[test]
    fn blank_lines_are_not_tasks() {
        assert!(TaskLine::parse("").is_none());
        assert!(TaskLine::parse("   \t").is_none());
    }

    #[test]
    fn hash_is_twelve_hex_chars() {
        let h = content_hash("Buy milk");
        assert_eq!(h.len(), HASH_LEN);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_matches_known_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea414140de5dae2223b00361a3...
        assert_eq!(content_hash("abc"), "ba7816bf8f01");
    }

    #[test]
    fn hash_ignores_surrounding_whitespace_only() {
        assert_eq!(content_hash("  Buy milk\n"), content_hash("Buy milk"));
        assert_ne!(content_hash("Buy milk"), content_hash("Buy  milk"));
        assert_ne!(content_hash("Buy milk #home"), content_hash("Buy milk"));
    }

    #[test]
    fn parse_populates_every_field() {
        let line = TaskLine::parse("Renew passport #admin\r").unwrap();
        assert_eq!(line.raw, "Renew passport #admin");
        assert_eq!(line.summary, "Renew passport");
        assert_eq!(line.labels, vec!["admin"]);
        assert_eq!(line.content_hash, content_hash("Renew passport #admin"));
    }
}
