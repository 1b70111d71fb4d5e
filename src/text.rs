//! Plain-text rendering of provider output for speech.
//!
//! Providers often answer in Markdown. A screen reader would read the markup
//! aloud, so spoken output goes through [`strip_markdown`]; output shown in a
//! text window keeps the original formatting.

use regex::Regex;
use std::sync::LazyLock;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("markdown pattern is valid"),
        replacement,
    }
}

// Order matters: `***` before `**` before `*`, and inline emphasis before list
// markers so `* item` is not read as an unterminated italic.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"(?m)^#+\s+", ""),
        rule(r"\*\*\*(.+?)\*\*\*", "$1"),
        rule(r"\*\*(.+?)\*\*", "$1"),
        rule(r"\*(.+?)\*", "$1"),
        rule(r"__(.+?)__", "$1"),
        rule(r"_(.+?)_", "$1"),
        rule(r"`(.+?)`", "$1"),
        rule(r"\[(.+?)\]\(.+?\)", "$1"),
        rule(r"(?m)^\*\s+", ""),
        rule(r"(?m)^-\s+", ""),
        rule(r"(?m)^\d+\.\s+", ""),
    ]
});

pub fn strip_markdown(text: &str) -> String {
    let stripped = RULES.iter().fold(text.to_string(), |acc, rule| {
        rule.pattern.replace_all(&acc, rule.replacement).into_owned()
    });
    stripped.trim().to_string()
}
