//! GitHub-style heading slugs.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is not a letter, mark, number, connector, hyphen or space.
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\p{Pc} -]").expect("valid regex"));

/// Slug a string without tracking duplicates.
pub fn slug(value: &str) -> String {
    DISALLOWED
        .replace_all(&value.to_lowercase(), "")
        .replace(' ', "-")
}

/// Generates unique slugs, the way GitHub does for heading anchors.
///
/// The first occurrence of a slug is returned bare; repeats get `-1`, `-2`,
/// and so on. A slugger is meant to live for one document.
#[derive(Debug, Clone, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug `value`, unique among the slugs this slugger has returned.
    pub fn slug(&mut self, value: &str) -> String {
        let original = slug(value);
        let mut result = original.clone();

        while self.occurrences.contains_key(&result) {
            let count = self.occurrences.entry(original.clone()).or_insert(0);
            *count += 1;
            result = format!("{}-{}", original, count);
        }

        self.occurrences.insert(result.clone(), 0);
        result
    }
}
