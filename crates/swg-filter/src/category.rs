//! URL categorization
//!
//! Each category owns an ordered list of case-insensitive regex patterns. A
//! URL picks up every category with at least one matching pattern.

use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use swg_common::{SwgError, SwgResult};
use tracing::{info, warn};

/// Label for a URL that matched no category
pub const UNCATEGORIZED: &str = "Uncategorized";

struct CategoryRule {
    name: String,
    patterns: Vec<Regex>,
}

/// Pattern-based URL categorizer
#[derive(Default)]
pub struct UrlCategorizer {
    rules: Vec<CategoryRule>,
}

impl UrlCategorizer {
    /// Create categorizer with no categories
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(category, patterns)` pairs
    ///
    /// Patterns that fail to compile are skipped with a warning.
    pub fn from_patterns<I, P>(categories: I) -> Self
    where
        I: IntoIterator<Item = (String, P)>,
        P: IntoIterator<Item = String>,
    {
        let rules = categories
            .into_iter()
            .map(|(name, patterns)| {
                let patterns = patterns
                    .into_iter()
                    .filter_map(|pattern| compile(&name, &pattern))
                    .collect();
                CategoryRule { name, patterns }
            })
            .collect();

        Self { rules }
    }

    /// Parse a `{ "Category": ["pattern", ...] }` JSON document
    pub fn from_json(contents: &str) -> SwgResult<Self> {
        let categories: BTreeMap<String, Vec<String>> = serde_json::from_str(contents)?;
        Ok(Self::from_patterns(categories))
    }

    /// Load from a JSON file; a missing file yields an empty categorizer
    pub fn load(path: &Path) -> SwgResult<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Categories file not found; every URL is Uncategorized");
            return Ok(Self::new());
        }

        let contents = std::fs::read_to_string(path).map_err(SwgError::Io)?;
        let categorizer = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            categories = categorizer.category_count(),
            "Loaded URL categories"
        );
        Ok(categorizer)
    }

    /// Categories for a URL; never empty
    pub fn categorize(&self, url: &str) -> BTreeSet<String> {
        let mut matches: BTreeSet<String> = self
            .rules
            .iter()
            .filter(|rule| rule.patterns.iter().any(|re| re.is_match(url)))
            .map(|rule| rule.name.clone())
            .collect();

        if matches.is_empty() {
            matches.insert(UNCATEGORIZED.to_string());
        }
        matches
    }

    /// Categories for a bare domain
    pub fn category_for_domain(&self, domain: &str) -> BTreeSet<String> {
        self.categorize(domain)
    }

    /// Number of categories
    pub fn category_count(&self) -> usize {
        self.rules.len()
    }
}

fn compile(category: &str, pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(category, pattern, error = %e, "Invalid category pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UrlCategorizer {
        UrlCategorizer::from_json(
            r#"{
                "Business": ["salesforce", "example\\.com/docs"],
                "File Sharing": ["dropbox", "drive\\.google"],
                "Malware": ["malware\\.test", "payload$"],
                "Social Media": ["facebook", "("]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_multiple_categories() {
        let categories = sample().categorize("http://malware.test/payload");
        assert_eq!(categories.len(), 1);
        assert!(categories.contains("Malware"));

        let categories = sample().categorize("https://drive.google.com/salesforce-export");
        assert!(categories.contains("File Sharing"));
        assert!(categories.contains("Business"));
    }

    #[test]
    fn test_case_insensitive() {
        let categories = sample().categorize("HTTPS://WWW.FACEBOOK.COM/");
        assert!(categories.contains("Social Media"));
    }

    #[test]
    fn test_uncategorized() {
        let categories = sample().categorize("https://unknown.test/");
        assert_eq!(categories, BTreeSet::from([UNCATEGORIZED.to_string()]));
    }

    #[test]
    fn test_malformed_pattern_is_skipped() {
        let categorizer = sample();
        assert_eq!(categorizer.category_count(), 4);
        // "(" is dropped, "facebook" still works
        assert!(categorizer.categorize("facebook.com").contains("Social Media"));
        assert!(!categorizer.categorize("(").contains("Social Media"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let categorizer = UrlCategorizer::load(&dir.path().join("categories.json")).unwrap();
        assert_eq!(categorizer.category_count(), 0);
        assert!(categorizer.categorize("https://example.com").contains(UNCATEGORIZED));
    }

    #[test]
    fn test_load_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"News": ["bbc\\.co\\.uk"]}"#).unwrap();

        let categorizer = UrlCategorizer::load(file.path()).unwrap();
        assert!(categorizer.category_for_domain("www.bbc.co.uk").contains("News"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(UrlCategorizer::from_json("[1, 2]").is_err());
    }
}
