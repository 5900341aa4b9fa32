//! Compiled keyword automaton and identifier regexes

use crate::Finding;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::Regex;
use swg_common::{SwgError, SwgResult};

/// Words that mark a payload as sensitive
pub const SENSITIVE_KEYWORDS: [&str; 5] =
    ["salary", "passport", "patient", "internal", "confidential"];

const AU_PHONE: &str = r"\b0\d{1,2}\s?\d{3}\s?\d{3}\b";
const MEDICARE: &str = r"\b\d{4}\s?\d{5}\s?\d{1}\b";
const TFN: &str = r"\b\d{3}\s?\d{3}\s?\d{3}\b";

/// Pre-compiled pattern set
pub struct PatternSet {
    keywords: AhoCorasick,
    regexes: Vec<(Finding, Regex)>,
}

impl PatternSet {
    /// Compile the built-in patterns
    pub fn compile() -> SwgResult<Self> {
        let keywords = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostFirst)
            .build(SENSITIVE_KEYWORDS)
            .map_err(|e| SwgError::Config(format!("keyword automaton: {e}")))?;

        let regexes = [
            (Finding::AuPhone, AU_PHONE),
            (Finding::Medicare, MEDICARE),
            (Finding::Tfn, TFN),
        ]
        .into_iter()
        .map(|(finding, pattern)| {
            Regex::new(pattern)
                .map(|re| (finding, re))
                .map_err(|e| SwgError::Config(format!("{finding} pattern: {e}")))
        })
        .collect::<SwgResult<Vec<_>>>()?;

        Ok(Self { keywords, regexes })
    }

    /// Any sensitive keyword in `text`
    #[inline]
    pub fn has_keyword(&self, text: &str) -> bool {
        self.keywords.is_match(text)
    }

    /// Identifier regexes in reporting order
    pub fn regexes(&self) -> impl Iterator<Item = (Finding, &Regex)> {
        self.regexes.iter().map(|(finding, re)| (*finding, re))
    }

    /// Total number of patterns
    pub fn pattern_count(&self) -> usize {
        self.keywords.patterns_len() + self.regexes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_ignore_case() {
        let patterns = PatternSet::compile().unwrap();
        assert!(patterns.has_keyword("CONFIDENTIAL memo"));
        assert!(patterns.has_keyword("internalonly"));
        assert!(!patterns.has_keyword("public notice"));
        assert_eq!(patterns.pattern_count(), 8);
    }

    #[test]
    fn test_identifier_regexes() {
        let patterns = PatternSet::compile().unwrap();
        let hits = |text: &str| -> Vec<Finding> {
            patterns
                .regexes()
                .filter(|(_, re)| re.is_match(text))
                .map(|(f, _)| f)
                .collect()
        };

        assert_eq!(hits("call 02 987 654"), vec![Finding::AuPhone]);
        assert_eq!(hits("card 2123 45670 1"), vec![Finding::Medicare]);
        assert_eq!(hits("tfn 123 456 782"), vec![Finding::Tfn]);
        assert!(hits("order 12345").is_empty());
    }
}
