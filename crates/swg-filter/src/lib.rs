//! OpenSASE SWG Filter - destination reputation and categorization
//!
//! Both lookups are pure once built: the blocklist and category patterns
//! are loaded at startup and shared read-only across requests.

#![warn(missing_docs)]

pub mod blocklist;
pub mod category;

pub use blocklist::{BlocklistDecision, DomainBlocklist, BLOCKLIST_MATCH};
pub use category::{UrlCategorizer, UNCATEGORIZED};

use std::collections::BTreeSet;

/// Destination classifier: blocklist plus categorizer
#[derive(Default)]
pub struct DestinationClassifier {
    blocklist: DomainBlocklist,
    categorizer: UrlCategorizer,
}

impl DestinationClassifier {
    /// Combine a blocklist and a categorizer
    pub fn new(blocklist: DomainBlocklist, categorizer: UrlCategorizer) -> Self {
        Self {
            blocklist,
            categorizer,
        }
    }

    /// Blocklist verdict; an empty domain is never blocked
    pub fn decision(&self, domain: &str) -> BlocklistDecision {
        if domain.is_empty() {
            return BlocklistDecision {
                domain: String::new(),
                blocked: false,
                reason: "no domain",
            };
        }
        self.blocklist.decision(domain)
    }

    /// Categories for a URL; an empty URL is Uncategorized
    pub fn categorize(&self, url: &str) -> BTreeSet<String> {
        if url.is_empty() {
            return BTreeSet::from([UNCATEGORIZED.to_string()]);
        }
        self.categorizer.categorize(url)
    }

    /// Blocklist
    pub fn blocklist(&self) -> &DomainBlocklist {
        &self.blocklist
    }

    /// Categorizer
    pub fn categorizer(&self) -> &UrlCategorizer {
        &self.categorizer
    }
}
