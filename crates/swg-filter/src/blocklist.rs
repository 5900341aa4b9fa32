//! Domain blocklist
//!
//! Built once from one or more newline-separated files and then only read.
//! Matching is exact after lower-casing; there is no suffix or wildcard
//! matching.

use std::collections::HashSet;
use std::path::Path;
use swg_common::{SwgError, SwgResult};
use tracing::{info, warn};

/// Reason reported for a blocklisted domain
pub const BLOCKLIST_MATCH: &str = "matched threat blocklist";

/// Blocklist verdict for one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlocklistDecision {
    /// Domain as queried
    pub domain: String,
    /// Whether it is listed
    pub blocked: bool,
    /// `matched threat blocklist` or `allowed`
    pub reason: &'static str,
}

/// Set of blocked domains
#[derive(Debug, Clone, Default)]
pub struct DomainBlocklist {
    domains: HashSet<String>,
}

impl DomainBlocklist {
    /// Create empty blocklist
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an in-memory list
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for domain in domains {
            list.insert(domain.as_ref());
        }
        list
    }

    /// Build from files, skipping any that are missing or unreadable
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut list = Self::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                warn!(path = %path.display(), "Blocklist missing");
                continue;
            }
            match list.add_source(path) {
                Ok(added) => info!(path = %path.display(), added, "Loaded blocklist"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to read blocklist"),
            }
        }
        list
    }

    /// Add every domain in a file, returning how many lines were read
    pub fn add_source(&mut self, path: &Path) -> SwgResult<usize> {
        let contents = std::fs::read_to_string(path).map_err(SwgError::Io)?;
        let mut added = 0;
        for line in contents.lines() {
            if self.insert(line) {
                added += 1;
            }
        }
        Ok(added)
    }

    fn insert(&mut self, line: &str) -> bool {
        let domain = line.trim();
        if domain.is_empty() || domain.starts_with('#') {
            return false;
        }
        self.domains.insert(domain.to_lowercase());
        true
    }

    /// Case-insensitive membership
    #[inline]
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.domains.contains(&domain.to_lowercase())
    }

    /// Verdict with reason
    pub fn decision(&self, domain: &str) -> BlocklistDecision {
        let blocked = self.is_blocked(domain);
        BlocklistDecision {
            domain: domain.to_string(),
            blocked,
            reason: if blocked { BLOCKLIST_MATCH } else { "allowed" },
        }
    }

    /// Number of listed domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
