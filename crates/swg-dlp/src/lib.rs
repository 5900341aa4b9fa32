//! OpenSASE SWG DLP - outbound payload inspection
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  Payload Inspection                   │
//! │                                                       │
//! │  bytes ──► lossy UTF-8 ──► ceiling (max_scan_bytes)   │
//! │                                 │                     │
//! │                    ┌────────────┴────────────┐        │
//! │                    ▼                         ▼        │
//! │            ┌──────────────┐        ┌──────────────┐   │
//! │            │ Aho-Corasick │        │   Regexes    │   │
//! │            │   keywords   │        │ per window   │   │
//! │            └──────┬───────┘        └──────┬───────┘   │
//! │                   └──────────┬────────────┘           │
//! │                       PayloadFinding                  │
//! └──────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod patterns;
pub mod scanner;

pub use patterns::PatternSet;
pub use scanner::PayloadInspector;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of sensitive content, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    /// One of the configured sensitive words
    SensitiveKeyword,
    /// Australian phone number
    AuPhone,
    /// Medicare card number
    Medicare,
    /// Tax file number
    Tfn,
}

impl Finding {
    /// Tag used in audit output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SensitiveKeyword => "sensitive_keyword",
            Self::AuPhone => "au_phone",
            Self::Medicare => "medicare",
            Self::Tfn => "tfn",
        }
    }

    /// Identifiers that block the request outright
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Medicare | Self::Tfn)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DlpAction {
    /// Nothing found
    #[default]
    Allow,
    /// Sensitive but not blocking
    Redact,
    /// Medicare or TFN present, or the payload was not fully scanned
    Block,
}

impl DlpAction {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Redact => "redact",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for DlpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of inspecting one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFinding {
    /// Distinct findings in reporting order
    pub findings: Vec<Finding>,
    /// Derived action
    pub action: DlpAction,
    /// `action == Block`
    pub blocked: bool,
    /// Payload exceeded the scan ceiling; the unscanned tail blocks
    pub truncated: bool,
}

impl PayloadFinding {
    /// Build from a set of findings
    pub fn from_findings(findings: BTreeSet<Finding>, truncated: bool) -> Self {
        let action = if truncated || findings.iter().any(Finding::is_blocking) {
            DlpAction::Block
        } else if !findings.is_empty() {
            DlpAction::Redact
        } else {
            DlpAction::Allow
        };

        Self {
            findings: findings.into_iter().collect(),
            blocked: action == DlpAction::Block,
            action,
            truncated,
        }
    }

    /// A Medicare or TFN finding is present
    pub fn has_blocking_finding(&self) -> bool {
        self.findings.iter().any(Finding::is_blocking)
    }

    /// Comma-joined finding tags
    pub fn summary(&self) -> String {
        let tags: Vec<&str> = self.findings.iter().map(Finding::as_str).collect();
        tags.join(",")
    }
}

/// Scan bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DlpConfig {
    /// Bytes past this are not scanned and the payload is blocked
    pub max_scan_bytes: usize,
    /// Regex window size
    pub window_bytes: usize,
}

impl Default for DlpConfig {
    fn default() -> Self {
        Self {
            max_scan_bytes: 1024 * 1024,
            window_bytes: 64 * 1024,
        }
    }
}
