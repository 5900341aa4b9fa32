//! Bounded windowed scanner
//!
//! Only the first `max_scan_bytes` of a payload are decoded; a longer payload
//! is reported as truncated and blocks. Keywords are found in one pass over
//! the decoded text. Identifier regexes run per window; consecutive windows
//! overlap by `WINDOW_OVERLAP` bytes so a match straddling a window edge is
//! still seen. A regex hit only counts when it starts inside the current
//! window, which keeps the artificial end of the search slice from producing
//! matches.

use crate::patterns::PatternSet;
use crate::{DlpConfig, Finding, PayloadFinding};
use std::collections::BTreeSet;
use swg_common::{SwgResult, Timestamp};
use tracing::{debug, warn};

/// Bytes shared by adjacent windows
pub const WINDOW_OVERLAP: usize = 64;

/// Payload inspector
pub struct PayloadInspector {
    patterns: PatternSet,
    config: DlpConfig,
}

impl PayloadInspector {
    /// Create inspector with the given bounds
    pub fn new(config: DlpConfig) -> SwgResult<Self> {
        Ok(Self {
            patterns: PatternSet::compile()?,
            config: DlpConfig {
                max_scan_bytes: config.max_scan_bytes,
                window_bytes: config.window_bytes.max(WINDOW_OVERLAP),
            },
        })
    }

    /// Create inspector with default bounds
    pub fn with_defaults() -> SwgResult<Self> {
        Self::new(DlpConfig::default())
    }

    /// Scan bounds in effect
    pub fn config(&self) -> DlpConfig {
        self.config
    }

    /// Inspect raw bytes; invalid UTF-8 sequences are dropped
    pub fn inspect(&self, payload: &[u8]) -> PayloadFinding {
        let truncated = payload.len() > self.config.max_scan_bytes;
        if truncated {
            warn!(
                payload_bytes = payload.len(),
                max_scan_bytes = self.config.max_scan_bytes,
                "Payload exceeds scan ceiling; blocking unscanned tail"
            );
        }

        let scanned = &payload[..payload.len().min(self.config.max_scan_bytes)];
        let text: String = scanned.utf8_chunks().map(|chunk| chunk.valid()).collect();

        self.scan(&text, truncated)
    }

    /// Inspect text
    pub fn inspect_str(&self, payload: &str) -> PayloadFinding {
        self.inspect(payload.as_bytes())
    }

    fn scan(&self, text: &str, truncated: bool) -> PayloadFinding {
        let start = Timestamp::now();
        let mut findings = BTreeSet::new();

        if self.patterns.has_keyword(text) {
            findings.insert(Finding::SensitiveKeyword);
        }

        for (finding, re) in self.patterns.regexes() {
            let hit = windows(text, self.config.window_bytes).any(|(from, to)| {
                let end = floor_char_boundary(text, to.saturating_add(WINDOW_OVERLAP));
                re.find_at(&text[..end], from).is_some_and(|m| m.start() < to)
            });
            if hit {
                findings.insert(finding);
            }
        }

        let result = PayloadFinding::from_findings(findings, truncated);
        debug!(
            bytes = text.len(),
            findings = %result.summary(),
            action = %result.action,
            scan_time_us = start.elapsed_micros(),
            "Payload inspected"
        );
        result
    }
}

/// Window start/end offsets on char boundaries
fn windows(text: &str, size: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut from = 0;
    std::iter::from_fn(move || {
        if from >= text.len() && !(from == 0 && text.is_empty()) {
            return None;
        }
        let mut to = floor_char_boundary(text, from.saturating_add(size));
        if to <= from {
            to = ceil_char_boundary(text, from + 1);
        }
        let window = (from, to);
        from = if to >= text.len() { usize::MAX } else { to };
        Some(window)
    })
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
