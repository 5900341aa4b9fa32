//! OpenSASE SWG Common - Shared types for the secure web gateway
//!
//! This crate provides the vocabulary every enforcement stage speaks:
//! - Request normalization (lenient, never fails)
//! - Device posture and TLS metadata
//! - The audit record schema
//! - Error handling
//! - Lock-free counters for gateway statistics

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod error;
pub mod request;

pub use audit::*;
pub use error::*;
pub use request::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Start of a timed scan
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(Instant);

impl Timestamp {
    /// Mark the start of a scan
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Microseconds since the scan started
    pub fn elapsed_micros(&self) -> u64 {
        u64::try_from(self.0.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Request or evaluation count for gateway statistics
#[derive(Debug, Default)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    /// Counter starting at `value`
    pub const fn new(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Count one more; returns the count before it
    #[inline]
    pub fn inc(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Count so far
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
