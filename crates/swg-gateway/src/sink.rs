//! Audit sinks
//!
//! Delivery is fire-and-forget from the pipeline's point of view: a sink
//! reports failure and the pipeline logs it.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use swg_common::AuditRecord;
use thiserror::Error;
use tracing::debug;

/// Sink failure
#[derive(Error, Debug)]
pub enum SinkError {
    /// Write to the backing file failed
    #[error("failed to write audit log {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Record could not be encoded
    #[error("failed to encode audit record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Sink refused the record
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit records
pub trait AuditSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Deliver one record
    fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

/// Appends one JSON object per line to a file
pub struct JsonlFileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlFileSink {
    /// Open `path` for appending, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| SinkError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlFileSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock();
        file.write_all(&line).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(destination = %self.path.display(), "Audit record written");
        Ok(())
    }
}

/// Ring buffer of recent records
pub struct MemorySink {
    capacity: usize,
    records: Mutex<VecDeque<AuditRecord>>,
}

impl MemorySink {
    /// Keep at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Last `limit` records, oldest first
    pub fn recent(&self, limit: usize) -> Vec<AuditRecord> {
        let records = self.records.lock();
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    /// Records held
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
        if self.capacity == 0 {
            return Ok(());
        }
        let mut records = self.records.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}
