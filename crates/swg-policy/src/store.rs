//! Lock-free policy store with hot-swapping

use crate::document::PolicyDocument;
use crate::identity::IdentityVerifier;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use swg_common::SwgResult;
use tracing::{debug, info};

/// Immutable view of the policy configuration
///
/// The document and the credential table derived from it are always swapped
/// together.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    /// Policy document
    pub document: PolicyDocument,
    /// Credential table
    pub identity: IdentityVerifier,
    /// Monotonic version of this snapshot
    pub version: u64,
}

impl PolicySnapshot {
    fn build(document: PolicyDocument, version: u64) -> Self {
        let identity = IdentityVerifier::from_document(&document);
        Self {
            document,
            identity,
            version,
        }
    }
}

/// Policy store with atomic snapshot replacement
pub struct PolicyStore {
    /// Backing file, if any
    path: Option<PathBuf>,
    /// Current snapshot (atomically swappable)
    current: ArcSwap<PolicySnapshot>,
    /// Last version handed out
    version: AtomicU64,
    /// Serializes writers; readers never take it
    write_lock: Mutex<()>,
}

impl PolicyStore {
    /// Create from an in-memory document
    pub fn new(document: PolicyDocument) -> Self {
        Self {
            path: None,
            current: ArcSwap::from_pointee(PolicySnapshot::build(document, 1)),
            version: AtomicU64::new(1),
            write_lock: Mutex::new(()),
        }
    }

    /// Load from a policy file
    ///
    /// A missing file installs the allow-all document; a malformed one is an
    /// error.
    pub fn open(path: impl AsRef<Path>) -> SwgResult<Self> {
        let path = path.as_ref().to_path_buf();
        let document = PolicyDocument::load(&path)?;
        info!(path = %path.display(), users = document.users.len(), "Loaded policy document");

        Ok(Self {
            path: Some(path),
            ..Self::new(document)
        })
    }

    /// Current snapshot
    ///
    /// Callers keep the returned `Arc` for the whole evaluation so a
    /// concurrent reload never shows them a mix of old and new rules.
    #[inline]
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.current.load_full()
    }

    /// Current version
    #[inline]
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Backing file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Atomically install a new document, returning its version
    pub fn replace(&self, document: PolicyDocument) -> u64 {
        let _guard = self.write_lock.lock();
        self.install(document)
    }

    /// Re-read the backing file and install it
    ///
    /// On a parse error the previous snapshot stays in place.
    pub fn reload(&self) -> SwgResult<u64> {
        let _guard = self.write_lock.lock();

        let Some(path) = &self.path else {
            debug!("Policy store has no backing file; nothing to reload");
            return Ok(self.version());
        };

        let document = PolicyDocument::load(path)?;
        let version = self.install(document);
        info!(path = %path.display(), version, "Policy reloaded");
        Ok(version)
    }

    fn install(&self, document: PolicyDocument) -> u64 {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        self.current.store(Arc::new(PolicySnapshot::build(document, version)));
        version
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(PolicyDocument::allow_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PolicyBlock;
    use std::io::Write;

    #[test]
    fn test_store_replace() {
        let store = PolicyStore::default();
        assert_eq!(store.version(), 1);
        assert!(store.snapshot().document.default_policy.allow_all_if_no_match);

        let version = store.replace(PolicyDocument::default());
        assert_eq!(version, 2);
        assert_eq!(store.version(), 2);
        assert!(!store.snapshot().document.default_policy.allow_all_if_no_match);
    }

    #[test]
    fn test_captured_snapshot_survives_replace() {
        let store = PolicyStore::default();
        let before = store.snapshot();

        let mut document = PolicyDocument::default();
        document.default_policy.blocked_domains = vec!["example.com".into()];
        store.replace(document);

        assert!(before.document.default_policy.blocked_domains.is_empty());
        assert_eq!(store.snapshot().document.default_policy.blocked_domains, vec!["example.com"]);
    }

    #[test]
    fn test_reload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_policy:\n  blocked_domains: [a.test]").unwrap();

        let store = PolicyStore::open(file.path()).unwrap();
        assert_eq!(store.snapshot().document.default_policy.blocked_domains, vec!["a.test"]);

        std::fs::write(
            file.path(),
            "users:\n  alice:\n    device_trust_required: true\ntokens:\n  alice: t1\n",
        )
        .unwrap();
        let version = store.reload().unwrap();
        assert_eq!(version, 2);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.document.default_policy, PolicyBlock::default());
        assert!(snapshot.document.users["alice"].device_trust_required);
        assert_eq!(snapshot.identity.validate(Some("t1")).user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "default_policy:\n  blocked_domains: [a.test]\n").unwrap();
        let store = PolicyStore::open(file.path()).unwrap();

        std::fs::write(file.path(), "default_policy: [broken").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.version(), 1);
        assert_eq!(store.snapshot().document.default_policy.blocked_domains, vec!["a.test"]);
    }

    #[test]
    fn test_reload_after_file_removed_allows_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.yaml");
        std::fs::write(&path, "default_policy:\n  blocked_domains: [a.test]\n").unwrap();
        let store = PolicyStore::open(&path).unwrap();

        std::fs::remove_file(&path).unwrap();
        store.reload().unwrap();
        assert!(store.snapshot().document.default_policy.allow_all_if_no_match);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let store = Arc::new(PolicyStore::default());

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let mut document = PolicyDocument::default();
                    let domain = format!("d{i}.test");
                    document.default_policy.blocked_domains = vec![domain.clone()];
                    document.default_policy.allowed_destinations = vec![domain];
                    store.replace(document);
                }
            })
        };

        for _ in 0..2000 {
            let snapshot = store.snapshot();
            let block = &snapshot.document.default_policy;
            assert_eq!(block.blocked_domains, block.allowed_destinations);
        }
        writer.join().unwrap();
        assert_eq!(store.version(), 201);
    }
}
