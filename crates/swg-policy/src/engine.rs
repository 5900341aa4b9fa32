//! Policy evaluation engine
//!
//! Combines identity, device posture, destination and category signals
//! against the applicable policy block. Every check runs; reasons accumulate
//! in a fixed order and none short-circuits the rest.

use crate::document::PolicyBlock;
use crate::identity::IdentityResult;
use crate::posture::DeviceTrust;
use crate::store::PolicyStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use swg_common::{AtomicCounter, DeviceContext, DevicePosture, SwgResult};
use tracing::debug;

/// Reason for a domain on the block's deny list
pub const DOMAIN_BLOCKED: &str = "domain blocked by policy";
/// Reason for a destination outside the block's allowlist
pub const NOT_IN_ALLOWLIST: &str = "destination not in allowlist";
/// Reason for an unhealthy device where trust is required
pub const DEVICE_NOT_TRUSTED: &str = "device not trusted";

/// Policy engine verdict for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    /// Policy-document verdict only
    pub allowed: bool,
    /// Reasons, in check order
    pub reasons: Vec<String>,
    /// Categories the request was evaluated against
    pub categories: BTreeSet<String>,
    /// Resolved user
    pub user: Option<String>,
    /// Device posture
    pub device: DevicePosture,
    /// `allow_all_if_no_match` turned a non-empty reason list into an allow
    pub override_applied: bool,
}

/// Per-user policy engine
pub struct PolicyEngine {
    store: Arc<PolicyStore>,
    device_trust: DeviceTrust,
    evaluations: AtomicCounter,
}

impl PolicyEngine {
    /// Create engine over a policy store
    pub fn new(store: Arc<PolicyStore>, device_trust: DeviceTrust) -> Self {
        Self {
            store,
            device_trust,
            evaluations: AtomicCounter::new(0),
        }
    }

    /// Evaluate a request against the current policy snapshot
    pub fn evaluate(
        &self,
        credential: Option<&str>,
        domain: &str,
        categories: &BTreeSet<String>,
        device: &DeviceContext,
    ) -> PolicyDecision {
        self.evaluations.inc();
        let snapshot = self.store.snapshot();

        let identity = snapshot.identity.validate(credential);
        let device = self.device_trust.evaluate(device);
        let block = snapshot.document.block_for(identity.user.as_deref());

        let reasons: Vec<String> = [
            check_identity(&identity),
            check_blocked_domain(block, domain),
            check_blocked_categories(block, categories),
            check_allowlist(block, domain),
            check_device(block, &device),
        ]
        .into_iter()
        .flatten()
        .collect();

        let allow_all = block.allow_all_if_no_match;
        let allowed = allow_all || reasons.is_empty();

        debug!(
            user = ?identity.user,
            domain,
            ?categories,
            ?reasons,
            allowed,
            policy_version = snapshot.version,
            "Policy decision"
        );

        PolicyDecision {
            allowed,
            override_applied: allow_all && !reasons.is_empty(),
            reasons,
            categories: categories.clone(),
            user: identity.user,
            device,
        }
    }

    /// Validate a credential against the current snapshot
    pub fn validate_credential(&self, credential: Option<&str>) -> IdentityResult {
        self.store.snapshot().identity.validate(credential)
    }

    /// Re-read the policy document
    pub fn reload(&self) -> SwgResult<u64> {
        self.store.reload()
    }

    /// Policy store
    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    /// Number of evaluations performed
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }
}

fn check_identity(identity: &IdentityResult) -> Option<String> {
    (!identity.valid).then(|| format!("credential failed: {}", identity.reason))
}

fn check_blocked_domain(block: &PolicyBlock, domain: &str) -> Option<String> {
    block
        .blocked_domains
        .iter()
        .any(|d| d.eq_ignore_ascii_case(domain))
        .then(|| DOMAIN_BLOCKED.to_string())
}

fn check_blocked_categories(block: &PolicyBlock, categories: &BTreeSet<String>) -> Option<String> {
    let hits: BTreeSet<&str> = block
        .blocked_categories
        .iter()
        .filter(|c| categories.contains(c.as_str()))
        .map(String::as_str)
        .collect();

    (!hits.is_empty()).then(|| {
        let joined: Vec<&str> = hits.into_iter().collect();
        format!("category blocked: {}", joined.join(", "))
    })
}

fn check_allowlist(block: &PolicyBlock, domain: &str) -> Option<String> {
    // exact match, case-sensitive
    let listed = block.allowed_destinations.iter().any(|d| d == domain);
    (!block.allowed_destinations.is_empty() && !listed).then(|| NOT_IN_ALLOWLIST.to_string())
}

fn check_device(block: &PolicyBlock, device: &DevicePosture) -> Option<String> {
    (block.device_trust_required && !device.healthy).then(|| DEVICE_NOT_TRUSTED.to_string())
}
