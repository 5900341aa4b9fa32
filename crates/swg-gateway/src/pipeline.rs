//! Enforcement pipeline
//!
//! Every inspector runs on every request; nothing short-circuits. Reasons
//! are appended in a fixed order: structural problems, blocklist, policy,
//! CASB, DLP.

use crate::config::{AllowAllOverride, GatewayConfig};
use crate::sink::{AuditSink, JsonlFileSink, MemorySink};
use crate::tls::TlsInspector;
use std::path::Path;
use std::sync::Arc;
use swg_casb::{ActivityRules, CloudAppDetector};
use swg_common::{
    parse_destination, AtomicCounter, AuditRecord, CasbAction, RawRequest, SwgError, SwgResult,
    TlsMetadata,
};
use swg_dlp::{DlpAction, PayloadFinding, PayloadInspector};
use swg_filter::{DestinationClassifier, DomainBlocklist, UrlCategorizer};
use swg_policy::{DeviceTrust, IdentityResult, PolicyDecision, PolicyEngine, PolicyStore};
use tracing::{error, info};

/// Reason appended when the payload carries a blocking identifier
pub const DLP_BLOCKED: &str = "DLP blocked sensitive content";

/// Reason appended when the payload exceeds the scan ceiling
pub const DLP_TRUNCATED: &str = "DLP scan truncated";

/// Outcome of one processed request
#[derive(Debug, Clone)]
pub struct GatewayVerdict {
    /// Final verdict
    pub allowed: bool,
    /// Audit record handed to the sinks
    pub record: AuditRecord,
    /// Policy engine decision
    pub decision: PolicyDecision,
    /// Effective CASB action
    pub casb_action: CasbAction,
    /// Payload inspector action
    pub dlp_action: DlpAction,
    /// Payload inspector result
    pub dlp: PayloadFinding,
    /// TLS metadata
    pub tls: TlsMetadata,
}

/// Request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayStats {
    /// Requests processed
    pub requests: u64,
    /// Requests allowed
    pub allowed: u64,
    /// Requests blocked
    pub blocked: u64,
}

/// Secure web gateway
pub struct SecureWebGateway {
    classifier: DestinationClassifier,
    policy: PolicyEngine,
    dlp: PayloadInspector,
    cloud_apps: CloudAppDetector,
    activity: ActivityRules,
    tls: TlsInspector,
    sinks: Vec<Arc<dyn AuditSink>>,
    memory_log: Option<Arc<MemorySink>>,
    allow_all_override: AllowAllOverride,
    requests: AtomicCounter,
    allowed: AtomicCounter,
    blocked: AtomicCounter,
}

impl SecureWebGateway {
    /// Create gateway with empty destination lists and no sinks
    pub fn new(policy: PolicyEngine, dlp: PayloadInspector) -> Self {
        Self {
            classifier: DestinationClassifier::default(),
            policy,
            dlp,
            cloud_apps: CloudAppDetector::default(),
            activity: ActivityRules::default(),
            tls: TlsInspector,
            sinks: Vec::new(),
            memory_log: None,
            allow_all_override: AllowAllOverride::default(),
            requests: AtomicCounter::new(0),
            allowed: AtomicCounter::new(0),
            blocked: AtomicCounter::new(0),
        }
    }

    /// Build everything a config file describes
    pub fn from_config(config: &GatewayConfig) -> SwgResult<Self> {
        let store = Arc::new(PolicyStore::open(&config.policy_path)?);
        let policy = PolicyEngine::new(store, DeviceTrust::new(config.device_min_score));
        let classifier = DestinationClassifier::new(
            DomainBlocklist::load(&config.blocklist_paths),
            UrlCategorizer::load(&config.categories_path)?,
        );

        let mut gateway = Self::new(policy, PayloadInspector::new(config.dlp)?)
            .with_classifier(classifier)
            .with_allow_all_override(config.allow_all_override);

        if config.memory_log_capacity > 0 {
            let memory = MemorySink::new(config.memory_log_capacity);
            gateway = gateway.with_memory_log(Arc::new(memory));
        }
        if let Some(path) = &config.audit_log_path {
            let sink = JsonlFileSink::open(path).map_err(|e| SwgError::Sink(e.to_string()))?;
            info!(path = %path.display(), "Audit log enabled");
            gateway = gateway.with_sink(Arc::new(sink));
        }

        Ok(gateway)
    }

    /// Set the destination classifier
    pub fn with_classifier(mut self, classifier: DestinationClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the cloud app table
    pub fn with_cloud_apps(mut self, detector: CloudAppDetector) -> Self {
        self.cloud_apps = detector;
        self
    }

    /// Set the forbidden-activity rules
    pub fn with_activity_rules(mut self, rules: ActivityRules) -> Self {
        self.activity = rules;
        self
    }

    /// Add an audit sink
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Add an in-memory sink that also serves recent records
    pub fn with_memory_log(mut self, sink: Arc<MemorySink>) -> Self {
        self.sinks.push(sink.clone());
        self.memory_log = Some(sink);
        self
    }

    /// Set override handling
    pub fn with_allow_all_override(mut self, mode: AllowAllOverride) -> Self {
        self.allow_all_override = mode;
        self
    }

    /// Run one request through every inspector
    pub fn process(&self, request: &RawRequest) -> GatewayVerdict {
        self.requests.inc();

        let (destination, mut reasons) = parse_destination(&request.url);
        if !request.method_supported() {
            reasons.push(format!("unsupported method: {}", request.method));
        }

        let blocklist = self.classifier.decision(&destination.domain);
        let categories = self.classifier.categorize(&request.url);
        let tls = self.tls.inspect(&destination.domain, None);
        let dlp = if request.carries_body() {
            self.dlp.inspect(request.body.as_deref().unwrap_or_default())
        } else {
            PayloadFinding::default()
        };
        let detection = self.cloud_apps.detect(&destination.domain, &destination.path);
        let casb = swg_casb::summarize(&detection, self.activity.evaluate(&request.url));
        let decision = self.policy.evaluate(
            request.credential.as_deref(),
            &destination.domain,
            &categories,
            &request.device,
        );

        if blocklist.blocked {
            reasons.push(blocklist.reason.to_string());
        }
        reasons.extend(decision.reasons.iter().cloned());
        if !casb.violations.is_empty() {
            reasons.push(format!("CASB violation: {}", casb.violations.join("; ")));
        }
        if dlp.has_blocking_finding() {
            reasons.push(DLP_BLOCKED.to_string());
        }
        if dlp.truncated {
            reasons.push(DLP_TRUNCATED.to_string());
        }

        let blocking_reasons = match self.allow_all_override {
            AllowAllOverride::Honor if decision.override_applied => {
                reasons.len() - decision.reasons.len()
            }
            _ => reasons.len(),
        };
        let allowed = blocking_reasons == 0 && decision.allowed && casb.action != CasbAction::Block;

        let record = AuditRecord {
            user: decision.user.clone(),
            domain: destination.domain,
            url: request.url.clone(),
            method: request.method.clone(),
            categories,
            allowed,
            reasons,
            dlp: dlp.summary(),
            casb,
            device: decision.device.clone(),
            tls: tls.clone(),
        };

        if allowed {
            self.allowed.inc();
        } else {
            self.blocked.inc();
        }
        self.emit(&record);

        GatewayVerdict {
            allowed,
            casb_action: record.casb.action,
            dlp_action: dlp.action,
            record,
            decision,
            dlp,
            tls,
        }
    }

    fn emit(&self, record: &AuditRecord) {
        info!(
            user = ?record.user,
            domain = %record.domain,
            method = %record.method,
            allowed = record.allowed,
            reasons = ?record.reasons,
            casb = %record.casb.action,
            dlp = %record.dlp,
            "Request processed"
        );

        for sink in &self.sinks {
            if let Err(e) = sink.deliver(record) {
                error!(sink = sink.name(), error = %e, "Failed to deliver audit record");
            }
        }
    }

    /// Validate a credential against the current policy snapshot
    pub fn validate_credential(&self, credential: Option<&str>) -> IdentityResult {
        self.policy.validate_credential(credential)
    }

    /// Re-read the policy document
    pub fn reload_policy(&self) -> SwgResult<u64> {
        self.policy.reload()
    }

    /// Current policy snapshot version
    pub fn policy_version(&self) -> u64 {
        self.policy.store().version()
    }

    /// Backing policy file
    pub fn policy_path(&self) -> Option<&Path> {
        self.policy.store().path()
    }

    /// Policy engine
    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// In-memory record buffer, if configured
    pub fn memory_log(&self) -> Option<&Arc<MemorySink>> {
        self.memory_log.as_ref()
    }

    /// Override handling in effect
    pub fn allow_all_override(&self) -> AllowAllOverride {
        self.allow_all_override
    }

    /// Counters
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            requests: self.requests.get(),
            allowed: self.allowed.get(),
            blocked: self.blocked.get(),
        }
    }
}
