//! Audit record schema
//!
//! Log sinks and the dashboard read these field names verbatim, so the
//! serialized shape must not drift.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Device trust verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePosture {
    /// Device identifier
    pub device_id: String,
    /// Raw health AND score above the configured minimum
    pub healthy: bool,
    /// Posture score as reported
    pub posture_score: i64,
}

/// TLS handshake metadata that can be logged without decryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsMetadata {
    /// SNI server name
    pub server_name: String,
    /// Negotiated protocol version
    pub tls_version: String,
    /// Negotiated cipher suite
    pub cipher_suite: String,
}

/// CASB enforcement action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasbAction {
    /// Let the traffic through
    #[default]
    Allow,
    /// Let it through but flag for review
    Review,
    /// Block the traffic
    Block,
}

impl CasbAction {
    /// Lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            CasbAction::Allow => "allow",
            CasbAction::Review => "review",
            CasbAction::Block => "block",
        }
    }
}

impl fmt::Display for CasbAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CASB section of the audit record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasbSummary {
    /// Detected cloud application
    pub app: Option<String>,
    /// Forbidden-activity descriptions, in rule order
    pub violations: Vec<String>,
    /// Effective CASB action
    pub action: CasbAction,
}

/// Normalized record emitted once per processed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Resolved user, if the credential was valid
    pub user: Option<String>,
    /// Destination host
    pub domain: String,
    /// Full URL as requested
    pub url: String,
    /// HTTP method as requested
    pub method: String,
    /// Content categories
    pub categories: BTreeSet<String>,
    /// Final verdict
    pub allowed: bool,
    /// Every reason collected, in pipeline order
    pub reasons: Vec<String>,
    /// Comma-joined DLP finding tags
    pub dlp: String,
    /// CASB outcome
    pub casb: CasbSummary,
    /// Device posture
    pub device: DevicePosture,
    /// TLS metadata
    pub tls: TlsMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_field_names() {
        let record = AuditRecord {
            user: Some("alice".into()),
            domain: "drive.google.com".into(),
            url: "https://drive.google.com/upload/doc".into(),
            method: "POST".into(),
            categories: ["File Sharing".to_string()].into_iter().collect(),
            allowed: false,
            reasons: vec!["CASB violation: Generic upload endpoint".into()],
            dlp: "sensitive_keyword".into(),
            casb: CasbSummary {
                app: Some("Google Drive".into()),
                violations: vec!["Generic upload endpoint".into()],
                action: CasbAction::Block,
            },
            device: DevicePosture {
                device_id: "laptop-1".into(),
                healthy: true,
                posture_score: 85,
            },
            tls: TlsMetadata {
                server_name: "drive.google.com".into(),
                tls_version: "TLSv1.3".into(),
                cipher_suite: "TLS_AES_256_GCM_SHA384".into(),
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        for key in [
            "user", "domain", "url", "method", "categories", "allowed", "reasons", "dlp", "casb",
            "device", "tls",
        ] {
            assert!(keys.contains(&key.to_string()), "missing {key}");
        }
        assert_eq!(value["casb"]["action"], "block");
        assert_eq!(value["device"]["posture_score"], 85);
        assert_eq!(value["tls"]["cipher_suite"], "TLS_AES_256_GCM_SHA384");

        let back: AuditRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
