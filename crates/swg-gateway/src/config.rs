//! Gateway Configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use swg_common::SwgResult;
use swg_dlp::DlpConfig;
use swg_policy::posture::DEFAULT_MINIMUM_SCORE;
use tracing::warn;

/// Config file used when `CONFIG_PATH` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.json";

/// How the gateway treats a policy block's `allow_all_if_no_match`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowAllOverride {
    /// Any reason blocks, overridden or not
    #[default]
    Ignore,
    /// Overridden policy reasons do not block; gateway-level reasons still do
    Honor,
}

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Control API listen address
    pub listen_addr: SocketAddr,
    /// Policy document (YAML)
    pub policy_path: PathBuf,
    /// URL categories (JSON)
    pub categories_path: PathBuf,
    /// Domain blocklists
    pub blocklist_paths: Vec<PathBuf>,
    /// JSONL audit log; no file sink when unset
    pub audit_log_path: Option<PathBuf>,
    /// Records kept in memory for the logs endpoint; 0 disables
    pub memory_log_capacity: usize,
    /// Minimum trusted posture score
    pub device_min_score: i64,
    /// Payload scan bounds
    pub dlp: DlpConfig,
    /// Override handling
    pub allow_all_override: AllowAllOverride,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            policy_path: "config/policies.yaml".into(),
            categories_path: "config/categories.json".into(),
            blocklist_paths: vec![
                "config/blocklists/malware_domains.txt".into(),
                "config/blocklists/adult_sites.txt".into(),
                "config/blocklists/social_media.txt".into(),
            ],
            audit_log_path: None,
            memory_log_capacity: 500,
            device_min_score: DEFAULT_MINIMUM_SCORE,
            dlp: DlpConfig::default(),
            allow_all_override: AllowAllOverride::Ignore,
        }
    }
}

impl GatewayConfig {
    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> SwgResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from file, falling back to defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> SwgResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Config not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> SwgResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{
                "listen_addr": "127.0.0.1:9000",
                "allow_all_override": "honor",
                "dlp": {"max_scan_bytes": 4096}
            }"#,
        )
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.allow_all_override, AllowAllOverride::Honor);
        assert_eq!(config.dlp.max_scan_bytes, 4096);
        assert_eq!(config.dlp.window_bytes, DlpConfig::default().window_bytes);
        assert_eq!(config.device_min_score, 70);
        assert_eq!(config.blocklist_paths.len(), 3);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::load_or_default(dir.path().join("gateway.json")).unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        assert!(GatewayConfig::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        let config = GatewayConfig {
            audit_log_path: Some("logs/gateway.jsonl".into()),
            device_min_score: 50,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(GatewayConfig::load(&path).unwrap(), config);
    }
}
