//! Policy document model and loading

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use swg_common::{SwgError, SwgResult};
use tracing::warn;

/// Rules applicable to one user, or to the default case
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyBlock {
    /// Domains denied outright (case-insensitive)
    #[serde(deserialize_with = "null_as_default")]
    pub blocked_domains: Vec<String>,
    /// Content categories denied
    #[serde(deserialize_with = "null_as_default")]
    pub blocked_categories: Vec<String>,
    /// Informational; carried for administration, not enforced
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_categories: Vec<String>,
    /// When non-empty, the only destinations permitted (exact match)
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_destinations: Vec<String>,
    /// Require a healthy device posture
    pub device_trust_required: bool,
    /// Allow even when other checks in this block produced reasons
    pub allow_all_if_no_match: bool,
}

impl PolicyBlock {
    /// Block that allows everything
    pub fn allow_all() -> Self {
        Self {
            allow_all_if_no_match: true,
            ..Default::default()
        }
    }
}

/// Full policy document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyDocument {
    /// Block used for unknown or unresolved users
    #[serde(deserialize_with = "null_as_default")]
    pub default_policy: PolicyBlock,
    /// Per-user blocks
    #[serde(deserialize_with = "null_as_default")]
    pub users: BTreeMap<String, PolicyBlock>,
    /// User to credential map
    #[serde(deserialize_with = "null_as_default")]
    pub tokens: BTreeMap<String, String>,
}

impl PolicyDocument {
    /// Document used when no policy file exists
    pub fn allow_all() -> Self {
        Self {
            default_policy: PolicyBlock::allow_all(),
            ..Default::default()
        }
    }

    /// Parse a YAML document. An empty document yields an empty default block.
    pub fn from_yaml(contents: &str) -> SwgResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| SwgError::InvalidPolicy(e.to_string()))
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> SwgResult<String> {
        serde_yaml::to_string(self).map_err(|e| SwgError::InvalidPolicy(e.to_string()))
    }

    /// Load from disk, falling back to allow-all when the file is absent
    pub fn load(path: &Path) -> SwgResult<Self> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Policy file not found; falling back to default allow-all policy"
            );
            return Ok(Self::allow_all());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| SwgError::PolicyLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Block for a resolved user, or the default block
    pub fn block_for(&self, user: Option<&str>) -> &PolicyBlock {
        user.and_then(|u| self.users.get(u))
            .unwrap_or(&self.default_policy)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
