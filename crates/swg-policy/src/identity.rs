//! Zero Trust credential verification
//!
//! Credentials are pre-shared bearer tokens mapped to users in the policy
//! document. No network call is made.

use crate::document::PolicyDocument;
use std::collections::BTreeMap;
use tracing::warn;

/// Reason for an absent or empty credential
pub const MISSING_CREDENTIAL: &str = "missing credential";
/// Reason for a credential nobody owns
pub const INVALID_CREDENTIAL: &str = "invalid credential";
/// Reason for a successful match
pub const VALIDATED: &str = "validated";

/// Outcome of validating a presented credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResult {
    /// Resolved user
    pub user: Option<String>,
    /// Whether the credential matched
    pub valid: bool,
    /// Human-readable reason
    pub reason: String,
}

impl IdentityResult {
    fn invalid(reason: &str) -> Self {
        Self {
            user: None,
            valid: false,
            reason: reason.to_string(),
        }
    }
}

/// In-memory credential table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityVerifier {
    /// user -> credential
    known: BTreeMap<String, String>,
}

impl IdentityVerifier {
    /// Build from a user to credential map
    pub fn new(known: BTreeMap<String, String>) -> Self {
        Self { known }
    }

    /// Built-in development credentials
    pub fn development() -> Self {
        Self::new(BTreeMap::from([
            ("alice".to_string(), "token-alice".to_string()),
            ("bob".to_string(), "token-bob".to_string()),
        ]))
    }

    /// Credential table from a policy document's `tokens` section
    pub fn from_document(document: &PolicyDocument) -> Self {
        if document.tokens.is_empty() {
            warn!("Policy document declares no tokens; using development credentials");
            return Self::development();
        }
        Self::new(document.tokens.clone())
    }

    /// Validate a presented credential
    pub fn validate(&self, credential: Option<&str>) -> IdentityResult {
        let credential = match credential {
            Some(c) if !c.is_empty() => c,
            _ => return IdentityResult::invalid(MISSING_CREDENTIAL),
        };

        self.known
            .iter()
            .find(|(_, expected)| expected.as_str() == credential)
            .map(|(user, _)| IdentityResult {
                user: Some(user.clone()),
                valid: true,
                reason: VALIDATED.to_string(),
            })
            .unwrap_or_else(|| IdentityResult::invalid(INVALID_CREDENTIAL))
    }

    /// Number of known credentials
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl Default for IdentityVerifier {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_known_credential() {
        let verifier = IdentityVerifier::development();
        let result = verifier.validate(Some("token-bob"));
        assert!(result.valid);
        assert_eq!(result.user.as_deref(), Some("bob"));
        assert_eq!(result.reason, VALIDATED);
    }

    #[test]
    fn test_missing_credential() {
        let verifier = IdentityVerifier::development();
        for credential in [None, Some("")] {
            let result = verifier.validate(credential);
            assert!(!result.valid);
            assert!(result.user.is_none());
            assert_eq!(result.reason, MISSING_CREDENTIAL);
        }
    }

    #[test]
    fn test_invalid_credential() {
        let verifier = IdentityVerifier::development();
        let result = verifier.validate(Some("TOKEN-ALICE"));
        assert!(!result.valid);
        assert_eq!(result.reason, INVALID_CREDENTIAL);
    }

    #[test]
    fn test_tokens_from_document() {
        let mut document = PolicyDocument::default();
        document.tokens.insert("carol".into(), "token-carol".into());

        let verifier = IdentityVerifier::from_document(&document);
        assert_eq!(verifier.len(), 1);
        assert_eq!(verifier.validate(Some("token-carol")).user.as_deref(), Some("carol"));
        assert!(!verifier.validate(Some("token-alice")).valid);
    }

    #[test]
    fn test_empty_tokens_fall_back_to_development() {
        let verifier = IdentityVerifier::from_document(&PolicyDocument::default());
        assert!(verifier.validate(Some("token-alice")).valid);
    }
}
