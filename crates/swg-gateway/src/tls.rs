//! TLS metadata inspection without interception
//!
//! No handshake is observed; the inspector reports the server name it is
//! given and the protocol parameters a modern client would negotiate.

use swg_common::TlsMetadata;

/// Version reported when none is known
pub const DEFAULT_TLS_VERSION: &str = "TLSv1.3";
/// Cipher suite always reported
pub const DEFAULT_CIPHER_SUITE: &str = "TLS_AES_256_GCM_SHA384";

/// Stub TLS inspector
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsInspector;

impl TlsInspector {
    /// Metadata for a connection to `server_name`
    pub fn inspect(&self, server_name: &str, tls_version: Option<&str>) -> TlsMetadata {
        TlsMetadata {
            server_name: server_name.to_string(),
            tls_version: tls_version.unwrap_or(DEFAULT_TLS_VERSION).to_string(),
            cipher_suite: DEFAULT_CIPHER_SUITE.to_string(),
        }
    }
}
