//! Cloud application detector

use swg_common::CasbAction;
use tracing::debug;

/// Reason when no app matches
pub const NO_CLOUD_APP: &str = "No cloud app detected";

/// One managed application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudApp {
    /// Substring looked for in the domain
    pub pattern: String,
    /// Display name
    pub name: String,
}

impl CloudApp {
    /// Create app entry
    pub fn new(pattern: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            name: name.into(),
        }
    }
}

/// Detection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDetection {
    /// Matched app, if any
    pub app: Option<String>,
    /// `review` for uploads to a known app, else `allow`
    pub action: CasbAction,
    /// Human-readable reason
    pub reason: String,
}

/// Ordered app table; the first entry whose pattern occurs in the domain wins
#[derive(Debug, Clone)]
pub struct CloudAppDetector {
    apps: Vec<CloudApp>,
}

impl Default for CloudAppDetector {
    fn default() -> Self {
        Self::new(vec![
            CloudApp::new("dropbox.com", "Dropbox"),
            CloudApp::new("drive.google.com", "Google Drive"),
            CloudApp::new("onedrive.live.com", "OneDrive"),
            CloudApp::new("box.com", "Box"),
        ])
    }
}

impl CloudAppDetector {
    /// Create detector from an ordered table
    pub fn new(apps: Vec<CloudApp>) -> Self {
        Self { apps }
    }

    /// Detect the app for a destination
    pub fn detect(&self, domain: &str, path: &str) -> AppDetection {
        let Some(app) = self.apps.iter().find(|app| domain.contains(app.pattern.as_str())) else {
            return AppDetection {
                app: None,
                action: CasbAction::Allow,
                reason: NO_CLOUD_APP.to_string(),
            };
        };

        let action = if path.to_lowercase().contains("upload") {
            CasbAction::Review
        } else {
            CasbAction::Allow
        };
        debug!(domain, app = %app.name, %action, "Cloud app detected");

        AppDetection {
            app: Some(app.name.clone()),
            action,
            reason: format!("Traffic matched {}", app.name),
        }
    }

    /// Number of known apps
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
