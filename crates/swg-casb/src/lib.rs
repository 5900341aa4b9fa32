//! OpenSASE SWG CASB - cloud application visibility
//!
//! Two independent lookups: `CloudAppDetector` names the managed app a
//! domain belongs to, and `ActivityRules` flags URLs that match forbidden
//! activity patterns. The gateway combines them into one CASB action.

#![warn(missing_docs)]

pub mod activity;
pub mod detector;

pub use activity::{evaluate_activity, ActivityRules, ForbiddenActivity};
pub use detector::{AppDetection, CloudApp, CloudAppDetector, NO_CLOUD_APP};

use swg_common::{CasbAction, CasbSummary};

/// Combine app detection and activity violations into the audit summary
///
/// Any violation blocks; otherwise the detector's action stands.
pub fn summarize(detection: &AppDetection, violations: Vec<String>) -> CasbSummary {
    let action = if violations.is_empty() {
        detection.action
    } else {
        CasbAction::Block
    };

    CasbSummary {
        app: detection.app.clone(),
        violations,
        action,
    }
}
