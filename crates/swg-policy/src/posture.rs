//! Device posture evaluation

use swg_common::{DeviceContext, DevicePosture};

/// Minimum score for a trusted device unless configured otherwise
pub const DEFAULT_MINIMUM_SCORE: i64 = 70;
/// Score assumed when the device reports none
pub const DEFAULT_POSTURE_SCORE: i64 = 80;
/// Device id assumed when the device reports none
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Evaluates device context for Zero Trust decisions
///
/// Absent telemetry always yields a permissive posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTrust {
    minimum_score: i64,
}

impl DeviceTrust {
    /// Create with a minimum trusted score
    pub fn new(minimum_score: i64) -> Self {
        Self { minimum_score }
    }

    /// Configured minimum score
    pub fn minimum_score(&self) -> i64 {
        self.minimum_score
    }

    /// Evaluate device telemetry
    pub fn evaluate(&self, device: &DeviceContext) -> DevicePosture {
        let raw_healthy = device.healthy.unwrap_or(true);
        let posture_score = device.posture_score.unwrap_or(DEFAULT_POSTURE_SCORE);
        let device_id = device
            .device_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_DEVICE.to_string());

        DevicePosture {
            device_id,
            healthy: raw_healthy && posture_score >= self.minimum_score,
            posture_score,
        }
    }
}

impl Default for DeviceTrust {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_permissive() {
        let posture = DeviceTrust::default().evaluate(&DeviceContext::default());
        assert_eq!(posture.device_id, UNKNOWN_DEVICE);
        assert_eq!(posture.posture_score, DEFAULT_POSTURE_SCORE);
        assert!(posture.healthy);
    }

    #[test]
    fn test_low_score_is_unhealthy() {
        let device = DeviceContext {
            device_id: Some("laptop-1".into()),
            healthy: Some(true),
            posture_score: Some(69),
        };
        assert!(!DeviceTrust::default().evaluate(&device).healthy);
        assert!(DeviceTrust::new(60).evaluate(&device).healthy);
    }

    #[test]
    fn test_reported_unhealthy_wins() {
        let device = DeviceContext {
            healthy: Some(false),
            posture_score: Some(99),
            ..Default::default()
        };
        let posture = DeviceTrust::default().evaluate(&device);
        assert!(!posture.healthy);
        assert_eq!(posture.posture_score, 99);
    }
}
