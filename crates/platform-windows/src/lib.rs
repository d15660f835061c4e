//! Platform-windows crate: Windows posture probe.
//!
//! Detectors run through PowerShell (`HostQuery::shell`) and osquery.
//! BitLocker status requires administrative rights, which are checked with
//! an [`ElevationProbe`] before `manage-bde` is invoked.

pub mod compliance;
pub mod elevation;
mod windows_cmd;

use posture::{DetectionOutcome, ElevationProbe, HostQuery, Platform, PostureProbe};

pub use compliance::bitlocker::check_bitlocker;
pub use compliance::screen_lock::{check_screen_lock, BatteryPolicy};
pub use compliance::security_center::check_security_center;
pub use elevation::{NetSessionProbe, StaticElevation};

/// [`PostureProbe`] for Windows hosts.
#[derive(Debug, Clone)]
pub struct WindowsProbe<H, E> {
    host: H,
    elevation: E,
    battery_policy: BatteryPolicy,
}

impl<H: HostQuery, E: ElevationProbe> WindowsProbe<H, E> {
    pub fn new(host: H, elevation: E) -> Self {
        Self {
            host,
            elevation,
            battery_policy: BatteryPolicy::default(),
        }
    }

    pub fn with_battery_policy(mut self, policy: BatteryPolicy) -> Self {
        self.battery_policy = policy;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: HostQuery, E: ElevationProbe> PostureProbe for WindowsProbe<H, E> {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn disk_encryption(&self) -> DetectionOutcome<String> {
        check_bitlocker(&self.host, &self.elevation)
    }

    fn antivirus(&self) -> DetectionOutcome<String> {
        check_security_center(&self.host)
    }

    fn screen_lock(&self) -> DetectionOutcome<f64> {
        check_screen_lock(&self.host, self.battery_policy)
    }
}

#[cfg(test)]
mod tests {
    use posture::test_support::FakeHost;
    use posture::{DetectionOutcome, PostureProbe};

    use super::{BatteryPolicy, StaticElevation, WindowsProbe};
    use crate::compliance::security_center::CIM_ANTIVIRUS_PRODUCTS;

    #[test]
    fn unelevated_run_still_checks_other_controls() {
        let host = FakeHost::new().with_shell(CIM_ANTIVIRUS_PRODUCTS, "Windows Defender");
        let probe = WindowsProbe::new(host, StaticElevation(false))
            .with_battery_policy(BatteryPolicy::Min);

        let outcomes = probe.collect();

        assert_eq!(outcomes.disk_encryption, DetectionOutcome::PermissionDenied);
        assert_eq!(
            outcomes.antivirus,
            DetectionOutcome::Detected("Windows Defender".to_string())
        );
        assert_eq!(outcomes.screen_lock, DetectionOutcome::NotDetected);
        assert_eq!(probe.host().shell_calls()[0], CIM_ANTIVIRUS_PRODUCTS);
    }
}
