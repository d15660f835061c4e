//! One posture audit pass: probe selection, detection and status lines.

use platform_linux::LinuxProbe;
use platform_macos::MacosProbe;
use platform_windows::{BatteryPolicy, WindowsProbe};
use posture::{
    display_line, Control, ElevationProbe, HostQuery, OsInfo, Platform, PostureOutcomes,
    PostureProbe,
};
use tracing::info;

use crate::system_info::{device_serial, os_info};

/// Everything learned about the host in one pass.
#[derive(Debug, Clone)]
pub struct AuditFindings {
    pub outcomes: PostureOutcomes,
    pub os: OsInfo,
    pub device_serial: Option<String>,
}

/// Pick the probe for `platform`. The elevation probe is only consulted on
/// Windows.
pub fn select_probe<'a, H, E>(
    platform: Platform,
    host: &'a H,
    elevation: E,
    battery_policy: BatteryPolicy,
) -> Box<dyn PostureProbe + 'a>
where
    H: HostQuery,
    E: ElevationProbe + 'a,
{
    match platform {
        Platform::MacOs => Box::new(MacosProbe::new(host)),
        Platform::Windows => {
            Box::new(WindowsProbe::new(host, elevation).with_battery_policy(battery_policy))
        }
        Platform::Linux => Box::new(LinuxProbe::new(host)),
    }
}

/// Run the three detectors and collect host metadata. Blocking.
pub fn run_audit<H, E>(
    platform: Platform,
    host: &H,
    elevation: E,
    battery_policy: BatteryPolicy,
) -> AuditFindings
where
    H: HostQuery,
    E: ElevationProbe,
{
    let probe = select_probe(platform, host, elevation, battery_policy);
    let outcomes = probe.collect();
    let os = os_info(platform, host);
    let device_serial = device_serial(platform, host);
    info!(
        platform = %platform,
        disk_encrypted = outcomes.disk_encryption.is_detected(),
        antivirus_detected = outcomes.antivirus.is_detected(),
        screen_lock_active = outcomes.screen_lock.is_detected(),
        "posture audit completed"
    );

    AuditFindings {
        outcomes,
        os,
        device_serial,
    }
}

/// Console lines in display order: antivirus, disk encryption, screen lock.
pub fn status_lines(outcomes: &PostureOutcomes) -> [String; 3] {
    [
        display_line(Control::Antivirus, &outcomes.antivirus),
        display_line(Control::DiskEncryption, &outcomes.disk_encryption),
        display_line(Control::ScreenLock, &outcomes.screen_lock),
    ]
}

#[cfg(test)]
mod tests {
    use platform_linux::compliance::antivirus::RUNNING_SERVICES;
    use platform_linux::compliance::luks::LSBLK_TYPES;
    use platform_linux::compliance::screen_lock::{gsettings_get, SESSION_DESKTOP_VAR};
    use platform_windows::StaticElevation;
    use posture::test_support::FakeHost;
    use posture::DetectionOutcome;

    use super::*;
    use crate::system_info::{LSB_RELEASE_ID, LSB_RELEASE_VERSION, LINUX_MACHINE_ID};

    fn linux_host() -> FakeHost {
        FakeHost::new()
            .with_shell(LSBLK_TYPES, "disk\npart\ncrypt\nlvm")
            .with_shell(
                RUNNING_SERVICES,
                "clamav-daemon.service loaded active running Clam AntiVirus userspace daemon",
            )
            .with_env(SESSION_DESKTOP_VAR, "ubuntu")
            .with_shell(&gsettings_get("gnome", "screensaver", "lock-enabled"), "true")
            .with_shell(&gsettings_get("gnome", "session", "idle-delay"), "uint32 300")
            .with_shell(&gsettings_get("gnome", "screensaver", "lock-delay"), "uint32 60")
            .with_shell(LSB_RELEASE_ID, "Ubuntu")
            .with_shell(LSB_RELEASE_VERSION, "24.04")
            .with_shell(LINUX_MACHINE_ID, "0f3c2a")
    }

    #[test]
    fn linux_audit_collects_outcomes_and_metadata() {
        let host = linux_host();
        let findings = run_audit(Platform::Linux, &host, StaticElevation(false), BatteryPolicy::Max);

        assert_eq!(
            findings.outcomes.disk_encryption,
            DetectionOutcome::Detected("LUKS".to_string())
        );
        assert!(findings.outcomes.antivirus.is_detected());
        assert_eq!(findings.outcomes.screen_lock, DetectionOutcome::Detected(6.0));
        assert_eq!(findings.os.name, "Linux | Ubuntu");
        assert_eq!(findings.os.version, "24.04");
        assert_eq!(findings.device_serial.as_deref(), Some("0f3c2a"));
    }

    #[test]
    fn windows_probe_honors_elevation() {
        let host = FakeHost::new();
        let probe = select_probe(Platform::Windows, &host, StaticElevation(false), BatteryPolicy::Max);
        assert_eq!(probe.platform(), Platform::Windows);
        assert_eq!(probe.disk_encryption(), DetectionOutcome::PermissionDenied);
    }

    #[test]
    fn probe_matches_platform() {
        let host = FakeHost::new();
        for platform in [Platform::MacOs, Platform::Windows, Platform::Linux] {
            let probe = select_probe(platform, &host, StaticElevation(true), BatteryPolicy::Min);
            assert_eq!(probe.platform(), platform);
        }
    }

    #[test]
    fn status_lines_follow_console_order() {
        let outcomes = PostureOutcomes {
            disk_encryption: DetectionOutcome::NotDetected,
            antivirus: DetectionOutcome::Detected("ClamAV".to_string()),
            screen_lock: DetectionOutcome::Detected(5.0),
        };
        let lines = status_lines(&outcomes);
        assert!(lines[0].contains("ClamAV"));
        assert_eq!(lines[1], "❌ Disk is not encrypted.");
        assert!(lines[2].contains("5 minutes"));
    }
}
