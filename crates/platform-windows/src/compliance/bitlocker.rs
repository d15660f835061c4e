//! BitLocker (disk encryption) check via `manage-bde -status`.

use posture::{DetectionOutcome, ElevationProbe, HostQuery};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::windows_cmd::{invoke, MANAGE_BDE_EXE};

const BITLOCKER_LABEL: &str = "BitLocker";

/// Protection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionStatus {
    On,
    Off,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStatus {
    FullyDecrypted,
    FullyEncrypted,
    InProgress,
    UsedSpaceOnly,
}

/// One `Volume X:` block of `manage-bde -status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitLockerVolume {
    pub volume: String,
    pub protection: ProtectionStatus,
    pub conversion: Option<ConversionStatus>,
}

impl BitLockerVolume {
    /// Protection is on and the data is encrypted. A volume whose conversion
    /// line could not be read is judged by protection alone.
    pub fn is_protected(&self) -> bool {
        self.protection == ProtectionStatus::On
            && matches!(
                self.conversion,
                None | Some(ConversionStatus::FullyEncrypted) | Some(ConversionStatus::UsedSpaceOnly)
            )
    }
}

pub(crate) fn manage_bde_status_command() -> String {
    invoke(MANAGE_BDE_EXE, "-status")
}

/// `manage-bde` needs administrative rights; without them the check reports
/// [`DetectionOutcome::PermissionDenied`] and the command is never run.
pub fn check_bitlocker(
    host: &impl HostQuery,
    elevation: &impl ElevationProbe,
) -> DetectionOutcome<String> {
    if !elevation.is_elevated() {
        info!("not elevated; skipping BitLocker status");
        return DetectionOutcome::PermissionDenied;
    }

    let volumes = parse_manage_bde_status(&host.shell(&manage_bde_status_command()));
    debug!(?volumes, "BitLocker volumes parsed");
    if volumes.iter().any(BitLockerVolume::is_protected) {
        DetectionOutcome::Detected(BITLOCKER_LABEL.to_string())
    } else {
        DetectionOutcome::NotDetected
    }
}

pub fn parse_manage_bde_status(output: &str) -> Vec<BitLockerVolume> {
    let mut volumes: Vec<BitLockerVolume> = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix("Volume ") {
            volumes.push(new_volume(name.split_whitespace().next().unwrap_or_default()));
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key != "Protection Status" && key != "Conversion Status" {
            continue;
        }
        if volumes.is_empty() {
            volumes.push(new_volume(""));
        }
        let Some(current) = volumes.last_mut() else {
            continue;
        };
        if key == "Protection Status" {
            current.protection = parse_protection_status(value);
        } else {
            current.conversion = parse_conversion_status(value);
        }
    }

    volumes
}

fn new_volume(name: &str) -> BitLockerVolume {
    BitLockerVolume {
        volume: name.to_string(),
        protection: ProtectionStatus::Unknown,
        conversion: None,
    }
}

fn parse_protection_status(raw: &str) -> ProtectionStatus {
    let raw = raw.trim();
    if raw.starts_with("Protection On") {
        ProtectionStatus::On
    } else if raw.starts_with("Protection Off") {
        ProtectionStatus::Off
    } else {
        ProtectionStatus::Unknown
    }
}

fn parse_conversion_status(raw: &str) -> Option<ConversionStatus> {
    match raw.trim() {
        "Fully Decrypted" => Some(ConversionStatus::FullyDecrypted),
        "Fully Encrypted" => Some(ConversionStatus::FullyEncrypted),
        "Used Space Only Encrypted" => Some(ConversionStatus::UsedSpaceOnly),
        s if s.contains("in Progress") || s.contains("In Progress") => {
            Some(ConversionStatus::InProgress)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use posture::test_support::FakeHost;
    use posture::{display_line, Control, DetectionOutcome};

    use super::*;
    use crate::elevation::StaticElevation;

    const STATUS_ON: &str = r"BitLocker Drive Encryption: Configuration Tool version 10.0.22621
Copyright (C) 2013 Microsoft Corporation. All rights reserved.

Disk volumes that can be protected with
BitLocker Drive Encryption:
Volume C: [Windows]
[OS Volume]

    Size:                 475.83 GB
    BitLocker Version:    2.0
    Conversion Status:    Used Space Only Encrypted
    Percentage Encrypted: 100.0%
    Encryption Method:    XTS-AES 128
    Protection Status:    Protection On
    Lock Status:          Unlocked

Volume D: [Data]
[Data Volume]

    Conversion Status:    Fully Decrypted
    Protection Status:    Protection Off
";

    #[test]
    fn parses_each_volume_block() {
        let volumes = parse_manage_bde_status(STATUS_ON);
        assert_eq!(
            volumes,
            vec![
                BitLockerVolume {
                    volume: "C:".to_string(),
                    protection: ProtectionStatus::On,
                    conversion: Some(ConversionStatus::UsedSpaceOnly),
                },
                BitLockerVolume {
                    volume: "D:".to_string(),
                    protection: ProtectionStatus::Off,
                    conversion: Some(ConversionStatus::FullyDecrypted),
                },
            ]
        );
    }

    #[test]
    fn protection_on_is_bitlocker() {
        let host = FakeHost::new().with_shell(&manage_bde_status_command(), STATUS_ON);
        assert_eq!(
            check_bitlocker(&host, &StaticElevation(true)),
            DetectionOutcome::Detected("BitLocker".to_string())
        );
    }

    #[test]
    fn protection_off_everywhere_is_not_detected() {
        let output = "Volume C: [OS]\n    Conversion Status:    Encryption in Progress\n    Protection Status:    Protection Off\n";
        let host = FakeHost::new().with_shell(&manage_bde_status_command(), output);
        assert_eq!(
            check_bitlocker(&host, &StaticElevation(true)),
            DetectionOutcome::NotDetected
        );
        assert_eq!(
            parse_manage_bde_status(output)[0].conversion,
            Some(ConversionStatus::InProgress)
        );
    }

    #[test]
    fn encryption_in_progress_is_not_detected_yet() {
        let output = "Volume C: [OS]\n    Conversion Status:    Encryption in Progress\n    Protection Status:    Protection On\n";
        let host = FakeHost::new().with_shell(&manage_bde_status_command(), output);
        assert_eq!(
            check_bitlocker(&host, &StaticElevation(true)),
            DetectionOutcome::NotDetected
        );

        let suspended = "Volume C: [OS]\n    Conversion Status:    Fully Encrypted\n    Protection Status:    Protection Off\n";
        let host = FakeHost::new().with_shell(&manage_bde_status_command(), suspended);
        assert_eq!(
            check_bitlocker(&host, &StaticElevation(true)),
            DetectionOutcome::NotDetected
        );
    }

    #[test]
    fn protection_on_without_conversion_line_is_bitlocker() {
        let output = "Volume C: [OS]\n    Protection Status:    Protection On\n";
        let host = FakeHost::new().with_shell(&manage_bde_status_command(), output);
        assert_eq!(
            check_bitlocker(&host, &StaticElevation(true)),
            DetectionOutcome::Detected("BitLocker".to_string())
        );
    }

    #[test]
    fn empty_output_is_not_detected() {
        let host = FakeHost::new();
        assert_eq!(
            check_bitlocker(&host, &StaticElevation(true)),
            DetectionOutcome::NotDetected
        );
    }

    #[test]
    fn without_elevation_reports_permission_denied() {
        let host = FakeHost::new().with_shell(&manage_bde_status_command(), STATUS_ON);
        let outcome = check_bitlocker(&host, &StaticElevation(false));

        assert_eq!(outcome, DetectionOutcome::PermissionDenied);
        assert!(host.shell_calls().is_empty());
        let line = display_line(Control::DiskEncryption, &outcome);
        assert!(line.contains("insufficient permissions"));
        assert!(!line.contains("not encrypted"));
    }
}
