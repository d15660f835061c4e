//! Block-device and filesystem encryption check.

use posture::{DetectionOutcome, HostQuery};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const LSBLK_TYPES: &str = "lsblk -n -o TYPE";
pub const PROC_MOUNTS: &str = "cat /proc/mounts";

const LUKS_LABEL: &str = "LUKS";
const ECRYPTFS_LABEL: &str = "eCryptfs";

/// One `/proc/mounts` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    pub source: String,
    pub target: String,
    pub fstype: String,
}

/// Detected as LUKS when `lsblk` lists a `crypt` device, or as eCryptfs when
/// an ecryptfs filesystem is mounted. When `lsblk` yields nothing at all the
/// root filesystem's device-mapper name is used as a last hint.
pub fn check_luks(host: &impl HostQuery) -> DetectionOutcome<String> {
    let lsblk = host.shell(LSBLK_TYPES);
    if has_crypt_device(&lsblk) {
        return DetectionOutcome::Detected(LUKS_LABEL.to_string());
    }

    let mounts = parse_mounts(&host.shell(PROC_MOUNTS));
    if mounts.iter().any(|m| m.fstype == "ecryptfs") {
        return DetectionOutcome::Detected(ECRYPTFS_LABEL.to_string());
    }

    if lsblk.is_empty() && root_on_encrypted_mapper(&mounts) {
        debug!("lsblk unavailable; root filesystem sits on an encrypted mapper device");
        return DetectionOutcome::Detected(LUKS_LABEL.to_string());
    }

    DetectionOutcome::NotDetected
}

pub fn has_crypt_device(lsblk: &str) -> bool {
    lsblk.lines().any(|line| line.trim() == "crypt")
}

pub fn parse_mounts(raw: &str) -> Vec<MountEntry> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            Some(MountEntry {
                source: fields.next()?.to_string(),
                target: fields.next()?.to_string(),
                fstype: fields.next()?.to_string(),
            })
        })
        .collect()
}

fn root_on_encrypted_mapper(mounts: &[MountEntry]) -> bool {
    mounts.iter().filter(|m| m.target == "/").any(|m| {
        let source = m.source.to_ascii_lowercase();
        source.starts_with("/dev/mapper/") && (source.contains("crypt") || source.contains("luks"))
    })
}

#[cfg(test)]
mod tests {
    use posture::test_support::FakeHost;
    use posture::DetectionOutcome;

    use super::*;

    #[test]
    fn crypt_row_is_luks() {
        let host = FakeHost::new().with_shell(LSBLK_TYPES, "disk\npart\npart\ncrypt\nlvm\nlvm");
        assert_eq!(check_luks(&host), DetectionOutcome::Detected("LUKS".to_string()));
        assert_eq!(host.shell_calls(), vec![LSBLK_TYPES.to_string()]);
    }

    #[test]
    fn plain_partitions_are_not_detected() {
        let host = FakeHost::new()
            .with_shell(LSBLK_TYPES, "disk\npart\npart\nrom")
            .with_shell(PROC_MOUNTS, "/dev/sda2 / ext4 rw,relatime 0 0");
        assert_eq!(check_luks(&host), DetectionOutcome::NotDetected);
    }

    #[test]
    fn crypt_must_be_a_whole_type_value() {
        assert!(!has_crypt_device("disk\ncryptfs-like\n"));
        assert!(has_crypt_device("disk\n  crypt  \n"));
    }

    #[test]
    fn ecryptfs_mount_is_detected() {
        let host = FakeHost::new()
            .with_shell(LSBLK_TYPES, "disk\npart")
            .with_shell(
                PROC_MOUNTS,
                "/dev/sda1 / ext4 rw 0 0\n/home/.ecryptfs/alice/.Private /home/alice ecryptfs rw 0 0",
            );
        assert_eq!(
            check_luks(&host),
            DetectionOutcome::Detected("eCryptfs".to_string())
        );
    }

    #[test]
    fn mapper_root_counts_only_without_lsblk() {
        let mounts = "/dev/mapper/luks-5f1c2a / btrfs rw 0 0\n";
        let host = FakeHost::new().with_shell(PROC_MOUNTS, mounts);
        assert_eq!(check_luks(&host), DetectionOutcome::Detected("LUKS".to_string()));

        let host = FakeHost::new()
            .with_shell(LSBLK_TYPES, "disk\npart\nlvm")
            .with_shell(PROC_MOUNTS, mounts);
        assert_eq!(check_luks(&host), DetectionOutcome::NotDetected);
    }
}
