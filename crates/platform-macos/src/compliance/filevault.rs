//! FileVault (disk encryption) check.

use posture::{DetectionOutcome, HostQuery};
use tracing::debug;

pub const DISK_ENCRYPTION_QUERY: &str = "SELECT * FROM disk_encryption;";
pub(crate) const FDESETUP_STATUS: &str = "fdesetup status";

const FILEVAULT_LABEL: &str = "FileVault";

/// Detected when any `disk_encryption` row reports `encrypted = 1`.
///
/// `fdesetup status` is consulted only when the inventory returned no rows
/// at all, i.e. osquery is unavailable on the host.
pub fn check_filevault(host: &impl HostQuery) -> DetectionOutcome<String> {
    let result = host.inventory(DISK_ENCRYPTION_QUERY);
    if !result.is_empty() {
        let encrypted = result.column("encrypted").any(is_encrypted_flag);
        debug!(volumes = result.len(), encrypted, "disk_encryption rows inspected");
        return encrypted_outcome(encrypted);
    }

    let status = host.shell(FDESETUP_STATUS);
    debug!(status = %status, "falling back to fdesetup");
    encrypted_outcome(fdesetup_reports_on(&status))
}

fn encrypted_outcome(encrypted: bool) -> DetectionOutcome<String> {
    if encrypted {
        DetectionOutcome::Detected(FILEVAULT_LABEL.to_string())
    } else {
        DetectionOutcome::NotDetected
    }
}

fn is_encrypted_flag(raw: &str) -> bool {
    raw.trim().parse::<i64>().map(|v| v == 1).unwrap_or(false)
}

fn fdesetup_reports_on(status: &str) -> bool {
    status
        .lines()
        .any(|line| line.trim().starts_with("FileVault is On"))
}
