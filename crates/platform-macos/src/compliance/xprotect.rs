//! Built-in malware protection (XProtect / MRT) check.

use posture::{DetectionOutcome, HostQuery};
use tracing::debug;

pub const XPROTECT_LABEL: &str = "XProtect/MRT (Built-in macOS protection)";

/// Evaluated in order; the first query with rows wins.
pub const XPROTECT_QUERIES: [&str; 4] = [
    "SELECT * FROM xprotect_entries;",
    "SELECT * FROM xprotect_meta;",
    "SELECT * FROM launchd WHERE name LIKE '%com.apple.MRT%' OR name LIKE '%com.apple.XProtect%';",
    "SELECT * FROM processes WHERE name LIKE '%MRT%' OR name LIKE '%XProtect%';",
];

pub fn check_xprotect(host: &impl HostQuery) -> DetectionOutcome<String> {
    for query in XPROTECT_QUERIES {
        let result = host.inventory(query);
        if !result.is_empty() {
            debug!(query, rows = result.len(), "built-in protection evidence found");
            return DetectionOutcome::Detected(XPROTECT_LABEL.to_string());
        }
    }
    DetectionOutcome::NotDetected
}
