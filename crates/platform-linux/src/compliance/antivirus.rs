//! Running antivirus services, matched against known vendor names.

use aho_corasick::AhoCorasick;
use posture::{DetectionOutcome, HostQuery};
use tracing::{debug, warn};

pub const RUNNING_SERVICES: &str =
    "systemctl list-units --type=service --state=running --no-legend --no-pager --plain";

pub const VENDOR_PATTERNS: [&str; 10] = [
    "clamav",
    "sophos",
    "eset",
    "comodo",
    "avg",
    "avast",
    "bitdefender",
    "falcon-sensor",
    "mdatp",
    "sentinelone",
];

/// UNIT LOAD ACTIVE SUB precede the description in `systemctl` output.
const LEADING_COLUMNS: usize = 4;

pub fn check_antivirus(host: &impl HostQuery) -> DetectionOutcome<String> {
    let matcher = match AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(VENDOR_PATTERNS)
    {
        Ok(matcher) => matcher,
        Err(err) => {
            warn!(error = %err, "failed to build antivirus vendor matcher");
            return DetectionOutcome::NotDetected;
        }
    };

    let services = matching_services(&matcher, &host.shell(RUNNING_SERVICES));
    debug!(?services, "antivirus services running");
    DetectionOutcome::from_label(services.join(", "))
}

fn matching_services(matcher: &AhoCorasick, listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| matcher.is_match(line))
        .filter_map(service_description)
        .collect()
}

/// Description column of a `systemctl list-units --plain` row, or the unit
/// name when the description is empty.
pub fn service_description(line: &str) -> Option<String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.len() {
        0 => None,
        n if n > LEADING_COLUMNS => Some(fields[LEADING_COLUMNS..].join(" ")),
        _ => Some(fields[0].to_string()),
    }
}
