//! Report payload and console presentation.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::outcome::{Control, DetectionOutcome, PostureOutcomes};

/// OS family name and version, embedded into the report unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
}

/// Flat record uploaded to the report sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub disk_encrypted: bool,
    pub encryption_type: Option<String>,
    pub antivirus_detected: bool,
    pub antivirus_name: Option<String>,
    pub screen_lock_active: bool,
    pub screen_lock_time: Option<f64>,
    pub operating_system: String,
    pub os_version: String,
    pub last_check: String,
}

impl SecurityReport {
    /// Build the payload from detector outcomes. Total: never fails.
    pub fn from_outcomes(outcomes: &PostureOutcomes, os: &OsInfo, checked_at: SystemTime) -> Self {
        Self {
            disk_encrypted: outcomes.disk_encryption.is_detected(),
            encryption_type: outcomes.disk_encryption.value().cloned(),
            antivirus_detected: outcomes.antivirus.is_detected(),
            antivirus_name: outcomes.antivirus.value().cloned(),
            screen_lock_active: outcomes.screen_lock.is_detected(),
            screen_lock_time: outcomes.screen_lock.value().copied(),
            operating_system: os.name.clone(),
            os_version: os.version.clone(),
            last_check: rfc3339_utc(checked_at),
        }
    }
}

/// Human-readable status line for one control.
pub fn display_line<T: DisplayValue>(control: Control, outcome: &DetectionOutcome<T>) -> String {
    match outcome {
        DetectionOutcome::PermissionDenied => {
            format!("⚠️ Unable to check {}: insufficient permissions.", control)
        }
        DetectionOutcome::NotDetected => match control {
            Control::DiskEncryption => "❌ Disk is not encrypted.".to_string(),
            Control::Antivirus => "❌ No antivirus detected.".to_string(),
            Control::ScreenLock => "❌ Screen lock is not configured or is disabled.".to_string(),
        },
        DetectionOutcome::Detected(value) => match control {
            Control::DiskEncryption => {
                format!("✅ Disk is encrypted with {}.", value.display_value())
            }
            Control::Antivirus => {
                format!("✅ Antivirus protection detected: {}", value.display_value())
            }
            Control::ScreenLock => format!(
                "✅ Screen lock activates after {} minutes of inactivity.",
                value.display_value()
            ),
        },
    }
}

/// Rendering of a detected value inside a status line.
pub trait DisplayValue {
    fn display_value(&self) -> String;
}

impl DisplayValue for String {
    fn display_value(&self) -> String {
        self.clone()
    }
}

impl DisplayValue for f64 {
    fn display_value(&self) -> String {
        format_minutes(*self)
    }
}

/// Minutes with at most two decimals and no trailing zeros.
pub fn format_minutes(minutes: f64) -> String {
    let rendered = format!("{:.2}", minutes);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    if rendered.is_empty() || rendered == "-" {
        "0".to_string()
    } else {
        rendered.to_string()
    }
}

/// Format a timestamp as RFC 3339 UTC with millisecond precision.
pub fn rfc3339_utc(at: SystemTime) -> String {
    let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs() as i64;
    let millis = since_epoch.subsec_millis();

    const SECS_PER_DAY: i64 = 86400;
    let days = secs / SECS_PER_DAY;
    let secs_of_day = secs % SECS_PER_DAY;

    // Civil-from-days, https://howardhinnant.github.io/date_algorithms.html
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        y,
        m,
        d,
        secs_of_day / 3600,
        (secs_of_day % 3600) / 60,
        secs_of_day % 60,
        millis
    )
}
