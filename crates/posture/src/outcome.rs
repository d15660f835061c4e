use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of a single posture detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DetectionOutcome<T> {
    Detected(T),
    NotDetected,
    /// The host refused the query for lack of privileges.
    PermissionDenied,
}

impl<T> DetectionOutcome<T> {
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Detected(value) => Some(value),
            Self::NotDetected | Self::PermissionDenied => None,
        }
    }
}

impl DetectionOutcome<String> {
    /// Detected when the label is non-blank.
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            Self::NotDetected
        } else {
            Self::Detected(trimmed.to_string())
        }
    }
}

impl DetectionOutcome<f64> {
    /// Detected for a positive, finite number of minutes.
    ///
    /// Zero means the lock never engages and is reported as not detected.
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes.is_finite() && minutes > 0.0 {
            Self::Detected(minutes)
        } else {
            Self::NotDetected
        }
    }

    pub fn from_seconds(seconds: f64) -> Self {
        Self::from_minutes(seconds / 60.0)
    }
}

/// The security controls the auditor checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    DiskEncryption,
    Antivirus,
    ScreenLock,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiskEncryption => write!(f, "disk encryption"),
            Self::Antivirus => write!(f, "antivirus"),
            Self::ScreenLock => write!(f, "screen lock"),
        }
    }
}

/// Outcomes of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureOutcomes {
    pub disk_encryption: DetectionOutcome<String>,
    pub antivirus: DetectionOutcome<String>,
    pub screen_lock: DetectionOutcome<f64>,
}
