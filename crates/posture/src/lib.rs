//! Posture crate: host security-posture model shared by the platform probes.
//!
//! Provides the detection outcome model, the host query adapter
//! (`HostQuery` / `SystemQuery`), the report payload and the console
//! presenter. Platform crates (`platform-macos`, `platform-windows`,
//! `platform-linux`) implement [`PostureProbe`] on top of this crate.

pub mod outcome;
pub mod query;
pub mod report;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use outcome::{Control, DetectionOutcome, PostureOutcomes};
pub use query::{run_with_timeout, HostQuery, QueryOptions, QueryResult, Row, ShellCommand, SystemQuery};
pub use report::{display_line, format_minutes, rfc3339_utc, DisplayValue, OsInfo, SecurityReport};

#[derive(Debug)]
pub enum PostureError {
    UnsupportedPlatform(String),
    NoShellAvailable,
}

impl fmt::Display for PostureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPlatform(os) => write!(f, "unsupported operating system: {}", os),
            Self::NoShellAvailable => write!(
                f,
                "no capable command shell available (PowerShell is required on Windows)"
            ),
        }
    }
}

impl std::error::Error for PostureError {}

pub type Result<T> = std::result::Result<T, PostureError>;

/// Host operating system family. Resolved once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "macos")]
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name to a supported platform.
    pub fn from_os(os: &str) -> Result<Self> {
        match os.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" => Ok(Self::MacOs),
            "windows" | "win32" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            other => Err(PostureError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macOS"),
            Self::Windows => write!(f, "Windows"),
            Self::Linux => write!(f, "Linux"),
        }
    }
}

/// Per-platform posture detection capability.
///
/// One implementation exists per supported platform; the caller selects it
/// once from the resolved [`Platform`] and then runs each detector once.
pub trait PostureProbe {
    fn platform(&self) -> Platform;

    fn disk_encryption(&self) -> DetectionOutcome<String>;

    fn antivirus(&self) -> DetectionOutcome<String>;

    /// Effective idle time before the screen locks, in minutes.
    fn screen_lock(&self) -> DetectionOutcome<f64>;

    /// Run the three detectors sequentially.
    fn collect(&self) -> PostureOutcomes {
        let disk_encryption = self.disk_encryption();
        tracing::debug!(platform = %self.platform(), outcome = ?disk_encryption, "disk encryption checked");
        let antivirus = self.antivirus();
        tracing::debug!(platform = %self.platform(), outcome = ?antivirus, "antivirus checked");
        let screen_lock = self.screen_lock();
        tracing::debug!(platform = %self.platform(), outcome = ?screen_lock, "screen lock checked");

        PostureOutcomes {
            disk_encryption,
            antivirus,
            screen_lock,
        }
    }
}

/// Reports whether the current process holds administrative rights.
pub trait ElevationProbe {
    fn is_elevated(&self) -> bool;
}
