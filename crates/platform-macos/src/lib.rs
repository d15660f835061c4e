//! Platform-macos crate: macOS posture probe.
//!
//! Answers the three posture questions from osquery tables and the stock
//! macOS administration tools (`fdesetup`, `sysadminctl`, `defaults`,
//! `pmset`). Every lookup goes through a [`HostQuery`] so the detectors can
//! be exercised against scripted output.

pub mod compliance;

use posture::{DetectionOutcome, HostQuery, Platform, PostureProbe};

pub use compliance::filevault::check_filevault;
pub use compliance::screen_lock::check_screen_lock;
pub use compliance::xprotect::{check_xprotect, XPROTECT_LABEL};

/// [`PostureProbe`] for macOS hosts.
#[derive(Debug, Clone)]
pub struct MacosProbe<H> {
    host: H,
}

impl<H: HostQuery> MacosProbe<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: HostQuery> PostureProbe for MacosProbe<H> {
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    fn disk_encryption(&self) -> DetectionOutcome<String> {
        check_filevault(&self.host)
    }

    fn antivirus(&self) -> DetectionOutcome<String> {
        check_xprotect(&self.host)
    }

    fn screen_lock(&self) -> DetectionOutcome<f64> {
        check_screen_lock(&self.host)
    }
}
