//! Platform-linux crate: Linux posture probe.
//!
//! Disk encryption comes from `lsblk` and the mount table, antivirus from
//! the running systemd services and screen lock from the session's
//! gsettings schema.

pub mod compliance;

use posture::{DetectionOutcome, HostQuery, Platform, PostureProbe};

pub use compliance::antivirus::check_antivirus;
pub use compliance::luks::check_luks;
pub use compliance::screen_lock::check_screen_lock;

/// [`PostureProbe`] for Linux hosts.
#[derive(Debug, Clone)]
pub struct LinuxProbe<H> {
    host: H,
}

impl<H: HostQuery> LinuxProbe<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: HostQuery> PostureProbe for LinuxProbe<H> {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn disk_encryption(&self) -> DetectionOutcome<String> {
        check_luks(&self.host)
    }

    fn antivirus(&self) -> DetectionOutcome<String> {
        check_antivirus(&self.host)
    }

    fn screen_lock(&self) -> DetectionOutcome<f64> {
        check_screen_lock(&self.host)
    }
}
