//! Linux posture checks.

pub mod antivirus;
pub mod luks;
pub mod screen_lock;
