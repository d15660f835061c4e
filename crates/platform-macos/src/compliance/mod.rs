//! macOS posture checks.
//!
//! FileVault for disk encryption, XProtect/MRT for antivirus and the
//! screen saver / display sleep / lock delay combination for screen lock.

pub mod filevault;
pub mod screen_lock;
pub mod xprotect;
