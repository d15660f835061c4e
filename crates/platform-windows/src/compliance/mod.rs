//! Windows posture checks.
//!
//! BitLocker for disk encryption, Security Center for antivirus and the
//! active power scheme for screen lock.

pub mod bitlocker;
pub mod registry;
pub mod screen_lock;
pub mod security_center;
