//! Screen lock check from the desktop environment's gsettings schema.

use posture::{DetectionOutcome, HostQuery};
use tracing::debug;

pub const SESSION_DESKTOP_VAR: &str = "XDG_SESSION_DESKTOP";
pub const CURRENT_DESKTOP_VAR: &str = "XDG_CURRENT_DESKTOP";

/// Session names that use the GNOME settings schema.
const GNOME_ALIASES: [&str; 6] = [
    "ubuntu",
    "ubuntu-wayland",
    "ubuntu-xorg",
    "gnome-xorg",
    "gnome-wayland",
    "pop",
];

/// Desktop id used in the `org.<desktop>.desktop` schema, lowercase.
pub fn resolve_desktop(host: &impl HostQuery) -> Option<String> {
    let raw = host.env_var(SESSION_DESKTOP_VAR).or_else(|| {
        host.env_var(CURRENT_DESKTOP_VAR)
            .and_then(|v| v.split(':').next().map(str::to_string))
    })?;
    normalize_desktop(&raw)
}

pub fn normalize_desktop(raw: &str) -> Option<String> {
    let desktop = raw.trim().to_ascii_lowercase();
    if desktop.is_empty()
        || !desktop
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    if GNOME_ALIASES.contains(&desktop.as_str()) {
        Some("gnome".to_string())
    } else {
        Some(desktop)
    }
}

pub fn gsettings_get(desktop: &str, schema: &str, key: &str) -> String {
    format!("gsettings get org.{}.desktop.{} {}", desktop, schema, key)
}

/// Effective lock timeout in minutes: idle delay plus lock delay.
pub fn check_screen_lock(host: &impl HostQuery) -> DetectionOutcome<f64> {
    let Some(desktop) = resolve_desktop(host) else {
        debug!("no desktop session; screen lock not applicable");
        return DetectionOutcome::NotDetected;
    };

    let lock_enabled = host.shell(&gsettings_get(&desktop, "screensaver", "lock-enabled"));
    if lock_enabled != "true" {
        debug!(desktop = %desktop, lock_enabled = %lock_enabled, "screen lock disabled");
        return DetectionOutcome::NotDetected;
    }

    let idle_secs = parse_gsettings_uint(&host.shell(&gsettings_get(&desktop, "session", "idle-delay")))
        .unwrap_or(0);
    // idle-delay 0 never blanks the session, so the lock delay never starts.
    if idle_secs == 0 {
        return DetectionOutcome::NotDetected;
    }
    let lock_secs =
        parse_gsettings_uint(&host.shell(&gsettings_get(&desktop, "screensaver", "lock-delay")))
            .unwrap_or(0);
    debug!(desktop = %desktop, idle_secs, lock_secs, "gsettings delays");

    DetectionOutcome::from_seconds(f64::from(idle_secs) + f64::from(lock_secs))
}

/// Value of a GVariant uint such as `uint32 300` or a bare `300`.
pub fn parse_gsettings_uint(raw: &str) -> Option<u32> {
    raw.split_whitespace().last()?.parse().ok()
}
