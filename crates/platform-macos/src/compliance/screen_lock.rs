//! Screen lock check.
//!
//! The effective timeout is the longest of the screen saver idle time and
//! the display sleep timers (battery and AC), plus the password delay that
//! `sysadminctl` reports once the screen saver or display sleep engages.

use posture::{DetectionOutcome, HostQuery};
use tracing::debug;

pub(crate) const SCREEN_LOCK_STATUS: &str = "sysadminctl -screenLock status 2>&1";
pub(crate) const SCREENSAVER_IDLE_TIME: &str =
    "defaults -currentHost read com.apple.screensaver idleTime";
pub(crate) const PMSET_CUSTOM: &str = "pmset -g custom";

const BATTERY_SECTION: &str = "Battery Power";
const AC_SECTION: &str = "AC Power";

/// Password delay reported by `sysadminctl -screenLock status`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LockDelay {
    Off,
    Immediate,
    Seconds(u32),
    Unrecognized,
}

pub fn check_screen_lock(host: &impl HostQuery) -> DetectionOutcome<f64> {
    let status = host.shell(SCREEN_LOCK_STATUS);
    let delay = parse_lock_delay(&status);
    let delay_minutes = match delay {
        LockDelay::Immediate => 0.0,
        LockDelay::Seconds(secs) => f64::from(secs) / 60.0,
        LockDelay::Off | LockDelay::Unrecognized => {
            debug!(status = %status, "screen lock disabled or status unreadable");
            return DetectionOutcome::NotDetected;
        }
    };

    let screensaver = parse_number(&host.shell(SCREENSAVER_IDLE_TIME)).map(|secs| secs / 60.0);
    let pmset = host.shell(PMSET_CUSTOM);
    let on_battery = display_sleep_minutes(&pmset, BATTERY_SECTION);
    let on_ac = display_sleep_minutes(&pmset, AC_SECTION);
    debug!(?screensaver, ?on_battery, ?on_ac, ?delay, "screen lock inputs");

    let Some(base) = [screensaver, on_battery, on_ac]
        .into_iter()
        .flatten()
        .reduce(f64::max)
    else {
        return DetectionOutcome::NotDetected;
    };

    DetectionOutcome::from_minutes(base + delay_minutes)
}

pub fn parse_lock_delay(status: &str) -> LockDelay {
    if status.contains("screenLock is off") {
        return LockDelay::Off;
    }

    let Some((_, rest)) = status.split_once("screenLock delay is ") else {
        return LockDelay::Unrecognized;
    };
    let rest = rest.trim_start();
    if rest.starts_with("immediate") {
        return LockDelay::Immediate;
    }

    let mut words = rest.split_whitespace();
    match (words.next().map(str::parse::<u32>), words.next()) {
        (Some(Ok(secs)), Some(unit)) if unit.starts_with("second") => LockDelay::Seconds(secs),
        _ => LockDelay::Unrecognized,
    }
}

/// `displaysleep` value (minutes) inside the named `pmset -g custom` section.
pub fn display_sleep_minutes(pmset: &str, section: &str) -> Option<f64> {
    let mut in_section = false;
    for line in pmset.lines() {
        let trimmed = line.trim();
        if trimmed.ends_with(':') {
            in_section = trimmed.trim_end_matches(':') == section;
            continue;
        }
        if !in_section {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        if fields.next() == Some("displaysleep") {
            return fields.next().and_then(parse_number);
        }
    }
    None
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
