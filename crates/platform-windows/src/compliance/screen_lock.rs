//! Screen lock check from the active power scheme's display idle timeout.

use std::fmt;
use std::str::FromStr;

use posture::{DetectionOutcome, HostQuery};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::registry::read_reg_dword;
use crate::windows_cmd::{invoke, POWERCFG_EXE};

pub(crate) const UI_CULTURE: &str = "$PSUICulture";
pub(crate) const BATTERY_QUERY: &str =
    "Get-CimInstance -ClassName Win32_Battery -ErrorAction SilentlyContinue";

const POLICY_HIVE: &str = "HKLM";
const POLICY_KEY: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\System";
const INACTIVITY_TIMEOUT_VALUE: &str = "InactivityTimeoutSecs";

/// Localized labels of the `powercfg /q` index lines: (language, AC, DC).
const INDEX_PATTERNS: [(&str, &str, &str); 2] = [
    (
        "en",
        "Current AC Power Setting Index",
        "Current DC Power Setting Index",
    ),
    (
        "es",
        "Índice de configuración de corriente alterna actual",
        "Índice de configuración de corriente continua actual",
    ),
];

/// How AC and battery timeouts combine on hosts with a battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryPolicy {
    /// Longer of the two timeouts.
    #[default]
    Max,
    /// Shorter of the two timeouts.
    Min,
}

impl BatteryPolicy {
    pub fn combine(self, ac_secs: u32, dc_secs: u32) -> u32 {
        match self {
            Self::Max => ac_secs.max(dc_secs),
            Self::Min => ac_secs.min(dc_secs),
        }
    }
}

impl FromStr for BatteryPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            other => Err(format!("unknown battery policy '{}'", other)),
        }
    }
}

impl fmt::Display for BatteryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::Min => write!(f, "min"),
        }
    }
}

/// AC and DC display idle timeouts, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoIdle {
    pub ac_secs: Option<u32>,
    pub dc_secs: Option<u32>,
}

pub(crate) fn video_idle_command() -> String {
    invoke(POWERCFG_EXE, "/q SCHEME_CURRENT SUB_VIDEO VIDEOIDLE")
}

pub fn check_screen_lock(host: &impl HostQuery, policy: BatteryPolicy) -> DetectionOutcome<f64> {
    let language = ui_language(&host.shell(UI_CULTURE));
    let idle = parse_video_idle(&host.shell(&video_idle_command()), &language);
    let has_battery = !host.shell(BATTERY_QUERY).is_empty();
    debug!(language = %language, ?idle, has_battery, %policy, "display idle timeouts");

    let ac_secs = match idle.ac_secs {
        Some(secs) => secs,
        None => match read_reg_dword(host, POLICY_HIVE, POLICY_KEY, INACTIVITY_TIMEOUT_VALUE) {
            Some(secs) => {
                debug!(secs, "using machine inactivity policy");
                secs
            }
            None => return DetectionOutcome::NotDetected,
        },
    };

    let effective = match (has_battery, idle.dc_secs) {
        (true, Some(dc_secs)) => policy.combine(ac_secs, dc_secs),
        _ => ac_secs,
    };
    DetectionOutcome::from_seconds(f64::from(effective))
}

/// Two-letter language code from `$PSUICulture` (e.g. `es-ES` -> `es`).
pub fn ui_language(culture: &str) -> String {
    culture
        .trim()
        .chars()
        .take(2)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Locate the AC/DC index lines by localized label, or by position (the
/// last two hexadecimal values are AC then DC) for other languages.
pub fn parse_video_idle(output: &str, language: &str) -> VideoIdle {
    if let Some((_, ac_label, dc_label)) = INDEX_PATTERNS
        .iter()
        .find(|(lang, _, _)| *lang == language)
    {
        let ac_secs = labelled_hex(output, ac_label);
        if ac_secs.is_some() {
            return VideoIdle {
                ac_secs,
                dc_secs: labelled_hex(output, dc_label),
            };
        }
    }

    let values: Vec<u32> = output.lines().filter_map(hex_value).collect();
    match values.as_slice() {
        [.., ac, dc] => VideoIdle {
            ac_secs: Some(*ac),
            dc_secs: Some(*dc),
        },
        _ => VideoIdle::default(),
    }
}

fn labelled_hex(output: &str, label: &str) -> Option<u32> {
    output
        .lines()
        .find(|line| line.contains(label))
        .and_then(hex_value)
}

fn hex_value(line: &str) -> Option<u32> {
    let (_, value) = line.rsplit_once(':')?;
    let value = value.trim();
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))?;
    u32::from_str_radix(hex, 16).ok()
}
