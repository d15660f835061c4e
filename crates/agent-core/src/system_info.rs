//! OS metadata and device identifier lookups.

use posture::{HostQuery, OsInfo, Platform};
use tracing::{debug, warn};

pub const SW_VERS_PRODUCT_VERSION: &str = "sw_vers -productVersion";
pub const WINDOWS_OS_VERSION: &str = "[System.Environment]::OSVersion.Version.ToString()";
pub const LSB_RELEASE_ID: &str = "lsb_release -is";
pub const LSB_RELEASE_VERSION: &str = "lsb_release -rs";
pub const OS_RELEASE: &str = "cat /etc/os-release";
pub const KERNEL_RELEASE: &str = "uname -r";

pub const MACOS_SERIAL: &str =
    "ioreg -c IOPlatformExpertDevice -d 2 | awk -F\\\" '/IOPlatformSerialNumber/{print $(NF-1)}'";
pub const WINDOWS_SERIAL: &str = "(Get-CimInstance -ClassName Win32_BIOS).SerialNumber";
pub const LINUX_PRODUCT_SERIAL: &str = "cat /sys/class/dmi/id/product_serial";
pub const LINUX_MACHINE_ID: &str = "cat /etc/machine-id";
pub const HOSTNAME: &str = "hostname";

const UNKNOWN_VERSION: &str = "unknown";

// Firmware placeholders that do not identify a machine.
const PLACEHOLDER_SERIALS: &[&str] = &[
    "0",
    "none",
    "n/a",
    "default string",
    "not specified",
    "not applicable",
    "system serial number",
    "to be filled by o.e.m.",
    "123456789",
];

pub fn os_info(platform: Platform, host: &impl HostQuery) -> OsInfo {
    let (name, version) = match platform {
        Platform::MacOs => (
            "macOS".to_string(),
            non_empty(host.shell(SW_VERS_PRODUCT_VERSION)),
        ),
        Platform::Windows => (
            "Windows".to_string(),
            non_empty(host.shell(WINDOWS_OS_VERSION)),
        ),
        Platform::Linux => linux_os_info(host),
    };

    let version = version.unwrap_or_else(|| {
        warn!(platform = %platform, "operating system version unavailable");
        UNKNOWN_VERSION.to_string()
    });
    OsInfo { name, version }
}

fn linux_os_info(host: &impl HostQuery) -> (String, Option<String>) {
    let distributor = non_empty(host.shell(LSB_RELEASE_ID));
    let release = non_empty(host.shell(LSB_RELEASE_VERSION));
    if let Some(distributor) = distributor {
        let version = release.or_else(|| non_empty(host.shell(KERNEL_RELEASE)));
        return (format!("Linux | {}", distributor), version);
    }

    debug!("lsb_release unavailable, reading /etc/os-release");
    let os_release = host.shell(OS_RELEASE);
    let name = os_release_field(&os_release, "NAME");
    let version = release
        .or_else(|| os_release_field(&os_release, "VERSION_ID"))
        .or_else(|| non_empty(host.shell(KERNEL_RELEASE)));
    match name {
        Some(name) => (format!("Linux | {}", name), version),
        None => ("Linux".to_string(), version),
    }
}

/// Value of `key` in os-release(5) syntax, unquoted.
pub fn os_release_field(raw: &str, key: &str) -> Option<String> {
    raw.lines()
        .filter_map(|line| line.trim().split_once('='))
        .find(|(k, _)| k.trim() == key)
        .and_then(|(_, v)| non_empty(v.trim().trim_matches('"').trim_matches('\'').to_string()))
}

/// Hardware serial for the device, falling back to the host name.
pub fn device_serial(platform: Platform, host: &impl HostQuery) -> Option<String> {
    let candidates: &[&str] = match platform {
        Platform::MacOs => &[MACOS_SERIAL],
        Platform::Windows => &[WINDOWS_SERIAL],
        Platform::Linux => &[LINUX_PRODUCT_SERIAL, LINUX_MACHINE_ID],
    };

    for command in candidates {
        if let Some(serial) = usable_serial(&host.shell(command)) {
            debug!(source = *command, "device id resolved");
            return Some(serial);
        }
    }

    let hostname = non_empty(host.shell(HOSTNAME));
    if hostname.is_some() {
        warn!(platform = %platform, "no hardware serial found, using host name as device id");
    }
    hostname
}

fn usable_serial(raw: &str) -> Option<String> {
    let serial = raw.lines().next()?.trim();
    if serial.is_empty() || PLACEHOLDER_SERIALS.contains(&serial.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some(serial.to_string())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
