pub(super) const CONFIG_PATH_ENV: &str = "POSTURE_AUDIT_CONFIG";

#[cfg(target_os = "linux")]
pub(super) const AUDIT_CONFIG_CANDIDATES: &[&str] = &[
    "/etc/posture-audit/audit.toml",
    "./conf/audit.toml",
    "./audit.toml",
];

#[cfg(target_os = "windows")]
pub(super) const AUDIT_CONFIG_CANDIDATES: &[&str] = &[
    r"C:\ProgramData\PostureAudit\audit.toml",
    r".\conf\audit.toml",
    r".\audit.toml",
];

#[cfg(target_os = "macos")]
pub(super) const AUDIT_CONFIG_CANDIDATES: &[&str] = &[
    "/Library/Application Support/PostureAudit/audit.toml",
    "./conf/audit.toml",
    "./audit.toml",
];

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
pub(super) const AUDIT_CONFIG_CANDIDATES: &[&str] = &["./conf/audit.toml", "./audit.toml"];

pub(super) const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
pub(super) const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;
pub(super) const DEFAULT_BACKEND_MAX_ATTEMPTS: u32 = 3;
pub(super) const DEFAULT_OSQUERY_PATH: &str = "osqueryi";
