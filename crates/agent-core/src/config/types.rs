use std::path::PathBuf;

use platform_windows::BatteryPolicy;

/// Effective settings for one audit run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub backend_url: Option<String>,
    pub backend_api_key: Option<String>,
    pub report_table: String,
    pub user_table: String,
    pub backend_timeout_secs: u64,
    pub backend_max_attempts: u32,

    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub identity_path: Option<PathBuf>,

    pub command_timeout_secs: u64,
    pub osquery_path: String,
    pub battery_policy: BatteryPolicy,

    pub dry_run: bool,
    pub wait_for_enter: bool,

    /// Config file that was applied, if any.
    pub config_file: Option<PathBuf>,
}

/// Command-line switches. Flags only ever turn behavior on.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dry_run: bool,
    pub wait_for_enter: bool,
    pub config_path: Option<PathBuf>,
}
