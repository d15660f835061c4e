use platform_windows::BatteryPolicy;
use report_client::{DEFAULT_REPORT_TABLE, DEFAULT_USER_TABLE};

use super::constants::{
    DEFAULT_BACKEND_MAX_ATTEMPTS, DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_COMMAND_TIMEOUT_SECS,
    DEFAULT_OSQUERY_PATH,
};
use super::types::AuditConfig;

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_api_key: None,
            report_table: DEFAULT_REPORT_TABLE.to_string(),
            user_table: DEFAULT_USER_TABLE.to_string(),
            backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
            backend_max_attempts: DEFAULT_BACKEND_MAX_ATTEMPTS,
            user_id: None,
            device_id: None,
            identity_path: None,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            osquery_path: DEFAULT_OSQUERY_PATH.to_string(),
            battery_policy: BatteryPolicy::default(),
            dry_run: false,
            wait_for_enter: false,
            config_file: None,
        }
    }
}
