use std::path::PathBuf;

use platform_windows::BatteryPolicy;
use tracing::warn;

use super::types::AuditConfig;
use super::util::{env_non_empty, env_u64, parse_bool};

impl AuditConfig {
    pub(super) fn apply_env_overrides(&mut self) {
        self.apply_env_backend();
        self.apply_env_identity();
        self.apply_env_detection();
        self.apply_env_run();
    }

    fn apply_env_backend(&mut self) {
        if let Some(v) = env_non_empty("SUPABASE_URL") {
            self.backend_url = Some(v);
        }
        if let Some(v) = env_non_empty("SUPABASE_ANON_KEY") {
            self.backend_api_key = Some(v);
        }
    }

    fn apply_env_identity(&mut self) {
        if let Some(v) = env_non_empty("POSTURE_USER_ID") {
            self.user_id = Some(v);
        }
        if let Some(v) = env_non_empty("POSTURE_DEVICE_ID") {
            self.device_id = Some(v);
        }
        if let Some(v) = env_non_empty("POSTURE_IDENTITY_PATH") {
            self.identity_path = Some(PathBuf::from(v));
        }
    }

    fn apply_env_detection(&mut self) {
        if let Some(v) = env_u64("POSTURE_COMMAND_TIMEOUT_SECS").filter(|v| *v > 0) {
            self.command_timeout_secs = v;
        }
        if let Some(v) = env_non_empty("POSTURE_OSQUERY_PATH") {
            self.osquery_path = v;
        }
        if let Some(v) = env_non_empty("POSTURE_BATTERY_POLICY") {
            match v.parse::<BatteryPolicy>() {
                Ok(policy) => self.battery_policy = policy,
                Err(err) => warn!(error = %err, "ignoring POSTURE_BATTERY_POLICY"),
            }
        }
    }

    fn apply_env_run(&mut self) {
        if let Some(v) = env_non_empty("POSTURE_DRY_RUN") {
            self.dry_run = parse_bool(&v);
        }
        if let Some(v) = env_non_empty("POSTURE_WAIT_FOR_ENTER") {
            self.wait_for_enter = parse_bool(&v);
        }
    }
}
