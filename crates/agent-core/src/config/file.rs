use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use platform_windows::BatteryPolicy;
use serde::Deserialize;

use super::paths::resolve_config_path;
use super::types::AuditConfig;
use super::util::non_empty;

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    backend: Option<FileBackendConfig>,
    identity: Option<FileIdentityConfig>,
    detection: Option<FileDetectionConfig>,
    run: Option<FileRunConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FileBackendConfig {
    url: Option<String>,
    api_key: Option<String>,
    report_table: Option<String>,
    user_table: Option<String>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FileIdentityConfig {
    user_id: Option<String>,
    device_id: Option<String>,
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct FileDetectionConfig {
    command_timeout_secs: Option<u64>,
    osquery_path: Option<String>,
    battery_policy: Option<BatteryPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct FileRunConfig {
    dry_run: Option<bool>,
    wait_for_enter: Option<bool>,
}

impl AuditConfig {
    pub(super) fn apply_file_config(&mut self, explicit: Option<&Path>) -> Result<bool> {
        let Some(path) = resolve_config_path(explicit)? else {
            return Ok(false);
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        let file_cfg: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("failed parsing TOML config {}", path.display()))?;

        self.apply_file_backend(file_cfg.backend);
        self.apply_file_identity(file_cfg.identity);
        self.apply_file_detection(file_cfg.detection);
        self.apply_file_run(file_cfg.run);
        self.config_file = Some(path);

        Ok(true)
    }

    fn apply_file_backend(&mut self, backend: Option<FileBackendConfig>) {
        let Some(backend) = backend else {
            return;
        };

        if let Some(v) = non_empty(backend.url) {
            self.backend_url = Some(v);
        }
        if let Some(v) = non_empty(backend.api_key) {
            self.backend_api_key = Some(v);
        }
        if let Some(v) = non_empty(backend.report_table) {
            self.report_table = v;
        }
        if let Some(v) = non_empty(backend.user_table) {
            self.user_table = v;
        }
        if let Some(v) = backend.timeout_secs.filter(|v| *v > 0) {
            self.backend_timeout_secs = v;
        }
        if let Some(v) = backend.max_attempts.filter(|v| *v > 0) {
            self.backend_max_attempts = v;
        }
    }

    fn apply_file_identity(&mut self, identity: Option<FileIdentityConfig>) {
        let Some(identity) = identity else {
            return;
        };

        if let Some(v) = non_empty(identity.user_id) {
            self.user_id = Some(v);
        }
        if let Some(v) = non_empty(identity.device_id) {
            self.device_id = Some(v);
        }
        if let Some(v) = identity.path.filter(|p| !p.as_os_str().is_empty()) {
            self.identity_path = Some(v);
        }
    }

    fn apply_file_detection(&mut self, detection: Option<FileDetectionConfig>) {
        let Some(detection) = detection else {
            return;
        };

        if let Some(v) = detection.command_timeout_secs.filter(|v| *v > 0) {
            self.command_timeout_secs = v;
        }
        if let Some(v) = non_empty(detection.osquery_path) {
            self.osquery_path = v;
        }
        if let Some(v) = detection.battery_policy {
            self.battery_policy = v;
        }
    }

    fn apply_file_run(&mut self, run: Option<FileRunConfig>) {
        let Some(run) = run else {
            return;
        };

        if let Some(v) = run.dry_run {
            self.dry_run = v;
        }
        if let Some(v) = run.wait_for_enter {
            self.wait_for_enter = v;
        }
    }
}
