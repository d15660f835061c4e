use std::time::Duration;

use anyhow::Result;
use posture::QueryOptions;
use report_client::BackendSettings;

use super::types::{AuditConfig, CliOverrides};

impl AuditConfig {
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_file_config(cli.config_path.as_deref())?;
        cfg.apply_env_overrides();
        cfg.apply_cli_overrides(cli);
        Ok(cfg)
    }

    fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if cli.dry_run {
            self.dry_run = true;
        }
        if cli.wait_for_enter {
            self.wait_for_enter = true;
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            osquery_path: self.osquery_path.clone(),
        }
    }

    /// Backend connection settings. Missing credentials are a setup error
    /// unless the run is a dry run, which never contacts the backend.
    pub fn backend_settings(&self) -> Result<Option<BackendSettings>> {
        match (&self.backend_url, &self.backend_api_key) {
            (Some(url), Some(api_key)) => Ok(Some(BackendSettings {
                url: url.clone(),
                api_key: api_key.clone(),
                report_table: self.report_table.clone(),
                user_table: self.user_table.clone(),
                timeout: Duration::from_secs(self.backend_timeout_secs),
                max_attempts: self.backend_max_attempts,
            })),
            _ if self.dry_run => Ok(None),
            (None, _) => anyhow::bail!(
                "missing backend URL: set SUPABASE_URL or [backend] url in the config file"
            ),
            (_, None) => anyhow::bail!(
                "missing backend API key: set SUPABASE_ANON_KEY or [backend] api_key in the config file"
            ),
        }
    }
}
