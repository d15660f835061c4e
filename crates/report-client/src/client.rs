use std::future::Future;

use anyhow::{Context, Result};
use posture::SecurityReport;
use reqwest::Client as HttpClient;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::retry::RetryPolicy;
use crate::types::{BackendRejection, BackendSettings, ReportRow};

#[path = "client/client_http.rs"]
mod client_http;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    api_key: String,
    report_table: String,
    user_table: String,
    retry: RetryPolicy,
    http: HttpClient,
}

impl Client {
    pub fn new(settings: BackendSettings) -> Result<Self> {
        let base_url = settings.url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!("backend URL must start with http:// or https://: '{}'", base_url);
        }
        if settings.api_key.trim().is_empty() {
            anyhow::bail!("backend API key cannot be empty");
        }

        let http = HttpClient::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed building HTTP client")?;

        Ok(Self {
            base_url,
            api_key: settings.api_key,
            report_table: settings.report_table,
            user_table: settings.user_table,
            retry: RetryPolicy::default().with_max_attempts(settings.max_attempts),
            http,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Insert or overwrite the report row for `(user_id, device_id)`.
    pub async fn upsert_report(
        &self,
        user_id: &str,
        device_id: &str,
        report: &SecurityReport,
    ) -> Result<()> {
        let row = ReportRow {
            user_id,
            device_id,
            report,
        };
        let body = serde_json::to_value(&row).context("failed serializing security report")?;

        self.upsert_http(&body).await?;
        info!(
            table = %self.report_table,
            user_id,
            device_id,
            "security report upserted"
        );
        Ok(())
    }

    /// Whether `user_id` is registered in the user table.
    pub async fn user_exists(&self, user_id: &str) -> Result<bool> {
        let rows = self.fetch_user_rows_http(user_id).await?;
        Ok(!rows.is_empty())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Retries transport errors and 5xx rejections; client errors are
    /// returned on the first attempt.
    async fn with_retry<T, F, Fut>(&self, operation_name: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    let permanent = err
                        .downcast_ref::<BackendRejection>()
                        .map(|rejection| !rejection.is_transient())
                        .unwrap_or(false);
                    if permanent {
                        return Err(err);
                    }
                    if !self.retry.allows_retry_after(attempt) {
                        return Err(err).with_context(|| {
                            format!(
                                "operation {} failed after {} attempts",
                                operation_name, attempt
                            )
                        });
                    }

                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "backend call failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
