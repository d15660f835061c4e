use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::types::BackendRejection;

use super::Client;

const UPSERT_CONFLICT_COLUMNS: &str = "user_id,device_id";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

impl Client {
    pub(super) async fn upsert_http(&self, body: &Value) -> Result<()> {
        let url = format!(
            "{}?on_conflict={}",
            self.table_url(&self.report_table),
            UPSERT_CONFLICT_COLUMNS
        );

        self.with_retry("upsert_report_http", || {
            let url = url.clone();
            async move {
                let request = self
                    .authorized(self.http.post(&url))
                    .header("Prefer", PREFER_UPSERT)
                    .json(body);
                send_checked(request, &url, "security report").await?;
                Ok(())
            }
        })
        .await
    }

    pub(super) async fn fetch_user_rows_http(&self, user_id: &str) -> Result<Vec<Value>> {
        let url = self.table_url(&self.user_table);
        let query = vec![
            ("select".to_string(), "user_id".to_string()),
            ("user_id".to_string(), format!("eq.{}", user_id)),
            ("limit".to_string(), "1".to_string()),
        ];

        self.with_retry("user_lookup_http", || {
            let url = url.clone();
            let query = query.clone();
            async move {
                let request = self.authorized(self.http.get(&url)).query(&query);
                let response = send_checked(request, &url, "user lookup").await?;
                response
                    .json::<Vec<Value>>()
                    .await
                    .context("invalid user lookup response payload")
            }
        })
        .await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// Send `request`, turning a non-success status into a [`BackendRejection`].
async fn send_checked(request: RequestBuilder, url: &str, request_name: &str) -> Result<Response> {
    let response = request
        .send()
        .await
        .with_context(|| format!("failed sending {} to {}", request_name, url))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let rejection = BackendRejection::from_body(status.as_u16(), &body);
    Err(anyhow::Error::new(rejection).context(format!("{} rejected by {}", request_name, url)))
}
