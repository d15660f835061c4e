use std::fmt;
use std::time::Duration;

use posture::SecurityReport;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPORT_TABLE: &str = "security_reports";
pub const DEFAULT_USER_TABLE: &str = "user_logs";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection parameters for the report backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
    pub report_table: String,
    pub user_table: String,
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl BackendSettings {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            report_table: DEFAULT_REPORT_TABLE.to_string(),
            user_table: DEFAULT_USER_TABLE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: 3,
        }
    }
}

/// Upsert body: the report keyed by user and device.
#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    pub user_id: &'a str,
    pub device_id: &'a str,
    #[serde(flatten)]
    pub report: &'a SecurityReport,
}

/// Error payload returned by the backend for a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRejection {
    pub status: u16,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RejectionBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

impl BackendRejection {
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed: RejectionBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                let body = body.trim();
                if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                }
            });
        Self {
            status,
            message,
            details: parsed.details.filter(|d| !d.trim().is_empty()),
            hint: parsed.hint.filter(|h| !h.trim().is_empty()),
            code: parsed.code,
        }
    }

    /// Server-side failures may succeed on a later attempt; client errors
    /// will not.
    pub fn is_transient(&self) -> bool {
        self.status >= 500
    }
}

impl fmt::Display for BackendRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend rejected request ({}): {}", self.status, self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for BackendRejection {}
