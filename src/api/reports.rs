//! Report generation: request an export, poll until the server has built it,
//! then download the file.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use crate::error::ErrorCode;
use crate::http::{HttpClient, HttpError, Query, RequestBody};

pub const GENERATE_PATH: &str = "/reports/generate/";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLLS: u32 = 30;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Xlsx,
    Pdf,
}

impl ReportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Local,
    Email,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_delivery"))]
pub struct ReportRequest {
    /// Permission resource name of the exported entity, e.g. `trailer`.
    #[validate(length(min = 1))]
    pub resource: String,
    pub format: ReportFormat,
    pub delivery_method: DeliveryMethod,
    #[validate(length(min = 1))]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub filters: Map<String, Value>,
    /// Required for email delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_profile_id: Option<String>,
}

fn validate_delivery(r: &ReportRequest) -> Result<(), ValidationError> {
    if r.delivery_method == DeliveryMethod::Email && r.email_profile_id.is_none() {
        return Err(ValidationError::new("email_profile_required")
            .with_message("Email delivery needs an email profile".into()));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJob {
    pub id: String,
    pub status: ReportStatus,
    pub format: ReportFormat,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
}

impl ReportJob {
    /// File name for saving the download.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("report-{}.{}", self.id, self.format.extension()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("report {id} failed: {reason}")]
    Failed { id: String, reason: String },

    #[error("report {id} not ready after {polls} polls")]
    NotReady { id: String, polls: u32 },
}

impl ErrorCode for ReportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Http(e) => e.error_code(),
            Self::Failed { .. } => "E_REPORT_FAILED",
            Self::NotReady { .. } => "E_REPORT_NOT_READY",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.retryable(),
            Self::Failed { .. } => false,
            Self::NotReady { .. } => true,
        }
    }
}

pub struct ReportApi {
    http: Arc<HttpClient>,
}

impl ReportApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Validate and submit a report request.
    ///
    /// # Errors
    ///
    /// [`HttpError::Validation`] without a request for an invalid request,
    /// otherwise request errors.
    pub async fn generate(&self, request: &ReportRequest) -> Result<ReportJob, ReportError> {
        request.validate().map_err(HttpError::from)?;
        let job: ReportJob = self.http.post(GENERATE_PATH, &RequestBody::json(request)?).await?;
        info!(report_id = %job.id, resource = %request.resource, format = ?request.format, "report requested");
        Ok(job)
    }

    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn status(&self, id: &str) -> Result<ReportJob, ReportError> {
        Ok(self.http.get(&format!("/reports/{id}/"), &Query::new()).await?)
    }

    /// Poll `status` every `poll` until the job completes.
    ///
    /// # Errors
    ///
    /// [`ReportError::Failed`] when the server reports failure and
    /// [`ReportError::NotReady`] after `max_polls` unfinished polls.
    pub async fn wait_until_ready(&self, id: &str, poll: Duration, max_polls: u32) -> Result<ReportJob, ReportError> {
        for n in 1..=max_polls {
            let job = self.status(id).await?;
            match job.status {
                ReportStatus::Completed => return Ok(job),
                ReportStatus::Failed => {
                    return Err(ReportError::Failed {
                        id: id.to_owned(),
                        reason: job.error.unwrap_or_else(|| "unknown error".to_owned()),
                    });
                }
                ReportStatus::Pending | ReportStatus::Running => {
                    debug!(report_id = id, poll = n, status = ?job.status, "report not ready");
                    if n < max_polls {
                        tokio::time::sleep(poll).await;
                    }
                }
            }
        }
        Err(ReportError::NotReady { id: id.to_owned(), polls: max_polls })
    }

    /// Fetch the generated file.
    ///
    /// # Errors
    ///
    /// [`ReportError::NotReady`] if the job has not completed, otherwise
    /// request errors.
    pub async fn download(&self, job: &ReportJob) -> Result<Vec<u8>, ReportError> {
        if job.status != ReportStatus::Completed {
            return Err(ReportError::NotReady { id: job.id.clone(), polls: 0 });
        }
        let path = job
            .download_url
            .clone()
            .unwrap_or_else(|| format!("/reports/{}/download/", job.id));
        let bytes = self.http.get_bytes(&path, &Query::new()).await?;
        info!(report_id = %job.id, bytes = bytes.len(), "report downloaded");
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
