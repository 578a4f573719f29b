use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::http::RateLimitedHttpClient;
use crate::lifecycle::Period;
use crate::portal::types::{
    EmployeeAssignment, LockReceipt, LockRequest, MonthRecord, Note, SlotKey, UploadFile,
    UploadReceipt,
};
use crate::portal::PortalError;

pub const MONTH_DATA_PATH: &str = "/client-upload/month-data";
pub const ASSIGNMENT_PATH: &str = "/client-upload/employee-assignment";
pub const NOTES_PATH: &str = "/client-upload/notes";
pub const UPLOAD_PATH: &str = "/client-upload/upload";
pub const SAVE_LOCK_PATH: &str = "/client-upload/save-lock";

/// One upload as sent to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub period: Period,
    pub slot: SlotKey,
    pub file: UploadFile,
    pub note: Option<String>,
}

/// Remote document service contract.
///
/// Reads return `Ok(None)` when the service has nothing for the period.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn fetch_month(&self, period: Period) -> Result<Option<MonthRecord>, PortalError>;

    async fn fetch_assignment(
        &self,
        period: Period,
    ) -> Result<Option<EmployeeAssignment>, PortalError>;

    async fn fetch_notes(&self, period: Period) -> Result<Option<Vec<Note>>, PortalError>;

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, PortalError>;

    async fn save_lock(
        &self,
        period: Period,
        note: Option<String>,
    ) -> Result<LockReceipt, PortalError>;
}

/// HTTP implementation of [`DocumentService`].
#[derive(Debug)]
pub struct PortalClient {
    http: RateLimitedHttpClient,
}

impl PortalClient {
    pub fn new(api: &ApiConfig) -> Result<Self, PortalError> {
        Ok(Self {
            http: RateLimitedHttpClient::new(api)?,
        })
    }

    fn period_query(period: Period) -> [(&'static str, String); 2] {
        [
            ("year", period.year().to_string()),
            ("month", period.month().to_string()),
        ]
    }

    fn cache_key(path: &str, period: Period) -> String {
        format!("{path}|{period}")
    }

    async fn invalidate_period(&self, period: Period) {
        self.http
            .invalidate_cache_pattern(&format!("|{period}"))
            .await;
    }
}

#[async_trait]
impl DocumentService for PortalClient {
    async fn fetch_month(&self, period: Period) -> Result<Option<MonthRecord>, PortalError> {
        self.http
            .get_json(
                MONTH_DATA_PATH,
                &Self::period_query(period),
                Some(Self::cache_key(MONTH_DATA_PATH, period)),
            )
            .await
    }

    async fn fetch_assignment(
        &self,
        period: Period,
    ) -> Result<Option<EmployeeAssignment>, PortalError> {
        self.http
            .get_json(
                ASSIGNMENT_PATH,
                &Self::period_query(period),
                Some(Self::cache_key(ASSIGNMENT_PATH, period)),
            )
            .await
    }

    async fn fetch_notes(&self, period: Period) -> Result<Option<Vec<Note>>, PortalError> {
        self.http
            .get_json(
                NOTES_PATH,
                &Self::period_query(period),
                Some(Self::cache_key(NOTES_PATH, period)),
            )
            .await
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, PortalError> {
        let UploadRequest {
            period,
            slot,
            file,
            note,
        } = request;

        let size = file.bytes.len();
        let mut form = Form::new()
            .part("file", Part::bytes(file.bytes).file_name(file.file_name.clone()))
            .text("year", period.year().to_string())
            .text("month", period.month().to_string())
            .text("type", slot.wire_type());
        if let Some(category) = slot.category_name() {
            form = form.text("categoryName", category.to_string());
        }
        if let Some(note) = note {
            form = form.text("note", note);
        }

        debug!(%period, slot = %slot, file = %file.file_name, bytes = size, "Uploading document");
        let receipt = self.http.post_multipart(UPLOAD_PATH, form).await;

        // Invalidate on failure too; the period is refetched either way.
        self.invalidate_period(period).await;

        let receipt = receipt?;
        info!(%period, slot = %slot, "Document accepted");
        Ok(receipt)
    }

    async fn save_lock(
        &self,
        period: Period,
        note: Option<String>,
    ) -> Result<LockReceipt, PortalError> {
        let body = LockRequest {
            year: period.year(),
            month: period.month(),
            note,
        };
        let receipt = self.http.post_json(SAVE_LOCK_PATH, &body).await;
        self.invalidate_period(period).await;

        let receipt = receipt?;
        info!(%period, "Month locked");
        Ok(receipt)
    }
}
