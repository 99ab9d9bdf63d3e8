//! Error pages
//!
//! Handler failures are rendered as the error view with a generic message.
//! Underlying details go to the log, tagged with the same reference id the
//! user sees.

use crate::views::ErrorTemplate;
use axum::{http::StatusCode, response::IntoResponse};
use screening_core::{BulkError, UploadError, ValidationError};
use tracing::error;
use uuid::Uuid;

pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Failed to contact the email validation service. Please try again later.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";
pub const BULK_FAILED_MESSAGE: &str =
    "An error occurred during bulk processing. Please check the file and try again.";

/// Failures a page handler can end in
#[derive(Debug)]
pub enum PageError {
    /// Bad form input, shown to the user as-is
    InvalidInput(String),
    Upload(UploadError),
    EmptyUpload,
    /// Validation service unreachable or answering with an error status
    ServiceUnavailable,
    /// Bulk job aborted after the upload was accepted
    BulkFailed,
    Unexpected,
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::InvalidInput(_) | PageError::Upload(_) | PageError::EmptyUpload => {
                StatusCode::BAD_REQUEST
            }
            PageError::ServiceUnavailable => StatusCode::BAD_GATEWAY,
            PageError::BulkFailed | PageError::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            PageError::InvalidInput(msg) => msg.clone(),
            PageError::Upload(e) => e.to_string(),
            PageError::EmptyUpload => "The uploaded file contains no email addresses.".to_string(),
            PageError::ServiceUnavailable => SERVICE_UNAVAILABLE_MESSAGE.to_string(),
            PageError::BulkFailed => BULK_FAILED_MESSAGE.to_string(),
            PageError::Unexpected => UNEXPECTED_MESSAGE.to_string(),
        }
    }
}

impl From<ValidationError> for PageError {
    fn from(err: ValidationError) -> Self {
        if err.is_request_failure() {
            PageError::ServiceUnavailable
        } else {
            PageError::Unexpected
        }
    }
}

impl From<UploadError> for PageError {
    fn from(err: UploadError) -> Self {
        PageError::Upload(err)
    }
}

impl From<BulkError> for PageError {
    fn from(err: BulkError) -> Self {
        match err {
            BulkError::Upload(e) => PageError::Upload(e),
            BulkError::EmptyUpload => PageError::EmptyUpload,
            BulkError::FileParse(_) | BulkError::Workbook(_) => PageError::BulkFailed,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let reference = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        error!(
            "Rendering error page {} ({}): {:?}",
            reference,
            status.as_u16(),
            self
        );

        let page = ErrorTemplate {
            message: self.message(),
            reference,
            timestamp,
        };

        (status, page).into_response()
    }
}
