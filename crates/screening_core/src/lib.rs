//! # screening_core
//!
//! Email screening against an external reputation API.
//!
//! ## Features
//!
//! - **Validation client** for the reputation API, with typed failures
//! - **Threshold classifier** producing a local "suspicious" verdict
//! - **Operator alerts** over STARTTLS SMTP, best-effort
//! - **Bulk screening** of CSV / XLS / XLSX uploads into an XLSX report
//!
//! ## Example
//!
//! ```rust,no_run
//! use screening_core::{ClientConfig, DisabledNotifier, Screener, ValidationClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ValidationClient::new(ClientConfig::new("api-key"))?;
//! let screener = Screener::new(Arc::new(client), Arc::new(DisabledNotifier));
//!
//! let screening = screener.screen_email("someone@example.com").await?;
//! println!("suspicious: {}", screening.suspicious);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod client;
pub mod notifier;
pub mod record;
pub mod results;
pub mod screener;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod upload;

use std::time::Duration;
use thiserror::Error;

/// Default endpoint of the reputation API; the API key is appended as a path segment
pub const DEFAULT_API_BASE_URL: &str = "https://ipqualityscore.com/api/json/email";

/// Configuration for the validation client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, without the API key segment
    pub api_base_url: String,
    /// API key inserted into the request path
    pub api_key: String,
    /// Overall request timeout; `None` keeps the HTTP client default
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }
}

/// SMTP relay settings for operator alerts
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Address alerts are sent from
    pub sender: String,
    /// Operator address alerts are sent to
    pub recipient: String,
}

/// Errors from a single call to the validation API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Request to validation service failed: {0}")]
    Transport(String),
    #[error("Validation service returned HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("Invalid response from validation service: {0}")]
    Parse(String),
}

impl ValidationError {
    /// Whether the failure happened while talking to the service,
    /// as opposed to understanding its answer
    pub fn is_request_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus { .. })
    }
}

/// Rejections of an uploaded file before any processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("No file part")]
    MissingFile,
    #[error("No selected file")]
    EmptyFilename,
    #[error("Invalid file format: {0}. Please upload a CSV or Excel file.")]
    UnsupportedExtension(String),
}

/// Errors that abort a whole bulk job
#[derive(Error, Debug)]
pub enum BulkError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Could not read uploaded file: {0}")]
    FileParse(String),
    #[error("Uploaded file contains no email rows")]
    EmptyUpload,
    #[error("Could not build results workbook: {0}")]
    Workbook(String),
}

/// Alert delivery failures; logged by the notifier, never returned to callers
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notifications are not configured")]
    NotConfigured,
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

// Re-export main types
pub use classifier::is_suspicious;
pub use client::{EmailValidator, ValidationClient};
pub use notifier::{DisabledNotifier, Notifier, SmtpNotifier};
pub use record::{RiskSignals, ValidationRecord};
pub use results::{write_workbook, ResultTable, RESULTS_FILENAME, RESULTS_SHEET_NAME, XLSX_CONTENT_TYPE};
pub use screener::{BatchReport, BulkOutcome, BulkRow, Screener, Screening};
pub use upload::{parse_upload, UploadFormat, UploadTable};
