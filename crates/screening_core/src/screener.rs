//! Screening orchestration for single addresses and bulk uploads
//!
//! The screener calls the validator, classifies the answer and raises an
//! operator alert when something looks suspicious. Bulk jobs keep going past
//! per-row failures: a failed lookup becomes an error row in the report.

use crate::{
    classifier::is_suspicious,
    client::EmailValidator,
    notifier::{Alert, Notifier},
    record::{ValidationRecord, EMAIL_FIELD, SUSPICIOUS_FIELD},
    results::{write_workbook, ResultTable},
    upload::{parse_upload, UploadFormat},
    BulkError, ValidationError,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of screening one address
#[derive(Debug, Clone, PartialEq)]
pub struct Screening {
    pub email: String,
    /// The API response as received
    pub record: ValidationRecord,
    pub suspicious: bool,
}

/// One row of a bulk job
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRow {
    pub email: String,
    /// Annotated API response, or the synthetic error record
    pub record: ValidationRecord,
    pub suspicious: bool,
    /// Set when the lookup failed
    pub error: Option<String>,
}

impl BulkRow {
    fn validated(email: String, mut record: ValidationRecord) -> Self {
        let suspicious = is_suspicious(&record);
        record.annotate(&email, suspicious);
        Self {
            email,
            record,
            suspicious,
            error: None,
        }
    }

    // Failed lookups are flagged so they stand out in the report
    fn failed(email: String, err: &ValidationError) -> Self {
        let message = err.to_string();
        let mut record = ValidationRecord::default();
        record.insert(EMAIL_FIELD, email.as_str());
        record.insert("Status", "Error");
        record.insert("Sub_Status", message.as_str());
        record.insert(SUSPICIOUS_FIELD, true);
        Self {
            email,
            record,
            suspicious: true,
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// All rows of a bulk job, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub rows: Vec<BulkRow>,
}

impl BatchReport {
    /// Rows that were validated and judged suspicious
    pub fn flagged(&self) -> impl Iterator<Item = &BulkRow> {
        self.rows.iter().filter(|row| row.suspicious && !row.is_error())
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged().count()
    }

    pub fn failed_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_error()).count()
    }

    pub fn table(&self) -> ResultTable {
        ResultTable::from_records(self.rows.iter().map(|row| &row.record))
    }

    /// The consolidated alert, if any validated row is suspicious
    pub fn alert(&self) -> Option<Alert> {
        if self.flagged_count() == 0 {
            return None;
        }
        Some(Alert::bulk(
            self.flagged().map(|row| (row.email.as_str(), &row.record)),
        ))
    }
}

/// Finished bulk job
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    /// XLSX report bytes
    pub workbook: Vec<u8>,
    pub rows: usize,
    pub flagged: usize,
    pub failed: usize,
}

/// Coordinates validator, classifier and notifier
pub struct Screener {
    validator: Arc<dyn EmailValidator>,
    notifier: Arc<dyn Notifier>,
    concurrency: usize,
}

impl Screener {
    /// Create a screener that processes bulk rows one at a time
    pub fn new(validator: Arc<dyn EmailValidator>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            validator,
            notifier,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` lookups in flight during bulk jobs.
    /// Results keep input order regardless.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Screen one address, alerting the operator if it is suspicious
    #[instrument(skip(self))]
    pub async fn screen_email(&self, email: &str) -> Result<Screening, ValidationError> {
        let record = self.validator.validate(email).await?;
        info!("Validation result for {}: {}", email, record);

        let suspicious = is_suspicious(&record);
        if suspicious {
            let alert = Alert::suspicious_email(email, &record);
            self.notifier.notify(&alert.subject, &alert.body).await;
        }

        Ok(Screening {
            email: email.to_string(),
            record,
            suspicious,
        })
    }

    /// Validate every address; failures become error rows
    pub async fn screen_batch(&self, emails: Vec<String>) -> BatchReport {
        debug!(
            "Screening {} addresses with concurrency {}",
            emails.len(),
            self.concurrency
        );

        let rows: Vec<BulkRow> = stream::iter(emails.into_iter().enumerate())
            .map(|(index, email)| self.screen_row(index, email))
            .buffered(self.concurrency)
            .collect()
            .await;

        info!("Processed {} emails", rows.len());
        BatchReport { rows }
    }

    async fn screen_row(&self, index: usize, email: String) -> BulkRow {
        info!("Processing email {}: {}", index + 1, email);
        match self.validator.validate(&email).await {
            Ok(record) => BulkRow::validated(email, record),
            Err(e) => {
                error!("Error validating {}: {}", email, e);
                BulkRow::failed(email, &e)
            }
        }
    }

    /// Run a whole bulk job: parse, screen, build the report, alert once
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn process_upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<BulkOutcome, BulkError> {
        let format = UploadFormat::from_filename(filename)?;
        let table = parse_upload(format, bytes)?;

        let emails = table.emails();
        if emails.is_empty() {
            warn!("Upload {} has no data rows", filename);
            return Err(BulkError::EmptyUpload);
        }

        let report = self.screen_batch(emails).await;
        let workbook = write_workbook(&report.table())?;

        if let Some(alert) = report.alert() {
            self.notifier.notify(&alert.subject, &alert.body).await;
        }

        Ok(BulkOutcome {
            workbook,
            rows: report.rows.len(),
            flagged: report.flagged_count(),
            failed: report.failed_count(),
        })
    }
}
