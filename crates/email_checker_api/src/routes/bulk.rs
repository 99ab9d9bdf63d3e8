//! Bulk upload
//!
//! `GET /bulk` shows the upload form. `POST /bulk` takes a multipart `file`,
//! screens every address in its first column and answers with the XLSX
//! report as a download.

use crate::{error_page::PageError, views::BulkTemplate, AppState};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use screening_core::{UploadError, RESULTS_FILENAME, XLSX_CONTENT_TYPE};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

/// GET /bulk
pub async fn bulk_page() -> BulkTemplate {
    BulkTemplate
}

/// POST /bulk
///
/// The job runs on its own task, so a client that disconnects mid-upload
/// does not cut the batch short or lose the consolidated alert.
pub async fn bulk_upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, PageError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("Bulk request without a multipart body: {}", rejection);
        PageError::Upload(UploadError::MissingFile)
    })?;

    let (filename, bytes) = read_file_field(&mut multipart).await?;
    info!("Received upload {} ({} bytes)", filename, bytes.len());

    let screener = Arc::clone(&state.screener);
    let job_filename = filename.clone();
    let job = tokio::spawn(async move { screener.process_upload(&job_filename, &bytes).await });

    let outcome = job
        .await
        .map_err(|e| {
            error!("Bulk job for {} aborted: {}", filename, e);
            PageError::BulkFailed
        })?
        .map_err(|e| {
            error!("An error occurred during bulk processing: {}", e);
            PageError::from(e)
        })?;

    info!(
        "Bulk job for {} finished: {} rows, {} flagged, {} failed",
        filename, outcome.rows, outcome.flagged, outcome.failed
    );

    Ok(xlsx_attachment(outcome.workbook))
}

/// Pull the `file` part out of the form, ignoring any other fields
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), PageError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(UploadError::MissingFile.into()),
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return Err(PageError::InvalidInput(
                    "The upload could not be read.".to_string(),
                ));
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            warn!("Failed to read upload body: {}", e);
            PageError::InvalidInput("The upload could not be read.".to_string())
        })?;

        return Ok((filename, bytes.to_vec()));
    }
}

fn xlsx_attachment(workbook: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", RESULTS_FILENAME),
            ),
        ],
        workbook,
    )
        .into_response()
}
