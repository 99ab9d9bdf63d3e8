//! Single-address form
//!
//! `GET /` shows the form, `POST /` screens one address and renders the
//! result, or the error page when the validation service fails.

use crate::{error_page::PageError, views::{IndexTemplate, ResultTemplate}, AppState};
use axum::{
    extract::{rejection::FormRejection, State},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Form body of `POST /`
#[derive(Debug, Deserialize)]
pub struct CheckForm {
    #[serde(default)]
    pub email: String,
}

const INVALID_FORM_MESSAGE: &str = "Please enter an email address.";

/// GET /
pub async fn index_page() -> IndexTemplate {
    IndexTemplate
}

/// POST /
pub async fn check_email_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Form<CheckForm>, FormRejection>,
) -> Result<ResultTemplate, PageError> {
    let Form(form) = form.map_err(|rejection| {
        warn!("Unreadable check form: {}", rejection);
        PageError::InvalidInput(INVALID_FORM_MESSAGE.to_string())
    })?;

    let email = form.email.trim();
    if email.is_empty() {
        return Err(PageError::InvalidInput(INVALID_FORM_MESSAGE.to_string()));
    }

    info!("Checking email: {}", email);

    match state.screener.screen_email(email).await {
        Ok(screening) => Ok(ResultTemplate::from(screening)),
        Err(e) => {
            if e.is_request_failure() {
                error!("API request failed: {}", e);
            } else {
                error!("An unexpected error occurred: {}", e);
            }
            Err(e.into())
        }
    }
}
