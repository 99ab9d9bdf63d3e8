//! In-memory stand-ins for the validation API and the SMTP relay
//!
//! Enabled for this crate's tests and, through the `test-support` feature,
//! for dependents that drive a [`crate::Screener`] without the network.

use crate::{EmailValidator, Notifier, ValidationError, ValidationRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Canned validator keyed by address; unknown addresses fail with HTTP 500
#[derive(Default)]
pub struct FakeValidator {
    pub responses: HashMap<String, Result<Value, ValidationError>>,
    pub delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeValidator {
    pub fn with(mut self, email: &str, response: Result<Value, ValidationError>) -> Self {
        self.responses.insert(email.to_string(), response);
        self
    }

    pub fn delayed(mut self, email: &str, delay: Duration) -> Self {
        self.delays.insert(email.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailValidator for FakeValidator {
    async fn validate(&self, email: &str) -> Result<ValidationRecord, ValidationError> {
        self.calls.lock().unwrap().push(email.to_string());
        if let Some(delay) = self.delays.get(email) {
            tokio::time::sleep(*delay).await;
        }
        match self.responses.get(email) {
            Some(Ok(value)) => Ok(ValidationRecord::from_value(value.clone()).unwrap()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ValidationError::HttpStatus { status: 500 }),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
    }
}
