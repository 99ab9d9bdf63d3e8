//! Threshold-based suspicious verdict
//!
//! A record is suspicious when any of the disposable, spam-trap or
//! recent-abuse flags is set, or when the fraud score exceeds
//! [`FRAUD_SCORE_THRESHOLD`].

use crate::record::{RiskSignals, ValidationRecord};

/// Fraud scores strictly above this value are suspicious
pub const FRAUD_SCORE_THRESHOLD: f64 = 75.0;

/// Classify a validation record
pub fn is_suspicious(record: &ValidationRecord) -> bool {
    record.signals().is_suspicious()
}

impl RiskSignals {
    pub fn is_suspicious(&self) -> bool {
        self.disposable
            || self.spam_trap
            || self.recent_abuse
            || self.fraud_score > FRAUD_SCORE_THRESHOLD
    }
}
