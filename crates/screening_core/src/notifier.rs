//! Operator alerts for suspicious addresses
//!
//! Alerts are best-effort: delivery failures are logged and swallowed, and
//! never fail the request that triggered them.

use crate::{record::ValidationRecord, NotificationError, SmtpConfig};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info, warn};

/// Subject line of the consolidated bulk alert
pub const BULK_ALERT_SUBJECT: &str = "Bulk Processed Suspicious Emails";

/// Sink for operator alerts
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one plain-text alert. Never fails from the caller's point of view.
    async fn notify(&self, subject: &str, body: &str);
}

/// A composed alert message
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

impl Alert {
    /// Alert for one suspicious address from the single-email form
    pub fn suspicious_email(email: &str, record: &ValidationRecord) -> Self {
        Self {
            subject: format!("Suspicious Email Detected: {}", email),
            body: record.to_string(),
        }
    }

    /// One alert covering every suspicious address of a bulk job
    pub fn bulk<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a ValidationRecord)>,
    {
        let body = entries
            .into_iter()
            .map(|(email, record)| format!("{}\n{}", email, record))
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            subject: BULK_ALERT_SUBJECT.to_string(),
            body,
        }
    }
}

/// Parse a configured sender or recipient address
pub fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    Ok(address.parse()?)
}

/// Sends alerts through an SMTP relay using STARTTLS and password auth
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl SmtpNotifier {
    /// Prepare the relay transport and parse the configured addresses.
    /// No connection is opened until an alert is sent.
    pub fn new(config: &SmtpConfig) -> Result<Self, NotificationError> {
        let sender = parse_mailbox(&config.sender)?;
        let recipient = parse_mailbox(&config.recipient)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        info!(
            "SMTP notifier configured for {}:{} -> {}",
            config.host, config.port, recipient
        );

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotificationError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        Ok(message)
    }

    /// Send one alert, reporting failures to the caller
    pub async fn try_notify(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        let message = self.build_message(subject, body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        match self.try_notify(subject, body).await {
            Ok(()) => info!("Suspicious email sent: {}", subject),
            Err(e) => error!("Failed to send email: {}", e),
        }
    }
}

/// Used when alerting is switched off; records the skipped alert in the log
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, subject: &str, _body: &str) {
        warn!("{}; skipping alert: {}", NotificationError::NotConfigured, subject);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 1,
            username: "alerts@example.com".to_string(),
            password: "app-password".to_string(),
            sender: "alerts@example.com".to_string(),
            recipient: "operator@example.com".to_string(),
        }
    }

    fn record(value: serde_json::Value) -> ValidationRecord {
        ValidationRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_single_alert_text() {
        let alert = Alert::suspicious_email("bad@example.com", &record(json!({"fraud_score": 90})));
        assert_eq!(alert.subject, "Suspicious Email Detected: bad@example.com");
        assert_eq!(alert.body, r#"{"fraud_score":90}"#);
    }

    #[test]
    fn test_bulk_alert_joins_entries_with_blank_line() {
        let first = record(json!({"disposable": true}));
        let second = record(json!({"fraud_score": 99}));
        let alert = Alert::bulk([("a@example.com", &first), ("b@example.com", &second)]);

        assert_eq!(alert.subject, BULK_ALERT_SUBJECT);
        assert_eq!(
            alert.body,
            "a@example.com\n{\"disposable\":true}\n\nb@example.com\n{\"fraud_score\":99}"
        );
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let mut config = smtp_config();
        config.recipient = "not an address".to_string();
        assert!(matches!(
            SmtpNotifier::new(&config),
            Err(NotificationError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_message_is_plain_text_to_operator() {
        let notifier = SmtpNotifier::new(&smtp_config()).unwrap();
        let message = notifier.build_message("Subject line", "body text").unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("From: alerts@example.com"));
        assert!(formatted.contains("To: operator@example.com"));
        assert!(formatted.contains("Subject: Subject line"));
        assert!(formatted.contains("Content-Type: text/plain"));
        assert!(formatted.contains("body text"));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported_but_swallowed_by_notify() {
        let notifier = SmtpNotifier::new(&smtp_config()).unwrap();

        let result = notifier.try_notify("subject", "body").await;
        assert!(matches!(result, Err(NotificationError::Transport(_))));

        // Must return normally
        notifier.notify("subject", "body").await;
    }
}
