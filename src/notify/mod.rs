/*!
 * Notification Dispatcher
 * Templated messages through an external email API
 */
pub mod emailjs;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::{collections::VecDeque, sync::Arc, time::Duration};
use tokio::sync::RwLock;

use crate::config::EmailConfig;

pub use emailjs::EmailJsTransport;

/// How many delivery failures are kept for operators.
const FAILURE_HISTORY: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("email service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email service rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// One templated email, independent of the provider's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub template_id: String,
    pub template_params: Value,
    /// Send the private access token along with the public key.
    pub include_access_token: bool,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Otp,
    Contact,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryFailure {
    pub kind: MessageKind,
    pub recipient: String,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// A contact form submission, already validated.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: String,
}

pub struct Notifier {
    transport: Arc<dyn EmailTransport>,
    otp_template_id: String,
    contact_template_id: String,
    contact_email: String,
    timeout: Duration,
    failures: RwLock<VecDeque<DeliveryFailure>>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn EmailTransport>, config: &EmailConfig) -> Self {
        Self {
            transport,
            otp_template_id: config.otp_template_id.clone(),
            contact_template_id: config.contact_template_id.clone(),
            contact_email: config.contact_email.clone(),
            timeout: config.timeout,
            failures: RwLock::new(VecDeque::with_capacity(FAILURE_HISTORY)),
        }
    }

    async fn dispatch(&self, message: &EmailMessage) -> Result<(), DispatchError> {
        match tokio::time::timeout(self.timeout, self.transport.send(message)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        }
    }

    async fn record_failure(&self, kind: MessageKind, recipient: &str, error: &DispatchError) {
        let mut failures = self.failures.write().await;
        if failures.len() == FAILURE_HISTORY {
            failures.pop_front();
        }
        failures.push_back(DeliveryFailure {
            kind,
            recipient: recipient.to_string(),
            error: error.to_string(),
            at: Utc::now(),
        });
    }

    /// Deliver an admin login code. Any failure is returned to the caller.
    pub async fn send_otp(
        &self,
        to_email: &str,
        code: &str,
        username: &str,
    ) -> Result<(), DispatchError> {
        let message = EmailMessage {
            template_id: self.otp_template_id.clone(),
            template_params: json!({
                "to_email": to_email,
                "otp_code": code,
                "user_name": username,
            }),
            include_access_token: true,
        };

        match self.dispatch(&message).await {
            Ok(()) => {
                tracing::info!(to = %to_email, "OTP email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(to = %to_email, error = %e, "OTP email delivery failed");
                self.record_failure(MessageKind::Otp, to_email, &e).await;
                Err(e)
            }
        }
    }

    /// Forward a contact form submission. Failures are logged and recorded,
    /// never returned: the submitter always sees a success notice.
    pub async fn send_contact(&self, contact: &ContactMessage) {
        let message = EmailMessage {
            template_id: self.contact_template_id.clone(),
            template_params: json!({
                "name": contact.name,
                "email": contact.email,
                "message": contact.message,
                "timestamp": contact.timestamp,
                "to_email": self.contact_email,
            }),
            include_access_token: false,
        };

        match self.dispatch(&message).await {
            Ok(()) => tracing::info!(
                name = %contact.name,
                email = %contact.email,
                timestamp = %contact.timestamp,
                "contact form submitted"
            ),
            Err(e) => {
                tracing::error!(
                    name = %contact.name,
                    email = %contact.email,
                    error = %e,
                    "contact form email delivery failed"
                );
                self.record_failure(MessageKind::Contact, &self.contact_email, &e)
                    .await;
            }
        }
    }

    /// Oldest first.
    pub async fn recent_failures(&self) -> Vec<DeliveryFailure> {
        self.failures.read().await.iter().cloned().collect()
    }
}
