use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{DispatchError, EmailMessage, EmailTransport};
use crate::config::EmailConfig;

/// EmailJS REST API client.
pub struct EmailJsTransport {
    client: reqwest::Client,
    endpoint: String,
    service_id: String,
    public_key: String,
    access_token: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a Value,
}

impl EmailJsTransport {
    pub fn new(config: &EmailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            service_id: config.service_id.clone(),
            public_key: config.public_key.clone(),
            access_token: config.access_token.clone(),
            timeout: config.timeout,
        })
    }

    fn request<'a>(&'a self, message: &'a EmailMessage) -> SendRequest<'a> {
        let access_token = (message.include_access_token && !self.access_token.is_empty())
            .then_some(self.access_token.as_str());
        SendRequest {
            service_id: &self.service_id,
            template_id: &message.template_id,
            user_id: &self.public_key,
            access_token,
            template_params: &message.template_params,
        }
    }
}

#[async_trait]
impl EmailTransport for EmailJsTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request(message))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout(self.timeout)
                } else {
                    DispatchError::Transport(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, template = %message.template_id, "emailjs returned error");
        Err(DispatchError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
