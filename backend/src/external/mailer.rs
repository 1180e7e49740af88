//! Outbound email delivery
//!
//! [`ResendMailer`] posts messages to an HTTP mail API. [`LogMailer`] only
//! logs them and is used when no API key is configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;
use crate::error::{AppError, AppResult};

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> AppResult<()>;
}

/// Mail API request body
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Client for a Resend compatible mail API
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: String,
    endpoint: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, endpoint: String, from: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create mail client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            from,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, mail: &OutgoingMail) -> AppResult<()> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [mail.to.as_str()],
            subject: &mail.subject,
            html: &mail.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Mail API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Mail API error: {} - {}",
                status, body
            )));
        }

        tracing::debug!(to = %mail.to, subject = %mail.subject, "Email sent");
        Ok(())
    }
}

/// Mailer that writes messages to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> AppResult<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "Mail delivery disabled, message logged");
        Ok(())
    }
}

/// Build the mailer described by the configuration
pub fn mailer_from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    match config.api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => Ok(Arc::new(ResendMailer::new(
            key.to_string(),
            config.api_endpoint.clone(),
            config.from.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?)),
        None => {
            tracing::warn!("No mail API key configured, outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
