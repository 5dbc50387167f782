/// Outbound email
///
/// The password reset flow is the only sender. Delivery goes through the
/// [`Mailer`] trait so the service can run against a transactional email HTTP
/// API in production and only log messages when no provider is configured.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::mail::{password_reset_message, HttpMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = HttpMailer::new(
///     "https://mail.example.com/v1/send".to_string(),
///     Some("api-key".to_string()),
///     "no-reply@example.com".to_string(),
/// )?;
///
/// let message = password_reset_message("https://board.example.com", "ana@example.com", "token");
/// mailer.send(&message).await?;
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Subject line of the reset email
pub const RESET_SUBJECT: &str = "Password reset";

/// Upper bound on one delivery attempt, connect included
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Request never got a response
    #[error("Mail transport failed: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Mail provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers email messages
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Builds the reset email pointing at `<frontend_url>/reset-password?token=<token>`
pub fn password_reset_message(frontend_url: &str, to: &str, token: &str) -> EmailMessage {
    let link = format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    );

    EmailMessage {
        to: to.to_string(),
        subject: RESET_SUBJECT.to_string(),
        body: format!("Follow this link to reset your password: {}", link),
    }
}

/// Posts messages as JSON to a transactional email API
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: Option<String>, from: String) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| MailError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let payload = OutboundMessage {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(to = %message.to, "Email accepted by provider");
        Ok(())
    }
}

/// Logs messages instead of sending them
///
/// Used when no provider is configured. The body carries a live reset token,
/// so only the recipient and subject are logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, "Email not sent, no mail provider configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_message_contains_link() {
        let message = password_reset_message("https://board.example.com/", "ana@example.com", "abc.def");

        assert_eq!(message.to, "ana@example.com");
        assert_eq!(message.subject, RESET_SUBJECT);
        assert!(message
            .body
            .contains("https://board.example.com/reset-password?token=abc.def"));
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_messages() {
        let message = password_reset_message("http://localhost:3000", "bo@example.com", "t");

        assert!(LogMailer.send(&message).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_mailer_reports_transport_failure() {
        // Nothing listens on port 9 (discard) on loopback in test environments.
        let mailer = HttpMailer::new(
            "http://127.0.0.1:9/send".to_string(),
            None,
            "no-reply@example.com".to_string(),
        )
        .unwrap();
        let message = password_reset_message("http://localhost", "x@example.com", "t");

        assert!(matches!(
            mailer.send(&message).await,
            Err(MailError::Transport(_))
        ));
    }
}
