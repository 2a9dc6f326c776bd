//! Outbound mail for password reset links and contact notifications.
//!
//! When no SMTP host is configured the mailer logs the message body instead
//! of sending, which keeps local development working without a relay.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

/// Sends plain text mail through the configured SMTP relay.
pub struct Mailer {
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Sends the password reset link to a user.
    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<()> {
        let body = format!(
            "You requested a password reset.\n\n\
             Follow this link to choose a new password:\n\n{reset_url}\n\n\
             If this was not you, ignore this message and your password stays unchanged."
        );
        self.send(to_email, "Password reset", &body).await
    }

    /// Notifies the site owner about a new contact form message.
    pub async fn send_contact_notification(
        &self,
        from_name: &str,
        from_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let text = format!("From: {from_name} <{from_email}>\n\n{body}");
        let subject = format!("Contact form: {subject}");
        self.send(&self.config.from, &subject, &text).await
    }

    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let Some(smtp_host) = self.config.smtp_host.as_deref() else {
            tracing::info!(to = %to_email, subject = %subject, "No SMTP host configured, logging mail instead");
            tracing::info!("{}", body);
            return Ok(());
        };

        let email = Message::builder()
            .from(
                self.config
                    .from
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.smtp_port);

        if let (Some(username), Some(password)) = (
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        ) {
            transport = transport.credentials(Credentials::new(username, password));
        }

        transport
            .build()
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}
