//! Email delivery of the rendered report.
//!
//! Uses SMTP via lettre, sending the HTML report with a plain-text
//! alternative to every configured recipient in one message.

use std::future::Future;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::{EmailConfig, SmtpSecurity};
use crate::render::RenderedReport;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Delivers a rendered report.
pub trait Mailer {
    /// Send `report` to the configured recipients.
    fn send_report(&self, report: &RenderedReport)
    -> impl Future<Output = Result<(), EmailError>>;
}

/// SMTP [`Mailer`].
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("from", &self.from.to_string())
            .field("recipients", &self.recipients.len())
            .finish_non_exhaustive()
    }
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// Implicit TLS is used unless the configuration asks for STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if an address does not parse or the relay cannot be
    /// configured.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let builder = match config.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?,
            SmtpSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
        };
        let mailer = builder
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from: parse_mailbox(&config.from_address)?,
            recipients: config
                .recipients
                .iter()
                .map(|address| parse_mailbox(address))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Build the multipart message for `report`.
    fn build_message(&self, report: &RenderedReport) -> Result<Message, EmailError> {
        build_message(&self.from, &self.recipients, report)
    }
}

impl Mailer for EmailService {
    async fn send_report(&self, report: &RenderedReport) -> Result<(), EmailError> {
        let email = self.build_message(report)?;
        self.mailer.send(email).await?;

        tracing::info!(
            recipients = self.recipients.len(),
            subject = %report.subject,
            "Email sent successfully"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

/// A plain-text and HTML alternative message addressed to every recipient.
fn build_message(
    from: &Mailbox,
    recipients: &[Mailbox],
    report: &RenderedReport,
) -> Result<Message, EmailError> {
    let mut builder = Message::builder().from(from.clone()).subject(&report.subject);
    for recipient in recipients {
        builder = builder.to(recipient.clone());
    }

    Ok(builder.multipart(
        MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(report.text.clone()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(report.html.clone()),
            ),
    )?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(security: SmtpSecurity) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
            security,
            smtp_username: "reports@example.com".to_string(),
            smtp_password: SecretString::from("hunter2-smtp"),
            from_address: "reports@example.com".to_string(),
            recipients: vec![
                "buyer@example.com".to_string(),
                "warehouse@example.com".to_string(),
            ],
        }
    }

    fn report() -> RenderedReport {
        RenderedReport {
            subject: "Stock & coverage: OPPO - 15/10/2026".to_string(),
            html: "<p>report</p>".to_string(),
            text: "report".to_string(),
        }
    }

    // The pooled transport spawns its cleanup task on the runtime.
    #[tokio::test]
    async fn test_message_addresses_every_recipient() {
        let service = EmailService::new(&config(SmtpSecurity::Tls)).unwrap();
        let message = service.build_message(&report()).unwrap();

        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 2);
        assert_eq!(
            envelope.from().map(ToString::to_string).as_deref(),
            Some("reports@example.com")
        );

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("text/plain"));
        assert!(formatted.contains("text/html"));
    }

    #[tokio::test]
    async fn test_starttls_service_builds() {
        assert!(EmailService::new(&config(SmtpSecurity::Starttls)).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let mut config = config(SmtpSecurity::Tls);
        config.recipients.push("not an address".to_string());
        let err = EmailService::new(&config).unwrap_err();
        assert!(matches!(err, EmailError::InvalidAddress(ref a) if a == "not an address"));
    }

    #[tokio::test]
    async fn test_debug_hides_password() {
        let service = EmailService::new(&config(SmtpSecurity::Tls)).unwrap();
        assert!(!format!("{service:?}").contains("hunter2"));
    }
}
