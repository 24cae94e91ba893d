use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fs;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

use crate::config::MailConfig;
use crate::models::DeliveryOutcome;

/// SMTP replies that mean the relay rejected our credentials.
const AUTH_REPLY_CODES: [&str; 3] = ["530", "534", "535"];

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Unexpected(String),
}

/// Sends one fully built message.
pub trait MailTransport: Send + Sync {
    fn send(&self, message: &Message) -> Result<(), DeliveryError>;
}

/// Authenticated STARTTLS session against the configured relay.
pub struct SmtpRelay {
    transport: SmtpTransport,
}

impl SmtpRelay {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(config.sender.email.to_string(), config.password.clone());
        let transport = SmtpTransport::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { transport })
    }
}

impl MailTransport for SmtpRelay {
    fn send(&self, message: &Message) -> Result<(), DeliveryError> {
        Transport::send(&self.transport, message)
            .map(|_| ())
            .map_err(|e| {
                let code = e.status().map(|c| c.to_string());
                if code.as_deref().is_some_and(is_auth_code) {
                    DeliveryError::Auth(e.to_string())
                } else if e.is_client() {
                    DeliveryError::Unexpected(e.to_string())
                } else {
                    DeliveryError::Transport(e.to_string())
                }
            })
    }
}

fn is_auth_code(code: &str) -> bool {
    AUTH_REPLY_CODES.contains(&code)
}

/// Packages reports as mail attachments and classifies how delivery went.
pub struct Dispatcher {
    mail: MailConfig,
    transport: Box<dyn MailTransport>,
}

impl Dispatcher {
    pub fn new(mail: MailConfig, transport: Box<dyn MailTransport>) -> Self {
        Self { mail, transport }
    }

    /// Sends `report` once. Failures are logged and returned as an outcome, never retried.
    pub fn deliver(&self, report: &Path, label: &str) -> DeliveryOutcome {
        let started = Instant::now();

        let message = match self.build_message(report, label) {
            Ok(m) => m,
            Err(e) => {
                log::error!("❌ Unexpected error preparing email: {:#}", e);
                return DeliveryOutcome::UnexpectedFailure;
            }
        };

        match self.transport.send(&message) {
            Ok(()) => {
                log::info!(
                    "📧 Email sent successfully in {:.2} seconds",
                    started.elapsed().as_secs_f64()
                );
                DeliveryOutcome::Delivered
            }
            Err(DeliveryError::Auth(reason)) => {
                log::error!("❌ Email authentication failed, check your .env credentials ({})", reason);
                DeliveryOutcome::AuthFailure
            }
            Err(DeliveryError::Transport(reason)) => {
                log::error!("❌ SMTP error: {}", reason);
                DeliveryOutcome::TransportFailure
            }
            Err(DeliveryError::Unexpected(reason)) => {
                log::error!("❌ Unexpected error: {}", reason);
                DeliveryOutcome::UnexpectedFailure
            }
        }
    }

    fn build_message(&self, report: &Path, label: &str) -> anyhow::Result<Message> {
        let content = fs::read(report)
            .with_context(|| format!("Failed to read report {}", report.display()))?;
        let filename = report
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Report path {} has no usable file name", report.display()))?
            .to_string();

        let octet_stream = ContentType::parse("application/octet-stream")
            .map_err(|e| anyhow::anyhow!("Invalid attachment content type: {:?}", e))?;
        let attachment = Attachment::new(filename).body(content, octet_stream);

        Message::builder()
            .from(self.mail.sender.clone())
            .to(self.mail.recipient.clone())
            .subject(format!("Process log generated at: {}", label))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(self.body(label)))
                    .singlepart(attachment),
            )
            .context("Failed to build email")
    }

    fn body(&self, label: &str) -> String {
        format!(
            "Hello {},\n\n\
             Please find attached the system process log.\n\n\
             Report generated at: {}\n\n\
             This is an auto-generated email.\n\n\
             Regards,\n\
             Process Monitor\n",
            self.mail.recipient.email, label
        )
    }
}
