use async_trait::async_trait;
use derive_more::Display;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::BTreeSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::services::report::ReportArtifact;

pub const REPORT_SUBJECT: &str = "Attendance Report";
pub const REPORT_BODY: &str = "Please find attached the attendance report.";
pub const REPORT_MIME: &str = "application/pdf";

#[derive(Debug, Display)]
pub enum MailError {
    #[display(fmt = "mail transport is not configured")]
    NotConfigured,

    #[display(fmt = "no recipients")]
    NoRecipients,

    #[display(fmt = "invalid address {}", _0)]
    Address(String),

    #[display(fmt = "failed to build message: {}", _0)]
    Build(String),

    #[display(fmt = "transport error: {}", _0)]
    Transport(String),
}

impl std::error::Error for MailError {}

/// Outbound delivery of a rendered report.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    async fn send_report(
        &self,
        artifact: &ReportArtifact,
        recipients: &BTreeSet<String>,
    ) -> Result<(), MailError>;
}

/// Sends the report and swallows any failure.
///
/// `false` means the report exists on disk but nobody received it.
pub async fn dispatch(
    mailer: &dyn ReportMailer,
    artifact: &ReportArtifact,
    recipients: &BTreeSet<String>,
) -> bool {
    if recipients.is_empty() {
        warn!(report = %artifact.file_name, "No report recipients configured");
        return false;
    }

    match mailer.send_report(artifact, recipients).await {
        Ok(()) => {
            info!(
                report = %artifact.file_name,
                recipients = recipients.len(),
                "Report emailed"
            );
            true
        }
        Err(e) => {
            error!(error = %e, report = %artifact.file_name, "Failed to email report");
            false
        }
    }
}

pub fn build_message(
    from: &str,
    artifact: &ReportArtifact,
    recipients: &BTreeSet<String>,
) -> Result<Message, MailError> {
    if recipients.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let from: Mailbox = from
        .parse()
        .map_err(|_| MailError::Address(from.to_string()))?;

    let mut builder = Message::builder().from(from).subject(REPORT_SUBJECT);
    for recipient in recipients {
        let to: Mailbox = recipient
            .parse()
            .map_err(|_| MailError::Address(recipient.clone()))?;
        builder = builder.to(to);
    }

    let content_type =
        ContentType::parse(REPORT_MIME).map_err(|e| MailError::Build(e.to_string()))?;

    builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(REPORT_BODY.to_string()))
                .singlepart(
                    Attachment::new(artifact.file_name.clone())
                        .body(artifact.bytes.clone(), content_type),
                ),
        )
        .map_err(|e| MailError::Build(e.to_string()))
}

/// SMTP over STARTTLS, built once at startup and shared by every request.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Self, MailError> {
        let host = config.smtp_host.as_deref().ok_or(MailError::NotConfigured)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.mail_from.clone(),
        })
    }
}

#[async_trait]
impl ReportMailer for SmtpMailer {
    async fn send_report(
        &self,
        artifact: &ReportArtifact,
        recipients: &BTreeSet<String>,
    ) -> Result<(), MailError> {
        let message = build_message(&self.from, artifact, recipients)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Stand-in when no SMTP host is configured; every send fails.
pub struct DisabledMailer;

#[async_trait]
impl ReportMailer for DisabledMailer {
    async fn send_report(
        &self,
        _artifact: &ReportArtifact,
        _recipients: &BTreeSet<String>,
    ) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}
