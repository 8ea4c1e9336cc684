// Digest delivery. One notifier per configured transport; a failed send is
// a recoverable signal reported to the caller, never a crash.

use crate::config::{EmailTransportConfig, TransportConfig, WebhookTransportConfig};
use crate::models::Summary;
use crate::report::round2;
use chrono::Local;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request: {0}")]
    Http(#[from] reqwest::Error),
    #[error("smtp transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("email build: {0}")]
    EmailBuild(#[from] lettre::error::Error),
    #[error("email address: {0}")]
    Address(#[from] lettre::address::AddressError),
}

pub enum Notifier {
    Email(EmailNotifier),
    Webhook(WebhookNotifier),
}

impl Notifier {
    pub fn from_config(transport: &TransportConfig) -> Result<Self, NotifyError> {
        match transport {
            TransportConfig::Email(cfg) => Ok(Notifier::Email(EmailNotifier::new(cfg.clone())?)),
            TransportConfig::Webhook(cfg) => {
                Ok(Notifier::Webhook(WebhookNotifier::new(cfg.clone())?))
            }
        }
    }

    #[instrument(skip(self, summary), fields(operation = "send_digest", period = period_label))]
    pub async fn send_digest(
        &self,
        summary: &Summary,
        record_count: usize,
        period_label: &str,
    ) -> Result<(), NotifyError> {
        match self {
            Notifier::Email(email) => email.send_digest(summary, period_label).await,
            Notifier::Webhook(webhook) => {
                webhook.send_digest(summary, record_count, period_label).await
            }
        }
    }
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(cfg: WebhookTransportConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: cfg.url,
        })
    }

    async fn send_digest(
        &self,
        summary: &Summary,
        record_count: usize,
        period_label: &str,
    ) -> Result<(), NotifyError> {
        let payload = json!({
            "timestamp": Local::now().to_rfc3339(),
            "period": period_label,
            "total_records": record_count,
            "summary": crate::report::summary_json(summary),
        });
        let response = self.client.post(&self.url).json(&payload).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Addresses and relay settings are resolved here, so a bad email
    /// config fails at startup rather than at the first digest.
    pub fn new(cfg: EmailTransportConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = cfg.from_email.parse()?;
        let to: Mailbox = cfg.to_email.parse()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
            .port(cfg.smtp_port);
        if let (Some(user), Some(password)) = (&cfg.smtp_user, &cfg.smtp_password) {
            if !user.is_empty() {
                builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
            }
        }
        Ok(Self {
            mailer: builder.build(),
            from,
            to,
        })
    }

    async fn send_digest(&self, summary: &Summary, period_label: &str) -> Result<(), NotifyError> {
        let subject = format!("SysPulse Daily Digest - {}", Local::now().format("%Y-%m-%d"));
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .body(format_digest_text(summary, period_label))?;
        self.mailer.send(message).await?;
        Ok(())
    }
}

/// Plain-text digest body, values rounded to two decimals.
pub fn format_digest_text(summary: &Summary, period_label: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("SysPulse Daily Digest".into());
    lines.push("=".repeat(50));
    lines.push(format!("Date: {}", Local::now().format("%Y-%m-%d")));
    lines.push(format!("Period: {}", period_label));
    lines.push(String::new());
    lines.push("System Statistics Summary:".into());
    lines.push("-".repeat(50));

    for (label, stat) in [
        ("CPU Usage", &summary.cpu),
        ("Memory Usage", &summary.memory),
        ("Disk Usage", &summary.disk),
    ] {
        lines.push(format!("{}:", label));
        lines.push(format!("  Average: {}%", round2(stat.avg)));
        lines.push(format!("  Minimum: {}%", round2(stat.min)));
        lines.push(format!("  Maximum: {}%", round2(stat.max)));
        lines.push(String::new());
    }

    if let (Some(avg), Some(min), Some(max)) =
        (summary.network.avg, summary.network.min, summary.network.max)
    {
        lines.push("Network Latency:".into());
        lines.push(format!("  Average: {}ms", round2(avg)));
        lines.push(format!("  Minimum: {}ms", round2(min)));
        lines.push(format!("  Maximum: {}ms", round2(max)));
        lines.push(String::new());
    }

    lines.push("=".repeat(50));
    lines.push("Generated by SysPulse".into());
    lines.join("\n")
}
