//! Outbound e-mail. Sends run on a spawned task; callers get the handle and
//! may ignore it. A failed send is logged and surfaces through the handle.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use configs::MailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {0}")]
    Address(String),
    #[error("message build failed: {0}")]
    Build(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Send on a background task.
pub fn dispatch(
    mailer: Arc<dyn Mailer>,
    to: String,
    subject: String,
    body: String,
) -> JoinHandle<Result<(), MailError>> {
    tokio::spawn(async move {
        let outcome = mailer.send_email(&to, &subject, &body).await;
        if let Err(e) = &outcome {
            warn!(to = %to, subject = %subject, error = %e, "email_send_failed");
        }
        outcome
    })
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = cfg.from.parse().map_err(|_| MailError::Address(cfg.from.clone()))?;
        let builder = if cfg.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.smtp_host)
        };
        let builder = builder.port(cfg.smtp_port);
        let transport = if cfg.username.is_empty() {
            builder.build()
        } else {
            builder
                .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
                .build()
        };
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let to_box: Mailbox = to.parse().map_err(|_| MailError::Address(to.to_string()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to_box)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        info!(to = %to, subject = %subject, "email_sent");
        Ok(())
    }
}

/// Logs instead of sending; used when no SMTP host is configured.
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        info!(to = %to, subject = %subject, "email_logged");
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Keeps every message in memory.
#[derive(Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if !to.contains('@') {
            return Err(MailError::Address(to.to_string()));
        }
        let mut sent = self.sent.lock().map_err(|_| MailError::Transport("outbox lock poisoned".into()))?;
        sent.push(OutgoingMail { to: to.into(), subject: subject.into(), body: body.into() });
        Ok(())
    }
}

/// SMTP when a host is configured, otherwise log only.
pub fn from_config(cfg: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    if cfg.is_enabled() {
        Ok(Arc::new(SmtpMailer::new(cfg)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_reports_through_the_handle() {
        let outbox = OutboxMailer::new();
        let mailer: Arc<dyn Mailer> = Arc::new(outbox.clone());

        let ok = dispatch(mailer.clone(), "a@example.com".into(), "Hi".into(), "Body".into()).await;
        assert!(matches!(ok, Ok(Ok(()))));
        let bad = dispatch(mailer, "nobody".into(), "Hi".into(), "Body".into()).await;
        assert!(matches!(bad, Ok(Err(MailError::Address(_)))));

        assert_eq!(outbox.sent().len(), 1);
        assert_eq!(outbox.sent()[0].to, "a@example.com");
    }

    #[tokio::test]
    async fn smtp_mailer_builds_from_config() {
        let cfg = MailConfig {
            smtp_host: "localhost".into(),
            smtp_port: 1025,
            username: String::new(),
            password: String::new(),
            from: "ERP <noreply@example.com>".into(),
            use_tls: false,
        };
        assert!(SmtpMailer::new(&cfg).is_ok());
        let bad = MailConfig { from: "not an address".into(), ..cfg };
        assert!(matches!(SmtpMailer::new(&bad), Err(MailError::Address(_))));
    }
}
