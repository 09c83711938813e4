//! Outbound account email.
//!
//! Delivery is best-effort: callers hand a message to
//! [`send_in_background`] and carry on; failures are logged.

mod smtp;
mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

pub use smtp::{SmtpMailer, SmtpSettings};
pub use templates::EmailKind;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Logs messages instead of delivering them. Used when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, "email delivery disabled, message dropped");
        Ok(())
    }
}

/// Renders account emails and hands them to a [`Mailer`] in the background.
#[derive(Clone)]
pub struct Outbox {
    mailer: Arc<dyn Mailer>,
    app_url: Url,
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox")
            .field("app_url", &self.app_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Outbox {
    pub fn new(mailer: Arc<dyn Mailer>, app_url: Url) -> Self {
        Self { mailer, app_url }
    }

    pub fn dispatch(&self, to: &str, kind: EmailKind) -> JoinHandle<()> {
        send_in_background(self.mailer.clone(), kind.render(to, &self.app_url))
    }
}

/// Send without waiting. Failures are logged and otherwise ignored.
pub fn send_in_background(mailer: Arc<dyn Mailer>, email: OutboundEmail) -> JoinHandle<()> {
    tokio::spawn(async move {
        let to = email.to.clone();
        let subject = email.subject.clone();
        if let Err(e) = mailer.send(email).await {
            warn!(to = %to, subject = %subject, error = %e, "email delivery failed");
        }
    })
}

#[cfg(test)]
pub(crate) mod memory {
    //! Recording [`Mailer`] for tests.

    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OutboundEmail>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::default(),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<OutboundEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::SendFailed("relay unavailable".into()));
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::RecordingMailer;
    use super::*;

    fn email() -> OutboundEmail {
        OutboundEmail {
            to: "jo@example.com".into(),
            subject: "hi".into(),
            html: "<p>hi</p>".into(),
        }
    }

    #[tokio::test]
    async fn background_send_delivers() {
        let mailer = Arc::new(RecordingMailer::default());
        send_in_background(mailer.clone(), email()).await.unwrap();
        assert_eq!(mailer.sent(), vec![email()]);
    }

    #[tokio::test]
    async fn background_failure_does_not_panic() {
        let mailer = Arc::new(RecordingMailer::failing());
        send_in_background(mailer.clone(), email()).await.unwrap();
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn outbox_renders_before_sending() {
        let mailer = Arc::new(RecordingMailer::default());
        let outbox = Outbox::new(mailer.clone(), Url::parse("http://localhost:3000").unwrap());
        outbox
            .dispatch("jo@example.com", EmailKind::VerifyAccount { token: "t0k".into() })
            .await
            .unwrap();
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Verify your account");
        assert!(sent[0].html.contains("token=t0k"));
    }

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        assert!(LogMailer.send(email()).await.is_ok());
    }
}
