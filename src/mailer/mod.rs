use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_stack::{Report, Result, ResultExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::config;

mod brevo;
mod recipient;
pub mod templates;

pub use self::brevo::BrevoTransport;
pub use self::recipient::{normalize_recipients, Recipient};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("{0}")]
    InvalidRecipient(&'static str),
    #[error("Email service not configured")]
    ServiceUnavailable,
    #[error("Failed to deliver email")]
    UpstreamFailure,
}

/// Failure reported by a [`MailTransport`]. It stays inside the report
/// after [`Mailer::deliver`] turns it into [`Error::UpstreamFailure`].
#[derive(Debug, Clone, ThisError)]
#[error("Mail provider rejected the message: {message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub body: Option<Value>,
    pub message: String,
}

#[derive(Debug, ThisError)]
#[error("Failed to set up mail transport")]
pub struct SetupError;

/// The wire payload of a single transactional email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingEmail {
    pub subject: String,
    pub html_content: String,
    pub sender: Sender,
    pub to: Vec<Recipient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

impl Sender {
    #[must_use]
    pub fn from_config(cfg: &config::Mailer) -> Self {
        Self {
            email: cfg.sender_email.clone(),
            name: cfg.sender_name.clone(),
        }
    }
}

#[async_trait]
pub trait MailTransport: std::fmt::Debug + Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError>;
}

/// Input of [`Mailer::deliver`]. `to` takes any shape accepted by
/// [`normalize_recipients`].
#[derive(Debug, Clone)]
pub struct Email {
    pub to: Value,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct OtpEmail {
    pub to: Value,
    pub code: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PasswordResetEmail {
    pub to: Value,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct FollowNotification {
    pub to: Value,
    pub follower_name: String,
}

/// Transactional email sender shared by the whole app.
///
/// Whether delivery is possible is decided once, at construction. A mailer
/// built without a transport refuses every message with
/// [`Error::ServiceUnavailable`] and never touches the network.
#[derive(Debug, Clone)]
pub struct Mailer {
    sender: Sender,
    transport: Option<Arc<dyn MailTransport>>,
}

impl Mailer {
    pub const OTP_SUBJECT: &'static str = "ShabdSetu - Email verification code";
    pub const PASSWORD_RESET_SUBJECT: &'static str = "ShabdSetu - Password reset code";
    pub const FOLLOW_NOTIFICATION_SUBJECT: &'static str = "ShabdSetu - You have a new follower";

    #[must_use]
    pub fn new(sender: Sender, transport: Option<Arc<dyn MailTransport>>) -> Self {
        Self { sender, transport }
    }

    #[tracing::instrument(skip_all, name = "mailer.setup")]
    pub fn from_config(cfg: &config::Mailer) -> Result<Self, SetupError> {
        let sender = Sender::from_config(cfg);
        let api_key = cfg.api_key.clone().filter(|v| !v.as_str().trim().is_empty());
        let Some(api_key) = api_key else {
            tracing::warn!("Mailer API key is missing; email delivery is disabled");
            return Ok(Self::new(sender, None));
        };

        let transport = BrevoTransport::new(api_key, cfg.api_base_url.as_ref())?;
        tracing::debug!(endpoint = %transport.endpoint_url(), "using Brevo mail transport");

        let transport: Arc<dyn MailTransport> = Arc::new(transport);
        Ok(Self::new(sender, Some(transport)))
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    #[must_use]
    pub fn sender(&self) -> &Sender {
        &self.sender
    }
}

impl Mailer {
    #[tracing::instrument(skip_all, name = "mailer.deliver", fields(subject = %email.subject))]
    pub async fn deliver(&self, email: Email) -> Result<(), Error> {
        let Some(transport) = self.transport.as_ref() else {
            tracing::error!("Email service not configured: mailer API key missing");
            return Err(Report::new(Error::ServiceUnavailable));
        };

        let message = OutgoingEmail {
            subject: email.subject,
            html_content: email.html,
            sender: self.sender.clone(),
            to: normalize_recipients(&email.to)?,
        };

        transport.send(&message).await.map_err(|report| {
            let error = report.current_context();
            tracing::error!(
                transport = transport.name(),
                status = ?error.status,
                body = ?error.body,
                "{}",
                error.message,
            );
            report.change_context(Error::UpstreamFailure)
        })
    }

    pub async fn send_otp_email(&self, request: OtpEmail) -> Result<(), Error> {
        let expiry_notice = request.expires_at.map_or_else(String::new, |at| {
            format!(
                "This code expires at {} UTC.",
                at.format("%Y-%m-%d %H:%M")
            )
        });

        let html = templates::VERIFICATION_EMAIL
            .replace(
                templates::VERIFICATION_CODE_PLACEHOLDER,
                &templates::escape_html(&request.code),
            )
            .replace(templates::EXPIRY_NOTICE_PLACEHOLDER, &expiry_notice);

        self.deliver(Email {
            to: request.to,
            subject: Self::OTP_SUBJECT.to_string(),
            html,
        })
        .await
    }

    pub async fn send_password_reset_email(&self, request: PasswordResetEmail) -> Result<(), Error> {
        let html = templates::PASSWORD_RESET_EMAIL.replace(
            templates::VERIFICATION_CODE_PLACEHOLDER,
            &templates::escape_html(&request.code),
        );

        self.deliver(Email {
            to: request.to,
            subject: Self::PASSWORD_RESET_SUBJECT.to_string(),
            html,
        })
        .await
    }

    pub async fn send_follow_notification(
        &self,
        request: FollowNotification,
    ) -> Result<(), Error> {
        let html = templates::FOLLOW_NOTIFICATION_EMAIL.replace(
            templates::FOLLOWER_NAME_PLACEHOLDER,
            &templates::escape_html(&request.follower_name),
        );

        self.deliver(Email {
            to: request.to,
            subject: Self::FOLLOW_NOTIFICATION_SUBJECT.to_string(),
            html,
        })
        .await
        .attach_printable("could not notify followed user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingTransport;
    use crate::util::Sensitive;
    use serde_json::json;

    fn build_mailer(transport: &Arc<RecordingTransport>) -> Mailer {
        let sender = Sender {
            email: "test@shabdsetu.app".into(),
            name: "ShabdSetu".into(),
        };
        let transport: Arc<dyn MailTransport> = transport.clone();
        Mailer::new(sender, Some(transport))
    }

    #[tokio::test]
    async fn should_send_otp_email() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = build_mailer(&transport);

        mailer
            .send_otp_email(OtpEmail {
                to: json!("test@example.com"),
                code: "123456".into(),
                expires_at: Some(Utc::now()),
            })
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("verification"));
        assert!(sent[0].html_content.contains("123456"));
        assert!(!sent[0].html_content.contains("{verificationCode}"));
        assert_eq!(sent[0].to, vec![Recipient::new("test@example.com")]);
        assert_eq!(sent[0].sender.email, "test@shabdsetu.app");
    }

    #[tokio::test]
    async fn should_send_password_reset_email() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = build_mailer(&transport);

        mailer
            .send_password_reset_email(PasswordResetEmail {
                to: json!([{ "email": "reset@example.com", "name": "Reset User" }]),
                code: "654321".into(),
            })
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("Password reset"));
        assert!(sent[0].html_content.contains("654321"));
        assert_eq!(
            serde_json::to_value(&sent[0]).unwrap()["to"],
            json!([{ "email": "reset@example.com", "name": "Reset User" }])
        );
    }

    #[tokio::test]
    async fn should_refuse_without_transport() {
        let mailer = Mailer::new(
            Sender {
                email: "test@shabdsetu.app".into(),
                name: "ShabdSetu".into(),
            },
            None,
        );
        assert!(!mailer.is_enabled());

        let report = mailer
            .send_otp_email(OtpEmail {
                to: json!("test@test.com"),
                code: "123456".into(),
                expires_at: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            report.current_context(),
            Error::ServiceUnavailable
        ));
    }

    #[tokio::test]
    async fn should_keep_transport_error_in_report() {
        let transport = Arc::new(RecordingTransport::failing(TransportError {
            status: Some(401),
            body: Some(json!({ "message": "Invalid API key" })),
            message: "Invalid API key".into(),
        }));
        let mailer = build_mailer(&transport);

        let report = mailer
            .deliver(Email {
                to: json!("fail@test.com"),
                subject: "subject".into(),
                html: "<p>hi</p>".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(report.current_context(), Error::UpstreamFailure));
        let cause = report.downcast_ref::<TransportError>().unwrap();
        assert_eq!(cause.status, Some(401));
        assert_eq!(cause.message, "Invalid API key");
    }

    #[tokio::test]
    async fn should_not_send_to_invalid_recipients() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = build_mailer(&transport);

        let report = mailer
            .deliver(Email {
                to: Value::Null,
                subject: "subject".into(),
                html: "<p>hi</p>".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            report.current_context(),
            Error::InvalidRecipient(..)
        ));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn should_build_disabled_mailer_without_api_key() {
        let mailer = Mailer::from_config(&config::Mailer::default()).unwrap();
        assert!(!mailer.is_enabled());
        assert_eq!(mailer.sender().email, config::Mailer::DEFAULT_SENDER_EMAIL);
    }

    #[test]
    fn should_build_disabled_mailer_with_blank_api_key() {
        let cfg = config::Mailer {
            api_key: Some(Sensitive::new("   ".to_string())),
            ..Default::default()
        };
        let mailer = Mailer::from_config(&cfg).unwrap();
        assert!(!mailer.is_enabled());
    }
}
