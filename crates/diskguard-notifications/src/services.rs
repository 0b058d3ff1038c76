use async_trait::async_trait;
use diskguard_config::SmtpSettings;
use diskguard_core::{EmailMessage, NotificationError, NotificationService};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use tracing::debug;

/// Upper bound for the whole SMTP conversation
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends plaintext email through an SMTP submission server
///
/// Uses STARTTLS when the server offers it and authenticates with PLAIN
/// when a username is configured.
#[derive(Debug, Clone)]
pub struct SmtpNotificationService {
    smtp: SmtpSettings,
    timeout: Duration,
}

impl SmtpNotificationService {
    pub fn new(smtp: SmtpSettings) -> Self {
        Self {
            smtp,
            timeout: DEFAULT_SMTP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the `From`/`To`/`Subject` plaintext message
    pub fn build_message(&self, message: &EmailMessage) -> Result<Message, NotificationError> {
        let from: Mailbox = self.smtp.from.parse().map_err(|e| {
            NotificationError::ConfigurationError(format!(
                "invalid SMTP_FROM {:?}: {}",
                self.smtp.from, e
            ))
        })?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| NotificationError::InvalidRecipient(format!("{:?}: {}", message.to, e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| NotificationError::SendError(e.to_string()))
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        if self.smtp.host.is_empty() {
            return Err(NotificationError::ConfigurationError(
                "SMTP_HOST is not set".to_string(),
            ));
        }
        let port = self
            .smtp
            .port()
            .map_err(|e| NotificationError::ConfigurationError(e.to_string()))?;

        let tls = TlsParameters::new(self.smtp.host.clone())
            .map_err(|e| NotificationError::ConfigurationError(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.smtp.host)
            .port(port)
            .tls(Tls::Opportunistic(tls))
            .timeout(Some(self.timeout));

        if !self.smtp.username.is_empty() {
            builder = builder
                .credentials(Credentials::new(
                    self.smtp.username.clone(),
                    self.smtp.password.clone(),
                ))
                .authentication(vec![Mechanism::Plain]);
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl NotificationService for SmtpNotificationService {
    async fn send_email(&self, message: EmailMessage) -> Result<(), NotificationError> {
        let email = self.build_message(&message)?;
        let mailer = self.build_transport()?;

        debug!(
            "Submitting email to {}:{} for {}",
            self.smtp.host, self.smtp.port, message.to
        );

        mailer
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| NotificationError::SendError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_settings(host: &str, port: &str) -> SmtpSettings {
        SmtpSettings {
            from: "diskguard@example.com".to_string(),
            username: "diskguard".to_string(),
            password: "secret".to_string(),
            host: host.to_string(),
            port: port.to_string(),
        }
    }

    fn alert() -> EmailMessage {
        EmailMessage::new(
            "ops@example.com",
            "[web-01]DISK SPACE FULL",
            "You are currently using 90.000000% of your available memory",
        )
    }

    #[test]
    fn test_build_message_is_plaintext() {
        let service = SmtpNotificationService::new(smtp_settings("smtp.example.com", "587"));
        let message = service.build_message(&alert()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: diskguard@example.com"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: [web-01]DISK SPACE FULL"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(raw.contains("You are currently using 90.000000% of your available memory"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let service = SmtpNotificationService::new(smtp_settings("smtp.example.com", "587"));
        let mut message = alert();
        message.to = "not an address".to_string();

        let err = service.build_message(&message).unwrap_err();
        assert!(matches!(err, NotificationError::InvalidRecipient(_)));
    }

    #[test]
    fn test_build_message_rejects_bad_sender() {
        let mut smtp = smtp_settings("smtp.example.com", "587");
        smtp.from = String::new();

        let err = SmtpNotificationService::new(smtp)
            .build_message(&alert())
            .unwrap_err();
        assert!(matches!(err, NotificationError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_send_without_host_fails() {
        let service = SmtpNotificationService::new(smtp_settings("", "587"));

        let err = service.send_email(alert()).await.unwrap_err();
        assert!(err.to_string().contains("SMTP_HOST"));
    }

    #[tokio::test]
    async fn test_send_with_invalid_port_fails() {
        let service = SmtpNotificationService::new(smtp_settings("smtp.example.com", "smtp"));

        let err = service.send_email(alert()).await.unwrap_err();
        assert!(matches!(err, NotificationError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_send_to_closed_port_fails() {
        // Grab a free port and release it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let service = SmtpNotificationService::new(smtp_settings("127.0.0.1", &port.to_string()))
            .with_timeout(Duration::from_secs(5));

        let err = service.send_email(alert()).await.unwrap_err();
        assert!(matches!(err, NotificationError::SendError(_)));
    }
}
