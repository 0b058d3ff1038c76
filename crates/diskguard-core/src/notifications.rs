use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A plaintext email addressed to a single recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to send notification: {0}")]
    SendError(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type DynNotificationService = Arc<dyn NotificationService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_message_serialization() {
        let message = EmailMessage::new("admin@example.com", "[web-01]DISK SPACE FULL", "body");

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("admin@example.com"));

        let back: EmailMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn test_notification_error_display() {
        let err = NotificationError::SendError("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to send notification: connection refused"
        );

        let err = NotificationError::InvalidRecipient("not-an-address".to_string());
        assert!(err.to_string().contains("Invalid recipient"));
    }
}
