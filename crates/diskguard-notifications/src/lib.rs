//! Alert delivery over SMTP

mod services;

pub use services::{SmtpNotificationService, DEFAULT_SMTP_TIMEOUT};
