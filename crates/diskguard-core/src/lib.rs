//! Core types shared by the diskguard crates
//!
//! Holds the seams diskguard is wired through: the email notification
//! service and the error reporter used for telemetry.

pub mod notifications;
pub mod telemetry;

pub use notifications::{
    DynNotificationService, EmailMessage, NotificationError, NotificationService,
};
pub use telemetry::{DynErrorReporter, ErrorReporter, ReportLevel};
