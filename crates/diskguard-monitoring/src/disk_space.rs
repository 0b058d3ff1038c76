//! Disk space monitoring
//!
//! Samples a mount point, compares free space against the configured
//! threshold and sends an alert email when the rule fires.

use chrono::{DateTime, Utc};
use diskguard_config::{ConfigServiceError, Settings};
use diskguard_core::{DynErrorReporter, DynNotificationService, EmailMessage, ReportLevel};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::sampler::{DiskStatus, FilesystemSampler, StatfsSampler};

/// Mount point that gets checked
pub const ROOT_MOUNT_PATH: &str = "/";

/// Subject line of the alert email, after the host tag
pub const ALERT_SUBJECT: &str = "DISK SPACE FULL";

const BYTES_PER_GB: f64 = 1_073_741_824.0;

#[derive(Debug, Error)]
pub enum DiskSpaceError {
    #[error("Disk usage sampling failed for {path}: {source}")]
    Sampling {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigServiceError),
}

/// Outcome of comparing one [`DiskStatus`] with the threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEvaluation {
    pub free_gb: f64,
    pub used_gb: f64,
    pub total_gb: f64,
    pub used_percent: f64,
    pub threshold_gb: f64,
    pub alert: bool,
}

impl ThresholdEvaluation {
    /// Evaluate the alert rule.
    ///
    /// The alert fires when free space is *above* the threshold. This is the
    /// rule diskguard has always shipped with, kept as is.
    pub fn evaluate(status: &DiskStatus, threshold_gb: f64) -> Self {
        let free_gb = status.free as f64 / BYTES_PER_GB;
        let used_gb = status.used as f64 / BYTES_PER_GB;
        let total_gb = status.all as f64 / BYTES_PER_GB;

        Self {
            free_gb,
            used_gb,
            total_gb,
            used_percent: used_gb / total_gb * 100.0,
            threshold_gb,
            alert: free_gb > threshold_gb,
        }
    }

    /// Build the alert email content for `host`
    pub fn alert_message(&self, host: &str) -> DiskSpaceAlert {
        DiskSpaceAlert {
            subject: format!("[{}]{}", host, ALERT_SUBJECT),
            body: format!(
                "You are currently using {:.6}% of your available memory",
                self.used_percent
            ),
        }
    }
}

/// Alert email content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpaceAlert {
    pub subject: String,
    pub body: String,
}

/// What happened to the alert email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertDelivery {
    NotTriggered,
    Sent,
    Failed(String),
}

/// Result of a disk space check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskSpaceCheckResult {
    /// Timestamp of the check
    pub checked_at: DateTime<Utc>,
    pub mount_point: String,
    pub status: DiskStatus,
    pub evaluation: ThresholdEvaluation,
    pub delivery: AlertDelivery,
}

/// Disk space monitoring service
pub struct DiskSpaceMonitor {
    settings: Arc<Settings>,
    host: String,
    sampler: Arc<dyn FilesystemSampler>,
    notification_service: DynNotificationService,
    error_reporter: DynErrorReporter,
}

impl DiskSpaceMonitor {
    /// Create a new disk space monitor backed by `statfs`
    pub fn new(
        settings: Arc<Settings>,
        host: String,
        notification_service: DynNotificationService,
        error_reporter: DynErrorReporter,
    ) -> Self {
        Self {
            settings,
            host,
            sampler: Arc::new(StatfsSampler),
            notification_service,
            error_reporter,
        }
    }

    /// Replace the filesystem sampler
    pub fn with_sampler(mut self, sampler: Arc<dyn FilesystemSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Sample `path`, evaluate the threshold and send the alert if it fires.
    ///
    /// Sampling and threshold errors are reported as critical and returned.
    /// A failed alert email is reported as an error and does not fail the check.
    pub async fn check_and_notify(
        &self,
        path: &Path,
    ) -> Result<DiskSpaceCheckResult, DiskSpaceError> {
        let status = self.sampler.sample(path).map_err(|source| {
            self.fatal(DiskSpaceError::Sampling {
                path: path.display().to_string(),
                source,
            })
        })?;

        debug!(
            "Disk {}: {} free of {}",
            path.display(),
            format_bytes(status.free),
            format_bytes(status.all)
        );

        let threshold = self
            .settings
            .required_free_disk_space()
            .map_err(|e| self.fatal(e.into()))?;

        let evaluation = ThresholdEvaluation::evaluate(&status, threshold);

        let delivery = if evaluation.alert {
            self.send_alert(&evaluation).await
        } else {
            debug!(
                "Free space {:.2} GB does not exceed threshold {} GB, no alert",
                evaluation.free_gb, threshold
            );
            AlertDelivery::NotTriggered
        };

        Ok(DiskSpaceCheckResult {
            checked_at: Utc::now(),
            mount_point: path.display().to_string(),
            status,
            evaluation,
            delivery,
        })
    }

    fn fatal(&self, err: DiskSpaceError) -> DiskSpaceError {
        error!("{}", err);
        self.error_reporter
            .report(ReportLevel::Critical, &err.to_string());
        err
    }

    async fn send_alert(&self, evaluation: &ThresholdEvaluation) -> AlertDelivery {
        let alert = evaluation.alert_message(&self.host);
        let to = self.settings.admin_email.clone();
        let message = EmailMessage::new(to.clone(), alert.subject, alert.body);

        match self.notification_service.send_email(message).await {
            Ok(()) => {
                info!("email sent to {}", to);
                AlertDelivery::Sent
            }
            Err(e) => {
                error!("smtp error: {}", e);
                self.error_reporter
                    .report(ReportLevel::Error, &format!("smtp error: {}", e));
                AlertDelivery::Failed(e.to_string())
            }
        }
    }
}

/// Format bytes into a human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
