//! Error reporting seam
//!
//! Reports are queued with [`ErrorReporter::report`] and delivered by
//! [`ErrorReporter::flush`], which must run before the process exits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Severity attached to a telemetry report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl ReportLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportLevel::Debug => "debug",
            ReportLevel::Info => "info",
            ReportLevel::Warning => "warning",
            ReportLevel::Error => "error",
            ReportLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait ErrorReporter: Send + Sync {
    /// Queue a report. Never blocks on the network.
    fn report(&self, level: ReportLevel, message: &str);

    /// Deliver everything queued so far.
    async fn flush(&self);
}

pub type DynErrorReporter = Arc<dyn ErrorReporter>;
