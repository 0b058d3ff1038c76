//! Error reporting to an external telemetry sink
//!
//! Reporters are constructed explicitly by the caller, queue reports in
//! memory and deliver them on `flush`.

pub mod providers;

pub use providers::rollbar::{RollbarConfig, RollbarReporter, ROLLBAR_ENDPOINT};
pub use providers::TelemetryError;
