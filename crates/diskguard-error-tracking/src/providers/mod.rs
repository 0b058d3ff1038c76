//! Telemetry providers

use thiserror::Error;

pub mod rollbar;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
