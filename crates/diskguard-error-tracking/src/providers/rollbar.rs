//! Rollbar item API reporter

use async_trait::async_trait;
use diskguard_config::Settings;
use diskguard_core::{ErrorReporter, ReportLevel};
use reqwest::Client;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use super::TelemetryError;

pub const ROLLBAR_ENDPOINT: &str = "https://api.rollbar.com/api/1/item/";

const MAX_QUEUED_ITEMS: usize = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const NOTIFIER_NAME: &str = "diskguard";

#[derive(Debug, Clone)]
pub struct RollbarConfig {
    pub access_token: String,
    pub environment: String,
    pub code_version: String,
    pub server_host: String,
}

impl RollbarConfig {
    pub fn from_settings(settings: &Settings, server_host: impl Into<String>) -> Self {
        Self {
            access_token: settings.rollbar.access_token.clone(),
            environment: settings.rollbar.environment().to_string(),
            code_version: settings.rollbar.code_version().to_string(),
            server_host: server_host.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RollbarItem {
    access_token: String,
    data: ItemData,
}

#[derive(Debug, Clone, Serialize)]
struct ItemData {
    environment: String,
    level: ReportLevel,
    timestamp: i64,
    code_version: String,
    platform: &'static str,
    language: &'static str,
    uuid: String,
    server: ServerData,
    body: ItemBody,
    notifier: NotifierData,
}

#[derive(Debug, Clone, Serialize)]
struct ServerData {
    host: String,
}

#[derive(Debug, Clone, Serialize)]
struct ItemBody {
    message: MessageBody,
}

#[derive(Debug, Clone, Serialize)]
struct MessageBody {
    body: String,
}

#[derive(Debug, Clone, Serialize)]
struct NotifierData {
    name: &'static str,
    version: &'static str,
}

/// Reports errors to Rollbar
///
/// An empty access token disables delivery; reports are then only logged.
pub struct RollbarReporter {
    client: Client,
    config: RollbarConfig,
    endpoint: String,
    queue: Mutex<Vec<RollbarItem>>,
}

impl RollbarReporter {
    pub fn new(config: RollbarConfig) -> Result<Self, TelemetryError> {
        Self::with_endpoint(config, ROLLBAR_ENDPOINT)
    }

    pub fn with_endpoint(
        config: RollbarConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self, TelemetryError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TelemetryError::Client(e.to_string()))?;

        if config.access_token.is_empty() {
            warn!("ROLLBAR_CREDENTIALS is not set, error reports will only be logged");
        }

        Ok(Self {
            client,
            config,
            endpoint: endpoint.into(),
            queue: Mutex::new(Vec::new()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.access_token.is_empty()
    }

    /// Number of reports waiting for `flush`
    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    fn queue(&self) -> MutexGuard<'_, Vec<RollbarItem>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build_item(&self, level: ReportLevel, message: &str) -> RollbarItem {
        RollbarItem {
            access_token: self.config.access_token.clone(),
            data: ItemData {
                environment: self.config.environment.clone(),
                level,
                timestamp: chrono::Utc::now().timestamp(),
                code_version: self.config.code_version.clone(),
                platform: std::env::consts::OS,
                language: "rust",
                uuid: uuid::Uuid::new_v4().to_string(),
                server: ServerData {
                    host: self.config.server_host.clone(),
                },
                body: ItemBody {
                    message: MessageBody {
                        body: message.to_string(),
                    },
                },
                notifier: NotifierData {
                    name: NOTIFIER_NAME,
                    version: env!("CARGO_PKG_VERSION"),
                },
            },
        }
    }

    async fn deliver(&self, item: &RollbarItem) -> Result<(), TelemetryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Rollbar-Access-Token", &self.config.access_token)
            .json(item)
            .send()
            .await
            .map_err(|e| TelemetryError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TelemetryError::Delivery(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

#[async_trait]
impl ErrorReporter for RollbarReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        if !self.is_enabled() {
            debug!("Telemetry disabled, not reporting {} item", level);
            return;
        }

        let item = self.build_item(level, message);
        let mut queue = self.queue();
        if queue.len() >= MAX_QUEUED_ITEMS {
            warn!("Telemetry queue full, dropping {} item", level);
            return;
        }
        queue.push(item);
    }

    async fn flush(&self) {
        let items = std::mem::take(&mut *self.queue());
        if items.is_empty() {
            return;
        }

        debug!("Flushing {} telemetry item(s)", items.len());
        for item in &items {
            if let Err(e) = self.deliver(item).await {
                warn!("Failed to deliver {} report: {}", item.data.level, e);
            }
        }
    }
}
