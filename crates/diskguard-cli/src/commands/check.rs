use anyhow::Context;
use clap::Args;
use diskguard_config::{Settings, SettingsLoader};
use diskguard_core::{ErrorReporter, ReportLevel};
use diskguard_error_tracking::{RollbarConfig, RollbarReporter, ROLLBAR_ENDPOINT};
use diskguard_monitoring::{
    resolve_host_tag, AlertDelivery, DiskSpaceMonitor, FilesystemSampler, ROOT_MOUNT_PATH,
};
use diskguard_notifications::SmtpNotificationService;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Args, Default)]
pub struct CheckCommand {}

impl CheckCommand {
    pub fn execute(self, env_file: &Path) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        runtime.block_on(CheckRun::new(env_file).run())
    }
}

/// One check run: load settings, check `/`, flush error reports before returning
struct CheckRun {
    env_file: PathBuf,
    loader: SettingsLoader,
    /// Used for error reporting when `loader` fails
    fallback_loader: SettingsLoader,
    rollbar_endpoint: String,
    sampler: Option<Arc<dyn FilesystemSampler>>,
}

impl CheckRun {
    fn new(env_file: &Path) -> Self {
        Self {
            env_file: env_file.to_path_buf(),
            loader: SettingsLoader::new(env_file),
            fallback_loader: SettingsLoader::environment_only(),
            rollbar_endpoint: ROLLBAR_ENDPOINT.to_string(),
            sampler: None,
        }
    }

    async fn run(self) -> anyhow::Result<()> {
        let settings = match self.loader.load() {
            Ok(settings) => Arc::new(settings),
            Err(e) => {
                error!("critical: settings could not be loaded: {}", e);

                let fallback = self.fallback_loader.load().unwrap_or_else(|load_err| {
                    warn!(
                        "Environment settings could not be loaded either, error reporting may be disabled: {}",
                        load_err
                    );
                    Settings::default()
                });
                let reporter = self.build_reporter(&fallback)?;
                reporter.report(
                    ReportLevel::Critical,
                    &format!("settings could not be loaded: {}", e),
                );
                reporter.flush().await;

                return Err(e).with_context(|| {
                    format!("Failed to load settings from {}", self.env_file.display())
                });
            }
        };

        let reporter = Arc::new(self.build_reporter(&settings)?);
        let notifier = Arc::new(SmtpNotificationService::new(settings.smtp.clone()));
        let host = resolve_host_tag(&settings);

        let mut monitor = DiskSpaceMonitor::new(settings, host, notifier, reporter.clone());
        if let Some(sampler) = &self.sampler {
            monitor = monitor.with_sampler(sampler.clone());
        }

        let result = monitor
            .check_and_notify(Path::new(ROOT_MOUNT_PATH))
            .await;

        reporter.flush().await;

        let result = result.context("Disk space check failed")?;
        let evaluation = &result.evaluation;
        info!(
            "Checked {}: {:.2} GB free of {:.2} GB ({:.2}% used), threshold {} GB",
            result.mount_point,
            evaluation.free_gb,
            evaluation.total_gb,
            evaluation.used_percent,
            evaluation.threshold_gb
        );

        match &result.delivery {
            AlertDelivery::NotTriggered => info!("No alert sent"),
            AlertDelivery::Sent => info!("Alert sent"),
            AlertDelivery::Failed(reason) => warn!("Alert could not be delivered: {}", reason),
        }

        Ok(())
    }

    fn build_reporter(&self, settings: &Settings) -> anyhow::Result<RollbarReporter> {
        let config = RollbarConfig::from_settings(settings, resolve_host_tag(settings));
        RollbarReporter::with_endpoint(config, self.rollbar_endpoint.clone())
            .context("Failed to initialize error reporting")
    }
}
