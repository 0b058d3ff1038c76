use anyhow::Context;
use clap::Args;
use colored::Colorize;
use diskguard_monitoring::{
    FilesystemSampler, MemoryStatus, StatfsSampler, UsageReport, ROOT_MOUNT_PATH,
};
use std::path::Path;
use tracing::warn;

#[derive(Args, Default)]
pub struct UsageCommand {}

impl UsageCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let memory = MemoryStatus::sample();
        let disk = StatfsSampler
            .sample(Path::new(ROOT_MOUNT_PATH))
            .with_context(|| format!("Failed to sample {}", ROOT_MOUNT_PATH))?;

        let report = UsageReport::new(&memory, &disk);

        println!("Memory used: {:.2} %", report.memory_used_percent);
        println!("Disk used:   {:.2} %", report.disk_used_percent);

        for warning in &report.warnings {
            warn!("{}", warning);
            println!("{}", warning.yellow());
        }

        Ok(())
    }
}
