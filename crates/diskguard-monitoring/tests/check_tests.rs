use async_trait::async_trait;
use diskguard_config::SettingsLoader;
use diskguard_core::{
    EmailMessage, ErrorReporter, NotificationError, NotificationService, ReportLevel,
};
use diskguard_monitoring::{
    AlertDelivery, DiskSpaceMonitor, DiskStatus, FilesystemSampler, ROOT_MOUNT_PATH,
};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

const GIB: u64 = 1024 * 1024 * 1024;

struct FixedSampler(DiskStatus);

impl FilesystemSampler for FixedSampler {
    fn sample(&self, _path: &Path) -> io::Result<DiskStatus> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl NotificationService for Outbox {
    async fn send_email(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Default)]
struct Reports {
    items: Mutex<Vec<ReportLevel>>,
}

#[async_trait]
impl ErrorReporter for Reports {
    fn report(&self, level: ReportLevel, _message: &str) {
        self.items.lock().unwrap().push(level);
    }

    async fn flush(&self) {}
}

fn env_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_default_threshold_alert_end_to_end() {
    // FreeDiskSpace left unset, so the 2 GB default applies
    let file = env_file(
        "THOST=web-01\n\
         ADMIN_EMAIL=ops@example.com\n\
         SMTP_HOST=smtp.example.com\n\
         SMTP_PORT=587\n",
    );
    let settings = SettingsLoader::new(file.path())
        .without_environment()
        .load()
        .unwrap();
    let host = settings.host_tag().unwrap().to_string();

    let outbox = Arc::new(Outbox::default());
    let reports = Arc::new(Reports::default());
    let monitor = DiskSpaceMonitor::new(Arc::new(settings), host, outbox.clone(), reports.clone())
        .with_sampler(Arc::new(FixedSampler(DiskStatus::from_bytes(
            100 * GIB,
            10 * GIB,
        ))));

    let result = monitor
        .check_and_notify(Path::new(ROOT_MOUNT_PATH))
        .await
        .unwrap();

    assert_eq!(result.delivery, AlertDelivery::Sent);
    assert_eq!(result.evaluation.threshold_gb, 2.0);
    assert_eq!(result.evaluation.used_gb, 90.0);

    let sent = outbox.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops@example.com");
    assert_eq!(sent[0].subject, "[web-01]DISK SPACE FULL");
    assert!(sent[0].body.contains("90.000000%"));

    assert!(reports.items.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_threshold_from_file_suppresses_alert() {
    let file = env_file("FreeDiskSpace=20\nADMIN_EMAIL=ops@example.com\n");
    let settings = SettingsLoader::new(file.path())
        .without_environment()
        .load()
        .unwrap();

    let outbox = Arc::new(Outbox::default());
    let reports = Arc::new(Reports::default());
    let monitor = DiskSpaceMonitor::new(
        Arc::new(settings),
        "web-01".to_string(),
        outbox.clone(),
        reports.clone(),
    )
    .with_sampler(Arc::new(FixedSampler(DiskStatus::from_bytes(
        100 * GIB,
        10 * GIB,
    ))));

    let result = monitor
        .check_and_notify(Path::new(ROOT_MOUNT_PATH))
        .await
        .unwrap();

    assert_eq!(result.delivery, AlertDelivery::NotTriggered);
    assert!(outbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_threshold_in_file_is_fatal() {
    let file = env_file("FreeDiskSpace=lots\n");
    let settings = SettingsLoader::new(file.path())
        .without_environment()
        .load()
        .unwrap();

    let outbox = Arc::new(Outbox::default());
    let reports = Arc::new(Reports::default());
    let monitor = DiskSpaceMonitor::new(
        Arc::new(settings),
        "web-01".to_string(),
        outbox.clone(),
        reports.clone(),
    )
    .with_sampler(Arc::new(FixedSampler(DiskStatus::from_bytes(
        100 * GIB,
        10 * GIB,
    ))));

    let result = monitor.check_and_notify(Path::new(ROOT_MOUNT_PATH)).await;

    assert!(result.is_err());
    assert_eq!(*reports.items.lock().unwrap(), vec![ReportLevel::Critical]);
    assert!(outbox.sent.lock().unwrap().is_empty());
}
