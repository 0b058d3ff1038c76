//! Host tag detection

use diskguard_config::Settings;
use tracing::warn;

/// Host tag used in alert subjects and telemetry
///
/// Uses `THOST` when set, then the system hostname, then `"unknown"`.
#[must_use]
pub fn resolve_host_tag(settings: &Settings) -> String {
    if let Some(host) = settings.host_tag() {
        return host.to_string();
    }

    match sysinfo::System::host_name() {
        Some(hostname) if !hostname.is_empty() => hostname,
        _ => {
            warn!("Could not determine hostname, using 'unknown'");
            "unknown".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_host_wins() {
        let settings = Settings {
            host: "web-01".to_string(),
            ..Default::default()
        };
        assert_eq!(resolve_host_tag(&settings), "web-01");
    }

    #[test]
    fn test_fallback_is_not_empty() {
        let host = resolve_host_tag(&Settings::default());
        assert!(!host.is_empty());
    }
}
