//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// HTTP server port for metrics and health probes
    pub metrics_port: u16,
    /// Namespace to watch, empty for all namespaces
    pub watch_namespace: String,
    /// Interval between periodic reconciliations of a stack (seconds)
    pub resync_interval_secs: u64,
    /// Requeue interval after a degraded condition that asked for a retry (seconds)
    pub degraded_requeue_secs: u64,
    /// Fibonacci backoff starting value (seconds)
    pub backoff_min_secs: u64,
    /// Fibonacci backoff maximum value (seconds)
    pub backoff_max_secs: u64,
    /// Delay before restarting the watch stream after it ends (seconds)
    pub watch_restart_delay_secs: u64,
    /// Log format (json, text)
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            watch_namespace: String::new(),
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            degraded_requeue_secs: DEFAULT_DEGRADED_REQUEUE_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            log_format: LogFormat::Text,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        use crate::constants::*;
        Self {
            metrics_port: parsed_or_default(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT),
            watch_namespace: lookup("WATCH_NAMESPACE")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            resync_interval_secs: parsed_or_default(
                &lookup,
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            degraded_requeue_secs: parsed_or_default(
                &lookup,
                "DEGRADED_REQUEUE_SECS",
                DEFAULT_DEGRADED_REQUEUE_SECS,
            ),
            backoff_min_secs: parsed_or_default(
                &lookup,
                "BACKOFF_MIN_SECS",
                DEFAULT_BACKOFF_MIN_SECS,
            ),
            backoff_max_secs: parsed_or_default(
                &lookup,
                "BACKOFF_MAX_SECS",
                DEFAULT_BACKOFF_MAX_SECS,
            ),
            watch_restart_delay_secs: parsed_or_default(
                &lookup,
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            log_format: match lookup("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    /// `None` when every namespace is watched
    #[must_use]
    pub fn watch_namespace(&self) -> Option<&str> {
        if self.watch_namespace.is_empty() {
            None
        } else {
            Some(&self.watch_namespace)
        }
    }

    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    #[must_use]
    pub fn degraded_requeue_interval(&self) -> Duration {
        Duration::from_secs(self.degraded_requeue_secs)
    }

    #[must_use]
    pub fn backoff_min_duration(&self) -> Duration {
        Duration::from_secs(self.backoff_min_secs)
    }

    #[must_use]
    pub fn backoff_max_duration(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }

    #[must_use]
    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

/// Read a value and parse it, falling back to the default on absence or parse failure
fn parsed_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
