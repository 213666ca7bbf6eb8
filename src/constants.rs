//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable (see [`crate::config`]).

/// Field manager recorded on every status write
pub const FIELD_MANAGER: &str = "lokistack-controller";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default interval between periodic reconciliations of a healthy stack (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default requeue interval after a degraded condition that asked for a retry (seconds)
pub const DEFAULT_DEGRADED_REQUEUE_SECS: u64 = 30;

/// Default Fibonacci backoff starting value (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default Fibonacci backoff maximum value (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default delay before restarting the watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "lokistack_controller=info";

/// Label carrying the component name on every pod of a stack
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";

/// Label carrying the owning stack name on every pod of a stack
pub const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";

/// Default message for the Ready condition
pub const MESSAGE_READY: &str = "All components ready";

/// Default message for the Failed condition
pub const MESSAGE_FAILED: &str = "Some LokiStack components failed";

/// Default message for the Pending condition
pub const MESSAGE_PENDING: &str = "Some LokiStack components pending on dependencies";
