// Service constants (no magic values)
use std::time::Duration;

/// Wall-clock budget for a command when the caller gives none (30s)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for trailing output after the child exits (2s)
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Captured output cap per command (1 MiB); the rest is drained and discarded
pub const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Audit entries retained before the oldest is evicted
pub const AUDIT_LOG_CAPACITY: usize = 100;

/// Command output kept in an audit entry's detail (4 KiB)
pub const AUDIT_DETAIL_MAX_BYTES: usize = 4 * 1024;

/// Alerts retained before the oldest is evicted
pub const ALERT_HISTORY_CAPACITY: usize = 100;

/// Maximum results of a name search
pub const SEARCH_RESULT_LIMIT: usize = 50;

/// Default size of a process listing
pub const DEFAULT_PROCESS_LIST_LIMIT: usize = 100;

/// Default number of audit entries returned
pub const DEFAULT_AUDIT_LIST_LIMIT: usize = 50;

/// Separation between the two CPU tick observations (1s)
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// How often the background poller refreshes the cached snapshot (5s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
