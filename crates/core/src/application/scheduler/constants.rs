// Scheduler constants (no magic values)
use std::time::Duration;

/// Minimum gap between the end of one dispatch and the start of the next (5s)
pub const DEFAULT_MIN_DISPATCH_INTERVAL: Duration = Duration::from_secs(5);

/// How long one idle iteration waits for work before retrying (100ms)
pub const DEFAULT_IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sleep duration after a failed dispatch before the next one (1s)
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Simulated external batch API latency (1s)
pub const DEFAULT_BATCH_API_DELAY: Duration = Duration::from_secs(1);
