//! Wall clock helpers

use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
}

/// Current Unix timestamp in seconds
pub(crate) fn now_secs() -> i64 {
    since_epoch().as_secs() as i64
}

/// Current Unix timestamp in milliseconds
pub(crate) fn now_millis() -> i64 {
    since_epoch().as_millis() as i64
}
