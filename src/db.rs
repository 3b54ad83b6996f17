mod schema;

pub use schema::Database;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reading progress row for one local file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProgress {
    /// Progress key derived from the local path.
    pub key: String,
    /// Local path the key was derived from.
    pub path: String,
    /// Scroll fraction in [0.0, 1.0].
    pub fraction: f32,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Timestamp helper.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
