//! Count Model (per-key daily counter)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub key: String,
    pub value: i64,
    /// `YYYY-MM-DD` of the day the counter last restarted
    pub last_reset: String,
}
