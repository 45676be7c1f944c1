use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CounterId, Operation};

/// Wire shape of the counter record: `updated_at` travels as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterPayload {
    pub id: CounterId,
    pub value: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateCounterRequest {
    pub operation: Operation,
}
