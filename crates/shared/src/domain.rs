use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterId(pub i64);

/// The only mutations the counter accepts. Any other wire value is rejected
/// at the deserialization boundary, before a request reaches the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Increment,
    Decrement,
    Reset,
}

impl Operation {
    pub fn apply(self, value: i64) -> i64 {
        match self {
            Operation::Increment => value + 1,
            Operation::Decrement => value - 1,
            Operation::Reset => 0,
        }
    }
}
