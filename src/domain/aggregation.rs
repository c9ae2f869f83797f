// Raw rows returned by remote aggregation procedures
use serde::Deserialize;
use serde_json::Value;

/// A loosely typed record. Its shape is only known to the panel that asked for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct AggregationRow(Value);

impl AggregationRow {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Field lookup; `None` for a missing field or a row that is not an object.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(name))
    }
}

impl From<Value> for AggregationRow {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
