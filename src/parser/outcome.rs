use super::record::FeedbackRecord;
use serde_json::Value;

/// Vote value used when a response could not be decoded or lacks the
/// discriminant key
pub const MALFORMED_VOTE: &str = "Error_JSON_Formatting";

/// Result of one model call
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Structured(FeedbackRecord),
    Malformed(String),
}

impl StageOutcome {
    /// The vote value this outcome casts for `key`
    pub fn discriminant(&self, key: &str) -> String {
        match self {
            StageOutcome::Structured(record) => match record.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => MALFORMED_VOTE.to_string(),
                Some(other) => other.to_string(),
            },
            StageOutcome::Malformed(_) => MALFORMED_VOTE.to_string(),
        }
    }

    pub fn record(&self) -> Option<&FeedbackRecord> {
        match self {
            StageOutcome::Structured(record) => Some(record),
            StageOutcome::Malformed(_) => None,
        }
    }
}

/// Decode a model response. Never fails: anything that is not a JSON object
/// comes back as `Malformed` carrying the raw text.
pub fn parse_outcome(raw: &str) -> StageOutcome {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => StageOutcome::Structured(FeedbackRecord::from_map(map)),
        Ok(_) => {
            tracing::debug!("Response decoded to a non-object JSON value");
            StageOutcome::Malformed(raw.to_string())
        }
        Err(e) => {
            tracing::debug!("Failed to decode response as JSON: {}", e);
            StageOutcome::Malformed(raw.to_string())
        }
    }
}
