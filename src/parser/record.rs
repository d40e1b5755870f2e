use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const OVERALL_GRADE: &str = "Overall_Grade";

pub const SANITY_STATUS: &str = "Sanity_Status";
pub const SANITY_JUSTIFICATION: &str = "Sanity_Status_Justification";
pub const SANITY_CHAIN_OF_THOUGHT: &str = "Sanity_Chain_of_Thought";
pub const SANITY_CONFIDENCE: &str = "Confidence_In_This_Status";
pub const CHAIN_OF_THOUGHT: &str = "Chain_of_Thought";

pub const VALIDITY_GRADE: &str = "Validity_Grade";
pub const VALIDITY_FEEDBACK: &str = "Validity_Feedback";
pub const VALIDITY_CONFIDENCE: &str = "Confidence_In_Validify_Feedback";
pub const VALIDITY_GRADES: &str = "Model_Validity_Grades";
pub const VALIDITY_RAW: &str = "Validity_Raw_Response";

pub const QUALITY_GRADE: &str = "Quality_Grade";
pub const QUALITY_FEEDBACK: &str = "Quality_Feedback";
pub const QUALITY_CONFIDENCE: &str = "Confidence_In_Quality_Feedback";
pub const QUALITY_GRADES: &str = "Model_Quality_Grades";
pub const QUALITY_RAW: &str = "Quality_Raw_Response";

/// Keys never sent through the cleaner for validity feedback
pub const VALIDITY_RESERVED: &[&str] = &[
    "Answer Status",
    "Answer_Status",
    "Validity Grade",
    VALIDITY_GRADE,
];

/// Keys never sent through the cleaner for quality feedback
pub const QUALITY_RESERVED: &[&str] = &[
    "Answer Status",
    "Answer_Status",
    "Quality Grade",
    QUALITY_GRADE,
];

/// Open, insertion-ordered feedback mapping.
///
/// Model output is echoed through untouched; the known keys above are read by
/// name and everything else passes along. `merge` is a shallow overwrite that
/// keeps each key at the position it was first inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackRecord(Map<String, Value>);

impl FeedbackRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn merge(&mut self, other: FeedbackRecord) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn overall_grade(&self) -> Option<&str> {
        self.get_str(OVERALL_GRADE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Render a field value the way it is embedded into a prompt
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
