//! Normalization of raw task output into structured step records.
//!
//! Agents are asked for JSON but routinely wrap it in prose or code fences,
//! or answer with plain text. `ensure_json` recovers the JSON object when
//! one is embedded and otherwise degrades to an error record that keeps the
//! original text. It never fails.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Marker stored under `"error"` when a step's output is not JSON.
pub const NON_JSON_OUTPUT: &str = "non_json_output";

/// One task output after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum StepRecord {
    /// The output parsed as JSON (usually an object).
    Parsed(Value),
    /// The task produced no text.
    Empty,
    /// The output could not be parsed; the text is kept verbatim.
    NonJson { raw: String },
}

impl StepRecord {
    /// The record as it appears in the merged result.
    pub fn to_value(&self) -> Value {
        match self {
            StepRecord::Parsed(value) => value.clone(),
            StepRecord::Empty => json!({ "empty": true }),
            StepRecord::NonJson { raw } => json!({ "error": NON_JSON_OUTPUT, "raw": raw }),
        }
    }

    /// Rebuild a record from its merged-result form.
    pub fn from_value(value: Value) -> Self {
        if let Some(obj) = value.as_object() {
            if obj.len() == 1 && obj.get("empty") == Some(&Value::Bool(true)) {
                return StepRecord::Empty;
            }
            if obj.len() == 2 && obj.get("error").and_then(Value::as_str) == Some(NON_JSON_OUTPUT)
            {
                if let Some(raw) = obj.get("raw").and_then(Value::as_str) {
                    return StepRecord::NonJson {
                        raw: raw.to_string(),
                    };
                }
            }
        }
        StepRecord::Parsed(value)
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, StepRecord::Parsed(_))
    }

    /// The parsed value when it is a JSON object.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            StepRecord::Parsed(value) => value.as_object(),
            _ => None,
        }
    }

    /// Field of a parsed object record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }
}

impl Serialize for StepRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StepRecord::Parsed(value) => value.serialize(serializer),
            other => other.to_value().serialize(serializer),
        }
    }
}

/// Parse JSON out of an agent response.
///
/// Tries the span from the first `{` to the last `}` first, then the whole
/// string. Empty input is [`StepRecord::Empty`].
pub fn ensure_json(text: &str) -> StepRecord {
    if text.is_empty() {
        return StepRecord::Empty;
    }

    if let Some(span) = object_span(text) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return StepRecord::Parsed(value);
        }
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => StepRecord::Parsed(value),
        Err(_) => StepRecord::NonJson {
            raw: text.to_string(),
        },
    }
}

fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
