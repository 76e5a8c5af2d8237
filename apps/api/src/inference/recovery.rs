//! Output recovery: turns free-form model output into an [`ExtractedProfile`].
//!
//! The model is not schema-constrained, so its output may be prose-wrapped
//! JSON, bare JSON, or a dictionary literal with single quotes. Recovery is an
//! ordered list of attempts; the first one that yields a JSON object wins. If
//! none does, the sentinel profile is returned with the raw text attached.
//! Pure text in, profile out: no I/O, no errors, no panics.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::inference::literal::parse_literal;
use crate::models::candidate::ExtractedProfile;

/// Outcome of a single recovery attempt.
#[derive(Debug, PartialEq)]
pub enum Attempt {
    Recovered(Map<String, Value>),
    Missed(String),
}

type Strategy = fn(&str) -> Attempt;

/// Recovery attempts in precedence order.
const STRATEGIES: [(&str, Strategy); 3] = [
    ("brace_span", brace_span),
    ("strict_whole", strict_whole),
    ("literal_whole", literal_whole),
];

/// Recovers a structured profile from raw model output.
pub fn recover(raw_model_text: &str) -> ExtractedProfile {
    for (name, strategy) in STRATEGIES {
        match strategy(raw_model_text) {
            Attempt::Recovered(object) => {
                match serde_json::from_value::<ExtractedProfile>(Value::Object(object)) {
                    Ok(profile) => {
                        debug!(strategy = name, "Recovered structured profile");
                        return profile;
                    }
                    Err(e) => debug!(strategy = name, "Recovered object did not fit profile: {e}"),
                }
            }
            Attempt::Missed(reason) => debug!(strategy = name, "Recovery attempt missed: {reason}"),
        }
    }

    warn!(
        "Model output could not be parsed ({} chars); storing raw text for diagnosis",
        raw_model_text.len()
    );
    ExtractedProfile::unparseable(raw_model_text)
}

/// Strict JSON parse of the span from the first `{` to the last `}`.
fn brace_span(raw: &str) -> Attempt {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Attempt::Missed("no brace-delimited span".to_string());
    };
    if end < start {
        return Attempt::Missed("closing brace precedes opening brace".to_string());
    }
    object_from(serde_json::from_str(&raw[start..=end]).map_err(|e| e.to_string()))
}

/// Strict JSON parse of the entire text.
fn strict_whole(raw: &str) -> Attempt {
    object_from(serde_json::from_str(raw.trim()).map_err(|e| e.to_string()))
}

/// Permissive literal parse of the entire text.
fn literal_whole(raw: &str) -> Attempt {
    object_from(parse_literal(raw.trim()).map_err(|e| e.to_string()))
}

fn object_from(parsed: Result<Value, String>) -> Attempt {
    match parsed {
        Ok(Value::Object(map)) => Attempt::Recovered(map),
        Ok(other) => Attempt::Missed(format!("expected an object, got {}", kind_of(&other))),
        Err(reason) => Attempt::Missed(reason),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
