//! Pure per-session summarization.

use std::collections::BTreeMap;

use serde_json::Value;

use vigil_models::{AttributeSchema, SessionRecord, SessionSummary};

/// Sentinel mode for attributes with no parsed values.
const UNKNOWN: &str = "unknown";

/// Most frequent value, ties broken by first occurrence.
///
/// An empty input yields `"unknown"`, never an error.
pub fn compute_mode(values: &[String]) -> String {
    if values.is_empty() {
        return UNKNOWN.to_string();
    }

    // Counted in first-occurrence order so ties resolve deterministically
    let mut counts: Vec<(&String, u32)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(existing, _)| *existing == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best = &counts[0];
    for entry in &counts[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    best.0.clone()
}

/// Lowercased token counts across all values.
///
/// Values split on whitespace, commas and slashes.
pub fn term_frequency(values: &[String]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for value in values {
        for token in value.split(|c: char| c.is_whitespace() || c == ',' || c == '/') {
            let token = token.trim().to_lowercase();
            if token.is_empty() {
                continue;
            }
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    counts
}

/// Build the summary for one session.
///
/// Events whose payload cannot be read as a structured attribute object are
/// skipped; one bad inference result never poisons the session.
pub fn summarize_session(record: &SessionRecord, schema: &AttributeSchema) -> SessionSummary {
    let parsed: Vec<serde_json::Map<String, Value>> = record
        .events
        .iter()
        .filter_map(|event| parse_payload(&event.payload))
        .collect();

    let mut modes = BTreeMap::new();
    for name in schema.categorical() {
        let values: Vec<String> = parsed
            .iter()
            .filter_map(|attrs| attrs.get(name))
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect();
        modes.insert(name.to_string(), compute_mode(&values));
    }

    let mut free_text_values = Vec::new();
    for name in schema.free_text() {
        free_text_values.extend(
            parsed
                .iter()
                .filter_map(|attrs| attrs.get(name))
                .filter_map(|v| v.as_str())
                .map(str::to_string),
        );
    }

    SessionSummary {
        session_id: record.session_id.clone(),
        timestamp: record.first_seen,
        duration_secs: record.duration_secs(),
        modes,
        style_terms: term_frequency(&free_text_values),
    }
}

/// Read one event payload as an attribute object.
///
/// Payloads normally arrive as JSON objects; a payload that is itself a
/// JSON-encoded string gets one parse attempt before being skipped.
fn parse_payload(payload: &Value) -> Option<serde_json::Map<String, Value>> {
    match payload {
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use vigil_models::SessionEvent;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_mode_of_empty_is_unknown() {
        assert_eq!(compute_mode(&[]), "unknown");
    }

    #[test]
    fn test_mode_picks_most_frequent() {
        assert_eq!(compute_mode(&strings(&["a", "b", "a"])), "a");
    }

    #[test]
    fn test_mode_tie_breaks_on_first_seen() {
        assert_eq!(compute_mode(&strings(&["x", "y"])), "x");
        assert_eq!(compute_mode(&strings(&["y", "x", "x", "y"])), "y");
    }

    #[test]
    fn test_term_frequency_counts_tokens() {
        let counts = term_frequency(&strings(&["casual jacket", "casual glasses"]));
        assert_eq!(counts["casual"], 2);
        assert_eq!(counts["jacket"], 1);
        assert_eq!(counts["glasses"], 1);
    }

    #[test]
    fn test_term_frequency_splits_on_comma_slash_space() {
        let counts = term_frequency(&strings(&["red,blue/green shirt"]));
        assert_eq!(counts["red"], 1);
        assert_eq!(counts["blue"], 1);
        assert_eq!(counts["green"], 1);
        assert_eq!(counts["shirt"], 1);
    }

    #[test]
    fn test_term_frequency_lowercases() {
        let counts = term_frequency(&strings(&["Denim JACKET", "denim"]));
        assert_eq!(counts["denim"], 2);
        assert_eq!(counts["jacket"], 1);
        assert!(!counts.contains_key("JACKET"));
    }

    fn event(timestamp: i64, payload: Value) -> SessionEvent {
        SessionEvent {
            timestamp,
            identity_id: "trk-a".to_string(),
            prompt: "p".to_string(),
            payload,
        }
    }

    fn schema() -> AttributeSchema {
        AttributeSchema::default()
    }

    #[test]
    fn test_summarize_session() {
        let mut record = SessionRecord::open("ses-a", 10_000);
        record.last_seen = 40_000;
        record.events = vec![
            event(11_000, serde_json::json!({"mood": "happy", "fashion": "denim jacket"})),
            event(16_000, serde_json::json!({"mood": "happy", "fashion": "denim scarf"})),
            event(21_000, serde_json::json!({"mood": "serious"})),
        ];

        let summary = summarize_session(&record, &schema());
        assert_eq!(summary.session_id, "ses-a");
        assert_eq!(summary.timestamp, 10_000);
        assert!((summary.duration_secs - 30.0).abs() < 1e-9);
        assert_eq!(summary.modes["mood"], "happy");
        // No event carried an age_group value
        assert_eq!(summary.modes["age_group"], "unknown");
        assert_eq!(summary.style_terms["denim"], 2);
        assert_eq!(summary.style_terms["jacket"], 1);
    }

    #[test]
    fn test_summarize_skips_malformed_payloads() {
        let mut record = SessionRecord::open("ses-a", 0);
        record.last_seen = 20_000;
        record.events = vec![
            event(1_000, Value::String("not json at all".to_string())),
            event(2_000, serde_json::json!(42)),
            event(3_000, serde_json::json!(["an", "array"])),
            event(4_000, serde_json::json!({"mood": "neutral"})),
            // A JSON-encoded object string still parses
            event(5_000, Value::String(r#"{"mood": "neutral"}"#.to_string())),
        ];

        let summary = summarize_session(&record, &schema());
        assert_eq!(summary.modes["mood"], "neutral");
        assert!(summary.style_terms.is_empty());
    }

    #[test]
    fn test_summarize_empty_session() {
        let record = SessionRecord::open("ses-a", 0);
        let summary = summarize_session(&record, &schema());
        assert_eq!(summary.modes["mood"], "unknown");
        assert_eq!(summary.modes["gender"], "unknown");
        assert!(summary.style_terms.is_empty());
        assert_eq!(summary.duration_secs, 0.0);
    }
}
