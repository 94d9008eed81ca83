//! Prompt construction and structured-output parsing.

use vigil_models::{AttributeKind, AttributeSchema};

use crate::error::{VisionError, VisionResult};
use crate::types::SubjectAttributes;

/// Build the attribute-analysis prompt for one schema.
///
/// The same prompt is reused for every cycle; it is rendered once when the
/// session manager starts.
pub fn build_attribute_prompt(schema: &AttributeSchema) -> String {
    let mut prompt = String::from(
        "You are an on-device visual analyst. For every person listed in the \
         request, estimate the attributes below from the shared camera frame. \
         Use each person's bounding box to find them in the frame.\n\nATTRIBUTES:\n",
    );

    for spec in &schema.attributes {
        match &spec.kind {
            AttributeKind::Enum(values) => {
                prompt.push_str(&format!("- {}: one of [{}]\n", spec.name, values.join(", ")));
            }
            AttributeKind::FreeText => {
                prompt.push_str(&format!(
                    "- {}: short free-form description, a few words\n",
                    spec.name
                ));
            }
        }
    }

    prompt.push_str(
        r#"
IMPORTANT: You must strictly follow this output format.
Return ONLY a JSON array with one object per person:
[
  {
    "id": "<identity id from the request>",
    "<attribute name>": "<value>"
  }
]

Include every listed person exactly once. Return ONLY the JSON array, with no
markdown and no commentary."#,
    );

    prompt
}

/// Parse the engine's raw generative text into per-identity attributes.
///
/// Models routinely wrap their JSON in markdown code fences despite the
/// instructions, so fences are stripped before parsing.
pub fn parse_subjects(raw: &str) -> VisionResult<Vec<SubjectAttributes>> {
    let text = strip_code_fences(raw);
    serde_json::from_str(text)
        .map_err(|e| VisionError::malformed(format!("{} in payload: {}", e, text)))
}

fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_models::AttributeSpec;

    #[test]
    fn test_prompt_lists_schema_attributes() {
        let schema = AttributeSchema {
            attributes: vec![
                AttributeSpec::enumerated("mood", &["happy", "neutral"]),
                AttributeSpec::free_text("fashion"),
            ],
        };
        let prompt = build_attribute_prompt(&schema);
        assert!(prompt.contains("- mood: one of [happy, neutral]"));
        assert!(prompt.contains("- fashion: short free-form description"));
        assert!(prompt.contains("ONLY a JSON array"));
    }

    #[test]
    fn test_parse_plain_array() {
        let subjects =
            parse_subjects(r#"[{"id": "trk-1", "mood": "happy", "fashion": "denim jacket"}]"#)
                .unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].id, "trk-1");
        assert_eq!(subjects[0].attributes["mood"], "happy");
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let raw = "```json\n[{\"id\": \"trk-1\", \"mood\": \"serious\"}]\n```";
        let subjects = parse_subjects(raw).unwrap();
        assert_eq!(subjects[0].attributes["mood"], "serious");

        let bare_fence = "```\n[{\"id\": \"trk-2\"}]\n```";
        assert_eq!(parse_subjects(bare_fence).unwrap()[0].id, "trk-2");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_subjects("the person looks friendly"),
            Err(VisionError::Malformed(_))
        ));
        // An object instead of an array is malformed too
        assert!(parse_subjects(r#"{"id": "trk-1"}"#).is_err());
    }

    #[test]
    fn test_payload_round_trip() {
        let subjects = parse_subjects(r#"[{"id": "trk-1", "age_group": "adult"}]"#).unwrap();
        let payload = subjects[0].to_payload();
        assert_eq!(payload["age_group"], "adult");
        // The id is carried separately, not duplicated into the payload
        assert!(payload.get("id").is_none());
    }
}
