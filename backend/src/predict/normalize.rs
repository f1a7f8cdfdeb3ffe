use serde_json::{Map, Value};
use shared::{ClassificationResult, DEFAULT_CLASS, DEFAULT_CONFIDENCE};

/// Class-like fields probed on a single-object body, in priority order.
const CLASS_FIELDS: [&str; 7] = [
    "class",
    "prediction",
    "label",
    "category",
    "type",
    "class_name",
    "predicted_class",
];

/// Confidence-like fields probed on a single-object body, in priority order.
const CONFIDENCE_FIELDS: [&str; 5] = ["confidence", "probability", "score", "conf", "p"];

/// Recognized upstream body shapes, resolved in declaration order.
/// The matching order is the contract: ranked list, then a flat object
/// carrying a class field, then a nested `result`, then nothing.
#[derive(Debug)]
pub enum UpstreamShape<'a> {
    RankedList(Vec<(&'a str, f64)>),
    SingleObject(&'a Map<String, Value>),
    Nested(&'a Value),
    Unrecognized,
}

pub fn classify_shape(body: &Value) -> UpstreamShape<'_> {
    match body {
        Value::Array(entries) => {
            let ranked: Vec<(&str, f64)> = entries
                .iter()
                .filter_map(|entry| {
                    let label = entry.get("label")?.as_str()?;
                    let score = entry.get("score").and_then(coerce_number)?;
                    Some((label, score))
                })
                .collect();

            if ranked.is_empty() {
                UpstreamShape::Unrecognized
            } else {
                UpstreamShape::RankedList(ranked)
            }
        }
        Value::Object(map) => {
            if class_field(map).is_some() {
                UpstreamShape::SingleObject(map)
            } else if let Some(inner) = map.get("result") {
                UpstreamShape::Nested(inner)
            } else {
                UpstreamShape::Unrecognized
            }
        }
        _ => UpstreamShape::Unrecognized,
    }
}

/// Collapse an arbitrary upstream body into the canonical result.
/// `processing_time` is left unset; the caller attaches its own measurement.
pub fn normalize(body: &Value) -> ClassificationResult {
    match classify_shape(body) {
        UpstreamShape::RankedList(entries) => {
            let mut best = entries[0];
            for entry in &entries[1..] {
                if entry.1 > best.1 {
                    best = *entry;
                }
            }
            ClassificationResult {
                class: best.0.to_string(),
                confidence: clamp_confidence(best.1),
                processing_time: None,
            }
        }
        UpstreamShape::SingleObject(map) => {
            let class = class_field(map).unwrap_or(DEFAULT_CLASS);
            let confidence = CONFIDENCE_FIELDS
                .iter()
                .find_map(|field| map.get(*field))
                .map(|value| {
                    coerce_number(value)
                        .map(clamp_confidence)
                        .unwrap_or(DEFAULT_CONFIDENCE)
                })
                .unwrap_or(DEFAULT_CONFIDENCE);

            ClassificationResult {
                class: class.to_string(),
                confidence,
                processing_time: None,
            }
        }
        UpstreamShape::Nested(inner) => normalize(inner),
        UpstreamShape::Unrecognized => ClassificationResult::fallback(None),
    }
}

fn class_field(map: &Map<String, Value>) -> Option<&str> {
    CLASS_FIELDS
        .iter()
        .find_map(|field| map.get(*field).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_input_is_idempotent() {
        let body = json!({ "class": "plastic", "confidence": 0.42 });
        let result = normalize(&body);
        assert_eq!(result.class, "plastic");
        assert_eq!(result.confidence, 0.42);
    }

    #[test]
    fn ranked_list_picks_max_score() {
        let body = json!([
            { "label": "glass", "score": 0.4 },
            { "label": "plastic", "score": 0.95 }
        ]);
        let result = normalize(&body);
        assert_eq!(result.class, "plastic");
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn alternate_field_names_are_recognized() {
        let body = json!({ "prediction": "organic", "probability": 0.77 });
        let result = normalize(&body);
        assert_eq!(result.class, "organic");
        assert_eq!(result.confidence, 0.77);
    }

    #[test]
    fn nested_result_is_recursed_into() {
        let body = json!({ "result": { "label": "metal", "score": 0.6 } });
        let result = normalize(&body);
        assert_eq!(result.class, "metal");
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn empty_object_falls_back_to_default() {
        let result = normalize(&json!({}));
        assert_eq!(result.class, DEFAULT_CLASS);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn non_object_bodies_fall_back_to_default() {
        for body in [json!("plastic"), json!(3.5), json!(null), json!([1, 2])] {
            let result = normalize(&body);
            assert_eq!(result.class, DEFAULT_CLASS);
            assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        }
    }

    #[test]
    fn class_field_order_wins_over_later_fields() {
        let body = json!({ "label": "glass", "class": "metal", "confidence": 0.5 });
        let result = normalize(&body);
        assert_eq!(result.class, "metal");
    }

    #[test]
    fn missing_confidence_defaults() {
        let result = normalize(&json!({ "class": "paper" }));
        assert_eq!(result.class, "paper");
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn unparseable_confidence_defaults() {
        let result = normalize(&json!({ "class": "paper", "confidence": "high" }));
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn numeric_string_confidence_is_coerced() {
        let result = normalize(&json!({ "class": "paper", "confidence": "0.66" }));
        assert_eq!(result.confidence, 0.66);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let result = normalize(&json!({ "class": "paper", "confidence": 1.7 }));
        assert_eq!(result.confidence, 1.0);
        let result = normalize(&json!({ "class": "paper", "confidence": -0.3 }));
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn ranked_list_skips_malformed_entries() {
        let body = json!([
            { "label": "glass" },
            { "label": "plastic", "score": 0.3 },
            { "score": 0.99 }
        ]);
        let result = normalize(&body);
        assert_eq!(result.class, "plastic");
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn class_shape_takes_priority_over_nested_result() {
        let body = json!({
            "class": "cardboard",
            "confidence": 0.8,
            "result": { "label": "metal", "score": 0.6 }
        });
        let result = normalize(&body);
        assert_eq!(result.class, "cardboard");
    }
}
