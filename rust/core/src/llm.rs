// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization of the multimodal model's JSON answer
//!
//! The model is asked for a JSON object but answers are loose: scores come as
//! floats or strings, counts as Korean phrases, booleans as words. Everything
//! is coerced into [`LlmAnalysis`] with defaults for missing fields. Keys the
//! normalizer does not know are preserved in `extra`.

use crate::facility::AnalysisMode;
use crate::stair_validation::StairValidation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SCORE: u8 = 5;
pub const NO_INFO: &str = "정보 없음";
pub const NO_FILTERING_INFO: &str = "필터링 정보 없음";

const SCORE_FIELDS: [&str; 3] = [
    "external_accessibility_score",
    "internal_accessibility_score",
    "final_accessibility_score",
];
const AFFIRMATIVE_ROUTE_WORDS: &[&str] = &["true", "있음", "가능", "yes"];

/// Model's confidence in its stair reading
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DetectionConfidence {
    #[serde(rename = "높음")]
    High,
    #[default]
    #[serde(rename = "보통")]
    Medium,
    #[serde(rename = "낮음")]
    Low,
}

impl DetectionConfidence {
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        match text.as_str() {
            "높음" => DetectionConfidence::High,
            "보통" => DetectionConfidence::Medium,
            "낮음" => DetectionConfidence::Low,
            t if t.contains("high") || t.contains('높') => DetectionConfidence::High,
            t if t.contains("low") || t.contains('낮') => DetectionConfidence::Low,
            _ => DetectionConfidence::Medium,
        }
    }
}

/// Normalized model answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAnalysis {
    pub external_accessibility_score: u8,
    pub internal_accessibility_score: u8,
    pub final_accessibility_score: u8,
    pub stairs_count: u32,
    pub stairs_height: String,
    pub stair_detection_confidence: DetectionConfidence,
    pub alternative_route: bool,
    pub alternative_route_description: String,
    pub recommendations: Vec<String>,
    pub observations: Vec<String>,
    pub noise_filtering_summary: String,
    /// Raw answer when it held no parsable JSON object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_mode: Option<AnalysisMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stair_validation_details: Option<StairValidation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LlmAnalysis {
    fn default() -> Self {
        normalize(Map::new())
    }
}

impl LlmAnalysis {
    /// Parse the model's text answer
    pub fn from_response_text(text: &str) -> Self {
        let object = extract_json_block(text)
            .and_then(|block| match serde_json::from_str::<Value>(block) {
                Ok(Value::Object(map)) => Some(map),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "Model answer holds malformed JSON");
                    None
                }
            });

        match object {
            Some(map) => normalize(map),
            None => LlmAnalysis {
                text_response: Some(text.trim().to_string()),
                ..Default::default()
            },
        }
    }
}

/// Slice from the first `{` to the last `}`, if any
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Coerce a raw answer object into an [`LlmAnalysis`]
pub fn normalize(mut raw: Map<String, Value>) -> LlmAnalysis {
    let [external, internal, final_score] =
        SCORE_FIELDS.map(|field| raw.remove(field).map_or(DEFAULT_SCORE, |v| score(&v)));

    let stairs_count = raw.remove("stairs_count").map_or(0, |v| stairs_count(&v));
    let stair_detection_confidence = raw
        .remove("stair_detection_confidence")
        .map_or(DetectionConfidence::default(), |v| match v {
            Value::String(s) => DetectionConfidence::parse(&s),
            _ => DetectionConfidence::default(),
        });
    let alternative_route = raw
        .remove("alternative_route")
        .map_or(false, |v| alternative_route(&v));

    let text_response = raw.remove("text_response").and_then(|v| match v {
        Value::String(s) => Some(s),
        _ => None,
    });
    let analysis_mode = raw
        .remove("analysis_mode")
        .and_then(|v| serde_json::from_value(v).ok());
    let stair_validation_details = raw
        .remove("stair_validation_details")
        .and_then(|v| serde_json::from_value(v).ok());

    LlmAnalysis {
        external_accessibility_score: external,
        internal_accessibility_score: internal,
        final_accessibility_score: final_score,
        stairs_count,
        stairs_height: text_field(&mut raw, "stairs_height", NO_INFO),
        stair_detection_confidence,
        alternative_route,
        alternative_route_description: text_field(&mut raw, "alternative_route_description", NO_INFO),
        recommendations: string_list(raw.remove("recommendations")),
        observations: string_list(raw.remove("observations")),
        noise_filtering_summary: text_field(&mut raw, "noise_filtering_summary", NO_FILTERING_INFO),
        text_response,
        analysis_mode,
        stair_validation_details,
        extra: raw,
    }
}

fn score(value: &Value) -> u8 {
    match value.as_f64() {
        Some(v) if v.is_finite() => v.round().clamp(1.0, 10.0) as u8,
        _ => DEFAULT_SCORE,
    }
}

fn stairs_count(value: &Value) -> u32 {
    match value {
        Value::String(s) if s.contains("없음") || s.contains('0') => 0,
        Value::String(s) => first_integer(s).unwrap_or(0),
        Value::Number(n) => n.as_f64().map_or(0, |v| v.max(0.0) as u32),
        _ => 0,
    }
}

fn first_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn alternative_route(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => AFFIRMATIVE_ROUTE_WORDS.contains(&s.trim().to_lowercase().as_str()),
        _ => false,
    }
}

fn text_field(raw: &mut Map<String, Value>, key: &str, default: &str) -> String {
    match raw.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Lists pass through with non-string items stringified; anything else is empty
fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}
