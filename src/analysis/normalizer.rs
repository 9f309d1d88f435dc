use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::error::AnalysisError;

pub const UNKNOWN_FOOD: &str = "Unknown food";
pub const FALLBACK_FOOD_NAME: &str = "Sample data (analysis unavailable)";
const PARSE_SNIPPET_CHARS: usize = 100;

/// Candidate upstream keys per attribute, probed in order; first present wins.
pub const CALORIE_KEYS: &[&str] = &["totalCalories", "calories", "kcal"];
pub const PROTEIN_KEYS: &[&str] = &["protein", "proteins"];
pub const CARB_KEYS: &[&str] = &["carbohydrates", "carbs", "carbohydrate"];
pub const FAT_KEYS: &[&str] = &["fat", "fats", "lipid"];
pub const FOOD_KEYS: &[&str] = &["food", "foodName", "name"];
pub const DESCRIPTION_KEYS: &[&str] = &["description", "summary"];

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
}

/// Canonical nutrition record. Grams for macros, kcal for calories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub food_name: String,
    pub description: String,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
}

impl AnalysisResult {
    /// Clearly labelled sample values shown when the real analysis failed.
    pub fn placeholder<R: Rng>(rng: &mut R) -> Self {
        Self {
            calories: rng.gen_range(200..700) as f64,
            protein: rng.gen_range(10..40) as f64,
            carbs: rng.gen_range(20..80) as f64,
            fat: rng.gen_range(5..30) as f64,
            food_name: FALLBACK_FOOD_NAME.to_string(),
            description: "The real analysis failed. Check the analysis webhook URL and its workflow; sample data is shown instead.".to_string(),
            is_fallback: true,
            raw_response: None,
        }
    }
}

/// Parses the webhook's raw text and maps it onto `AnalysisResult`.
pub fn normalize(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let parsed: Value = serde_json::from_str(raw).map_err(|_| AnalysisError::Parse {
        snippet: raw.chars().take(PARSE_SNIPPET_CHARS).collect(),
    })?;
    Ok(normalize_value(parsed))
}

pub fn normalize_value(parsed: Value) -> AnalysisResult {
    let food_name = probe_text(&parsed, FOOD_KEYS).unwrap_or_else(|| UNKNOWN_FOOD.to_string());
    let description = probe_text(&parsed, DESCRIPTION_KEYS)
        .unwrap_or_else(|| format!("Analyzed food: {}", food_name));

    AnalysisResult {
        calories: probe_number(&parsed, CALORIE_KEYS),
        protein: probe_number(&parsed, PROTEIN_KEYS),
        carbs: probe_number(&parsed, CARB_KEYS),
        fat: probe_number(&parsed, FAT_KEYS),
        food_name,
        description,
        is_fallback: false,
        raw_response: Some(parsed),
    }
}

fn probe<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// First present candidate coerced to a number; 0 when absent or unparseable.
pub fn probe_number(obj: &Value, keys: &[&str]) -> f64 {
    probe(obj, keys).map(extract_number).unwrap_or(0.0)
}

fn probe_text(obj: &Value, keys: &[&str]) -> Option<String> {
    match probe(obj, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers pass through; strings yield their first decimal substring
/// (`"45g"` -> 45, `"about 12.5 g"` -> 12.5); anything else is 0.
pub fn extract_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => NUMBER_RE
            .captures(s)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}
