//! Structured result of the extract-and-score prompt.
//!
//! The model is asked for JSON, but nothing guarantees it complies. `parse_lead_analysis`
//! is the single place that decides whether a reply is usable; anything it rejects is
//! reported as unparseable rather than stored as opaque text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Lead score on a 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LeadScore(u8);

impl LeadScore {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Accepts integral or fractional numbers; fractions are rounded to the nearest point.
    fn from_f64(value: f64) -> Result<Self, String> {
        let out_of_range = || format!("score {value} is outside 0..=100");
        if !value.is_finite() || value < 0.0 {
            return Err(out_of_range());
        }
        Self::new(value.round().min(f64::from(u8::MAX)) as u8).ok_or_else(out_of_range)
    }
}

impl fmt::Display for LeadScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for LeadScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for LeadScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawScore {
            Number(f64),
            Text(String),
        }

        let value = match RawScore::deserialize(deserializer)? {
            RawScore::Number(n) => n,
            RawScore::Text(s) => s
                .trim()
                .trim_end_matches("/100")
                .trim()
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("score '{s}' is not a number")))?,
        };
        LeadScore::from_f64(value).map_err(serde::de::Error::custom)
    }
}

/// Coarse qualitative bucket assigned by the analysis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    Hot,
    Warm,
    Cold,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(Category::Hot),
            "warm" => Ok(Category::Warm),
            "cold" => Ok(Category::Cold),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum InterestLevel {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl From<String> for InterestLevel {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "very high" => InterestLevel::High,
            "medium" | "moderate" => InterestLevel::Medium,
            "low" | "very low" | "none" => InterestLevel::Low,
            _ => InterestLevel::Unknown,
        }
    }
}

/// Qualification fields pulled out of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub interest_level: InterestLevel,
    #[serde(default, deserialize_with = "lenient_text")]
    pub budget: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timeline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub program_interest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadAnalysis {
    pub extracted_fields: ExtractedFields,
    pub score: LeadScore,
    pub category: Category,
    pub summary: String,
}

const FIELD_KEYS: [&str; 4] = ["interest_level", "budget", "timeline", "program_interest"];

/// Reads free-text fields that models like to answer with numbers (`"budget": 20000`)
/// or nulls. Empty strings become `None`.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    })
}

/// Parses the raw reply of the extract-and-score prompt.
///
/// Tolerates markdown code fences, prose around a single JSON object, and the flat layout
/// where the extracted fields sit next to `score` instead of under `extracted_fields`.
pub fn parse_lead_analysis(raw: &str) -> Result<LeadAnalysis, String> {
    let json = extract_json_object(raw).ok_or_else(|| "no JSON object found".to_string())?;
    let mut value: Value =
        serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| "top-level JSON is not an object".to_string())?;
    if !object.contains_key("extracted_fields") {
        let flat: serde_json::Map<String, Value> = FIELD_KEYS
            .iter()
            .filter_map(|key| object.remove(*key).map(|v| (key.to_string(), v)))
            .collect();
        object.insert("extracted_fields".to_string(), Value::Object(flat));
    }

    let analysis: LeadAnalysis =
        serde_json::from_value(value).map_err(|e| format!("unexpected shape: {e}"))?;
    if analysis.summary.trim().is_empty() {
        return Err("summary is empty".to_string());
    }
    Ok(analysis)
}

/// Finds the JSON object inside a model reply, stripping code fences and surrounding prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let text = crate::llm_client::strip_json_fences(text);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
