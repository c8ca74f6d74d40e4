use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifies one top-level `parse()` call in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is enough to correlate interleaved log lines.
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh-TW")]
    ChineseTw,
    #[serde(rename = "en-US")]
    EnglishUs,
}

impl Language {
    /// BCP-47 tag handed to speech engines.
    pub fn tag(self) -> &'static str {
        match self {
            Language::ChineseTw => "zh-TW",
            Language::EnglishUs => "en-US",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language tag: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh-tw" | "zh" | "zh-hant" => Ok(Language::ChineseTw),
            "en-us" | "en" => Ok(Language::EnglishUs),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// Severity attached to a status notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

/// Structured admission-note fields decoded from the model's JSON answer.
///
/// Every field is optional. Values are strings, booleans or nested objects
/// (vitals, allergy records, family/social history).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicalData(pub Map<String, Value>);

impl ClinicalData {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copies present fields onto `existing`.
    ///
    /// Null and empty-string values are skipped so an absent answer never
    /// clears what is already there; nested objects are merged key by key.
    pub fn merge_into(&self, existing: &mut Map<String, Value>) {
        merge_map(&self.0, existing);
    }
}

fn merge_map(src: &Map<String, Value>, dst: &mut Map<String, Value>) {
    for (key, value) in src {
        match value {
            Value::Null => {}
            Value::String(s) if s.trim().is_empty() => {}
            Value::Object(inner) => {
                let slot = dst
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                match slot {
                    Value::Object(dst_inner) => merge_map(inner, dst_inner),
                    other => *other = Value::Object(inner.clone()),
                }
            }
            other => {
                dst.insert(key.clone(), other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn language_tags_round_trip_through_serde() {
        assert_eq!(Language::ChineseTw.tag(), "zh-TW");
        let s = serde_json::to_string(&Language::EnglishUs).unwrap();
        assert_eq!(s, "\"en-US\"");
        let back: Language = serde_json::from_str("\"zh-TW\"").unwrap();
        assert_eq!(back, Language::ChineseTw);
    }

    #[test]
    fn language_from_str_is_lenient_on_case() {
        assert_eq!("EN-us".parse::<Language>().unwrap(), Language::EnglishUs);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::ChineseTw);
        assert!("fr-FR".parse::<Language>().is_err());
    }

    #[test]
    fn clinical_data_rejects_non_objects() {
        assert!(ClinicalData::from_value(json!([1, 2])).is_none());
        let data = ClinicalData::from_value(json!({"chief_complaint": "fever"})).unwrap();
        assert_eq!(data.get_str("chief_complaint"), Some("fever"));
    }

    #[test]
    fn merge_skips_absent_and_null_fields() {
        let mut form = json!({
            "chief_complaint": "cough",
            "vitals": {"bp": "120/80", "hr": "88"},
            "smoking": false
        });
        let update = ClinicalData::from_value(json!({
            "chief_complaint": null,
            "present_illness": "3 days of fever",
            "vitals": {"hr": "102", "temp": ""},
            "smoking": true
        }))
        .unwrap();

        update.merge_into(form.as_object_mut().unwrap());

        assert_eq!(form["chief_complaint"], "cough");
        assert_eq!(form["present_illness"], "3 days of fever");
        assert_eq!(form["vitals"]["bp"], "120/80");
        assert_eq!(form["vitals"]["hr"], "102");
        assert!(form["vitals"].get("temp").is_none());
        assert_eq!(form["smoking"], true);
    }
}
