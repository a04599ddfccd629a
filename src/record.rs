//! JSON line → typed intermediate record.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::InvalidDataError;
use crate::nutrients::NutrientTriple;

/// A loosely-typed OpenFoodFacts record. Unknown fields are ignored; every
/// field is optional here, the validator enforces which are required.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRecord {
    pub id: Option<String>,
    pub code: Option<String>,
    pub created_t: Option<i64>,
    pub last_updated_t: Option<i64>,
    pub product_name: Option<String>,
    #[serde(flatten)]
    pub localized_names: HashMap<String, Value>,
    pub product_quantity: Option<f64>,
    pub product_quantity_unit: Option<String>,
    pub serving_quantity: Option<f64>,
    pub serving_quantity_unit: Option<String>,
    pub nutrition_data_per: Option<String>,
    pub codes_tags: Option<Vec<String>>,
    pub no_nutrition_data: Option<Value>,
    pub obsolete: Option<Value>,
    pub brands: Option<String>,
    pub nutriments: Option<HashMap<String, Value>>,
    pub nutriments_estimated: Option<HashMap<String, Value>>,
}

/// Languages whose `product_name_<lang>` field may be carried through as a
/// localized name.
pub const LANGUAGES: &[&str] = &[
    "ar", "bg", "ca", "ch", "cs", "da", "de", "el", "en", "es", "et", "fi", "fr", "he", "hr",
    "hu", "id", "it", "ja", "la", "lc", "lt", "lv", "nb", "nl", "no", "pl", "pt", "ro", "ru",
    "sk", "sl", "sr", "sv", "th", "tr", "uk", "vi", "zh",
];

impl RawRecord {
    /// UTF-8 decode then JSON decode one framed line. A decode failure
    /// surfaces the underlying message verbatim, matching the source's
    /// diagnostic-compatibility requirement.
    pub fn parse_line(line: &[u8]) -> Result<Self, InvalidDataError> {
        let text = std::str::from_utf8(line).map_err(|e| InvalidDataError::new(e.to_string()))?;
        serde_json::from_str(text).map_err(|e| InvalidDataError::new(e.to_string()))
    }

    pub fn localized_name(&self, lang: &str) -> Option<String> {
        self.localized_names
            .get(&format!("product_name_{lang}"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// `true` if the flag-like field carries an "on"/"true" truthy value
    /// (case-insensitive), matching `no_nutrition_data`/`obsolete` semantics.
    pub fn flag_is_set(value: &Option<Value>) -> bool {
        match value {
            Some(Value::String(s)) => {
                let lower = s.to_ascii_lowercase();
                lower == "on" || lower == "true"
            }
            Some(Value::Bool(b)) => *b,
            _ => false,
        }
    }

    pub fn nutrient_source(&self) -> Option<&HashMap<String, Value>> {
        self.nutriments.as_ref().or(self.nutriments_estimated.as_ref())
    }

    /// Reads the `(value, unit, value_100g)` triple for a raw nutrient key
    /// out of whichever nutriments map is in use.
    pub fn nutrient_triple(map: &HashMap<String, Value>, raw_key: &str) -> NutrientTriple {
        let value = map.get(raw_key).and_then(Value::as_f64);
        let unit = map
            .get(&format!("{raw_key}_unit"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let value_100g = map.get(&format!("{raw_key}_100g")).and_then(Value::as_f64);
        NutrientTriple { value, unit, value_100g }
    }
}
