//! Documents stored in the index and their searchable text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Human readable names appended to the searchable text for known codes.
pub const PARAMETER_SYNONYMS: &[(&str, &str)] = &[
    ("TEMP", "temperature"),
    ("PSAL", "salinity"),
    ("PRES", "pressure"),
    ("DOXY", "dissolved oxygen"),
    ("CHLA", "chlorophyll-a"),
    ("BBP700", "backscattering"),
    ("PH_IN_SITU_TOTAL", "pH"),
    ("NITRATE", "nitrate"),
];

/// Looks up the synonym for a parameter code.
#[must_use]
pub fn parameter_synonym(code: &str) -> Option<&'static str> {
    PARAMETER_SYNONYMS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Any JSON object added to the index.
///
/// Field order is kept as inserted. Profiles converted with
/// [`crate::profile::ProfileRecord::to_document`] carry `float_id`,
/// `latitude`, `longitude`, `date` and `measurements`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexedDocument(Map<String, Value>);

impl IndexedDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    #[must_use]
    pub fn float_id(&self) -> Option<String> {
        self.get("float_id").map(display_value)
    }

    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.get("latitude").and_then(Value::as_f64)
    }

    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.get("longitude").and_then(Value::as_f64)
    }

    #[must_use]
    pub fn date(&self) -> Option<String> {
        self.get("date").map(display_value)
    }

    /// Both coordinates, when both are numbers.
    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude()?, self.longitude()?))
    }

    /// Parameter codes under `measurements`, in stored order.
    ///
    /// `None` when the document has no `measurements` object.
    #[must_use]
    pub fn parameter_names(&self) -> Option<Vec<&str>> {
        self.get("measurements")
            .and_then(Value::as_object)
            .map(|m| m.keys().map(String::as_str).collect())
    }

    /// Numeric readings of one parameter, skipping non-numbers.
    #[must_use]
    pub fn parameter_values(&self, code: &str) -> Vec<f64> {
        self.get("measurements")
            .and_then(|m| m.get(code))
            .and_then(|m| m.get("values"))
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }

    /// Deterministic text rendering used for embedding.
    ///
    /// Parts, in order: float id, location, date, parameter list, one
    /// synonym per known parameter, basin label and the equatorial tag.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        let mut parts = Vec::new();

        if let Some(id) = self.float_id() {
            parts.push(format!("Float ID: {id}"));
        }

        let position = self.position();
        if let Some((lat, lon)) = position {
            parts.push(format_location(lat, lon));
        }

        if let Some(date) = self.date() {
            parts.push(format!("Date: {date}"));
        }

        if let Some(params) = self.parameter_names() {
            parts.push(format!("Parameters: {}", params.join(", ")));
            parts.extend(
                params
                    .iter()
                    .filter_map(|p| parameter_synonym(p))
                    .map(str::to_string),
            );
        }

        if let Some((lat, lon)) = position {
            parts.push(ocean_basin(lat, lon).to_string());
            if is_equatorial(lat) {
                parts.push("equatorial region".to_string());
            }
        }

        parts.join(" ")
    }
}

impl TryFrom<Value> for IndexedDocument {
    type Error = Value;

    /// Accepts JSON objects; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl From<Map<String, Value>> for IndexedDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A search hit. The score lives only on results and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: IndexedDocument,
    pub similarity_score: f32,
}

/// `Location: 12.35°N, 67.89°E` with two decimals.
#[must_use]
pub fn format_location(lat: f64, lon: f64) -> String {
    format!("Location: {lat:.2}°N, {lon:.2}°E")
}

/// Coarse basin label, rules checked in order.
///
/// The Arabian Sea box lies inside the Indian Ocean box and so never
/// matches; the order is kept as is since the label is only search text.
#[must_use]
pub fn ocean_basin(lat: f64, lon: f64) -> &'static str {
    const RULES: &[(fn(f64, f64) -> bool, &str)] = &[
        (
            |lat, lon| (-20.0..=30.0).contains(&lat) && (30.0..=100.0).contains(&lon),
            "Indian Ocean",
        ),
        (
            |lat, lon| (-10.0..=25.0).contains(&lat) && (50.0..=80.0).contains(&lon),
            "Arabian Sea",
        ),
        (|lat, _| lat >= 0.0, "Northern Hemisphere"),
    ];

    RULES
        .iter()
        .find(|(matches, _)| matches(lat, lon))
        .map_or("Southern Hemisphere", |(_, label)| label)
}

/// Within five degrees of the equator.
#[must_use]
pub fn is_equatorial(lat: f64) -> bool {
    (-5.0..=5.0).contains(&lat)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> IndexedDocument {
        IndexedDocument::try_from(json!({
            "float_id": "2902746",
            "latitude": 12.3456,
            "longitude": 67.891,
            "date": "2023-03-01T06:00:00",
            "measurements": {
                "TEMP": {"values": [28.1, 12.5, 4.2], "pressure": [5.0, 100.0, 1000.0]},
                "PSAL": {"values": [35.1, 35.0], "pressure": [5.0, 100.0]},
                "CUSTOM": {"values": [1.0], "pressure": [5.0]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_searchable_text() {
        let text = sample().searchable_text();
        assert_eq!(
            text,
            "Float ID: 2902746 Location: 12.35°N, 67.89°E Date: 2023-03-01T06:00:00 \
             Parameters: TEMP, PSAL, CUSTOM temperature salinity Indian Ocean"
        );
    }

    #[test]
    fn test_searchable_text_without_position() {
        let doc = IndexedDocument::new()
            .with("float_id", 42)
            .with("latitude", Value::Null)
            .with("longitude", 10.0);
        assert_eq!(doc.searchable_text(), "Float ID: 42");
    }

    #[test]
    fn test_ocean_basin_order() {
        assert_eq!(ocean_basin(10.0, 60.0), "Indian Ocean");
        // Inside the Arabian Sea box but shadowed by the Indian Ocean box
        assert_eq!(ocean_basin(0.0, 55.0), "Indian Ocean");
        assert_eq!(ocean_basin(40.0, -30.0), "Northern Hemisphere");
        assert_eq!(ocean_basin(0.0, -30.0), "Northern Hemisphere");
        assert_eq!(ocean_basin(-40.0, 150.0), "Southern Hemisphere");
        assert_eq!(ocean_basin(-20.0, 30.0), "Indian Ocean");
    }

    #[test]
    fn test_equatorial_tag() {
        let doc = IndexedDocument::new()
            .with("latitude", -3.0)
            .with("longitude", -140.0);
        assert_eq!(
            doc.searchable_text(),
            "Location: -3.00°N, -140.00°E Southern Hemisphere equatorial region"
        );
        assert!(is_equatorial(5.0));
        assert!(!is_equatorial(5.01));
    }

    #[test]
    fn test_parameter_accessors() {
        let doc = sample();
        assert_eq!(
            doc.parameter_names().unwrap(),
            vec!["TEMP", "PSAL", "CUSTOM"]
        );
        assert_eq!(doc.parameter_values("PSAL"), vec![35.1, 35.0]);
        assert!(doc.parameter_values("DOXY").is_empty());
        assert_eq!(doc.float_id().as_deref(), Some("2902746"));
    }

    #[test]
    fn test_scored_document_serializes_flat() {
        let scored = ScoredDocument {
            document: IndexedDocument::new().with("float_id", "1"),
            similarity_score: 0.5,
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value, json!({"float_id": "1", "similarity_score": 0.5}));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(IndexedDocument::try_from(json!([1, 2])).is_err());
    }
}
