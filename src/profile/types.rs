//! Records produced by the profile extractor.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::semantic::IndexedDocument;

/// Fill value used by Argo files for missing readings.
pub const MISSING_VALUE: f64 = -999.0;

/// Parameters read from each profile, in scan order.
pub const SUPPORTED_PARAMETERS: &[&str] = &[
    "TEMP",
    "PSAL",
    "PRES",
    "DOXY",
    "CHLA",
    "BBP700",
    "PH_IN_SITU_TOTAL",
    "NITRATE",
    "DOXY_ADJUSTED",
    "TEMP_ADJUSTED",
    "PSAL_ADJUSTED",
];

/// A reading counts only if it is a number and not the missing marker.
#[inline]
#[must_use]
pub fn is_valid_reading(value: f64) -> bool {
    !value.is_nan() && value != MISSING_VALUE
}

/// Converts an Argo day offset (days since 1950-01-01) to a timestamp.
///
/// Returns `None` for NaN, infinite or out-of-range offsets.
#[must_use]
pub fn argo_date(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let micros = (days * 86_400_000_000.0).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1950, 1, 1)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(TimeDelta::microseconds(micros as i64))
}

/// ISO-8601 rendering used in documents, identical to the serde form.
#[must_use]
pub fn format_timestamp(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Readings of one parameter within one profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Valid readings in level order
    pub values: Vec<f64>,
    /// Pressure at the same levels; empty when the file has no `PRES`
    pub pressure: Vec<f64>,
    /// Quality flags passed through from the file
    pub qc_flags: Option<String>,
}

impl Measurement {
    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("values".to_string(), Value::from(self.values.clone()));
        map.insert("pressure".to_string(), Value::from(self.pressure.clone()));
        map.insert(
            "qc_flags".to_string(),
            self.qc_flags.clone().map_or(Value::Null, Value::from),
        );
        Value::Object(map)
    }
}

/// Parameter code to measurement, kept in scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurements(Vec<(String, Measurement)>);

impl Measurements {
    pub fn insert(&mut self, code: impl Into<String>, measurement: Measurement) {
        let code = code.into();
        match self.0.iter_mut().find(|(c, _)| *c == code) {
            Some((_, existing)) => *existing = measurement,
            None => self.0.push((code, measurement)),
        }
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Measurement> {
        self.0.iter().find(|(c, _)| c == code).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Measurement)> {
        self.0.iter().map(|(c, m)| (c.as_str(), m))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Measurements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// One measurement cycle of one float.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub profile_id: usize,
    pub date: Option<NaiveDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub measurements: Measurements,
}

impl ProfileRecord {
    /// Converts the profile into a document for the index.
    ///
    /// Absent coordinates and dates are left out rather than stored as null.
    #[must_use]
    pub fn to_document(&self, float_id: Option<&str>) -> IndexedDocument {
        let mut doc = IndexedDocument::new();
        if let Some(id) = float_id {
            doc.insert("float_id", id);
        }
        doc.insert("profile_id", self.profile_id);
        if let Some(lat) = self.latitude {
            doc.insert("latitude", lat);
        }
        if let Some(lon) = self.longitude {
            doc.insert("longitude", lon);
        }
        if let Some(date) = &self.date {
            doc.insert("date", format_timestamp(date));
        }

        let measurements: Map<String, Value> = self
            .measurements
            .iter()
            .map(|(code, m)| (code.to_string(), m.to_value()))
            .collect();
        doc.insert("measurements", measurements);
        doc
    }
}

/// Positions of a float across all of its profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectoryRecord {
    /// `[longitude, latitude]` pairs
    pub coordinates: Vec<[f64; 2]>,
    pub dates: Vec<NaiveDateTime>,
    pub float_id: Option<String>,
}

/// File-level attributes and layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FloatMetadata {
    pub platform_number: String,
    pub institution: String,
    pub source: String,
    pub date_creation: String,
    pub data_mode: String,
    pub format_version: String,
    pub dimensions: BTreeMap<String, usize>,
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Everything read from one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub metadata: FloatMetadata,
    pub profiles: Vec<ProfileRecord>,
    pub trajectory: TrajectoryRecord,
    pub message: String,
}

impl Extraction {
    #[must_use]
    pub fn new(
        metadata: FloatMetadata,
        profiles: Vec<ProfileRecord>,
        trajectory: TrajectoryRecord,
    ) -> Self {
        let message = format!("Successfully processed {} profiles", profiles.len());
        Self {
            metadata,
            profiles,
            trajectory,
            message,
        }
    }

    /// Float identifier from the metadata, falling back to the trajectory.
    #[must_use]
    pub fn float_id(&self) -> Option<&str> {
        self.metadata
            .float_id
            .as_deref()
            .or(self.trajectory.float_id.as_deref())
    }

    /// Index documents for every profile, tagged with the float id.
    #[must_use]
    pub fn documents(&self) -> Vec<IndexedDocument> {
        let float_id = self.float_id();
        self.profiles
            .iter()
            .map(|profile| profile.to_document(float_id))
            .collect()
    }
}
