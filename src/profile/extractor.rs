//! Turns an Argo float file into profile, trajectory and metadata records.
//!
//! Opening the container is the only fatal step. The three stages are
//! computed independently and a failing stage is replaced by its empty
//! value, with a warning, so one malformed variable does not discard the
//! rest of the file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::error::{ExtractError, ExtractResult};
use crate::profile::{
    ArrayContainer, Extraction, FloatMetadata, Measurement, Measurements, NetcdfContainer,
    ProfileRecord, SUPPORTED_PARAMETERS, TrajectoryRecord, argo_date, is_valid_reading,
};

/// Global attributes copied into [`FloatMetadata`].
const METADATA_ATTRIBUTES: [&str; 6] = [
    "platform_number",
    "institution",
    "source",
    "date_creation",
    "data_mode",
    "format_version",
];

/// File extensions accepted for upload.
const SUPPORTED_EXTENSIONS: &[&str] = &["nc", "netcdf"];

/// Whether an uploaded file name looks like a NetCDF file.
pub fn is_supported_file_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Extracts records from Argo array files.
#[derive(Debug, Clone)]
pub struct ProfileExtractor {
    parameters: Vec<String>,
}

impl Default for ProfileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileExtractor {
    /// Extractor for the standard Argo parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parameters(SUPPORTED_PARAMETERS.iter().copied())
    }

    /// Extractor scanning `parameters`, in the given order.
    pub fn with_parameters<I, S>(parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Extracts from the raw bytes of an uploaded file.
    ///
    /// The bytes are staged in a temporary file which is removed on every
    /// exit path.
    pub fn extract(&self, bytes: &[u8]) -> ExtractResult<Extraction> {
        let mut staged = tempfile::Builder::new()
            .prefix("floatrag-")
            .suffix(".nc")
            .tempfile()
            .map_err(|source| ExtractError::Staging { source })?;
        staged
            .write_all(bytes)
            .and_then(|()| staged.flush())
            .map_err(|source| ExtractError::Staging { source })?;

        self.extract_file(staged.path())
    }

    /// Extracts from a file on disk.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> ExtractResult<Extraction> {
        let path = path.as_ref();
        let mut container = NetcdfContainer::open(path)?;
        let extraction = self.extract_container(&mut container);
        tracing::info!(
            path = %path.display(),
            profiles = extraction.profiles.len(),
            positions = extraction.trajectory.coordinates.len(),
            "extracted float file"
        );
        Ok(extraction)
    }

    /// Runs every stage against an open container.
    pub fn extract_container<C: ArrayContainer>(&self, container: &mut C) -> Extraction {
        let metadata = degrade("metadata", self.metadata(container));
        let profiles = degrade("profiles", self.profiles(container));
        let trajectory = degrade("trajectory", self.trajectory(container));
        Extraction::new(metadata, profiles, trajectory)
    }

    /// File attributes, layout and platform identifiers.
    pub fn metadata<C: ArrayContainer>(&self, container: &mut C) -> ExtractResult<FloatMetadata> {
        let [platform_number, institution, source, date_creation, data_mode, format_version] =
            METADATA_ATTRIBUTES.map(|name| container.global_attribute(name).unwrap_or_default());

        let dimensions: BTreeMap<String, usize> = container.dimensions().into_iter().collect();

        Ok(FloatMetadata {
            platform_number,
            institution,
            source,
            date_creation,
            data_mode,
            format_version,
            dimensions,
            variables: container.variable_names(),
            float_id: first_row(container, "PLATFORM_NUMBER")?,
            project: first_row(container, "PROJECT_NAME")?,
        })
    }

    /// One record per `N_PROF` entry.
    pub fn profiles<C: ArrayContainer>(
        &self,
        container: &mut C,
    ) -> ExtractResult<Vec<ProfileRecord>> {
        let n_prof = container.dimension_len("N_PROF").unwrap_or(0);
        let n_levels = container.dimension_len("N_LEVELS").unwrap_or(0);

        let latitudes = read_optional(container, "LATITUDE")?;
        let longitudes = read_optional(container, "LONGITUDE")?;
        let days = read_optional(container, "JULD")?;
        let pressure = read_optional(container, "PRES")?;
        let profile_qc = read_optional_text(container, "PROFILE_PRES_QC")?;

        let mut parameters = Vec::new();
        for code in &self.parameters {
            if !container.has_variable(code) {
                continue;
            }
            let values = container.read_numeric(code)?;
            let qc = read_optional_text(container, &format!("{code}_QC"))?;
            parameters.push((code.as_str(), values, qc));
        }

        let mut profiles = Vec::with_capacity(n_prof);
        for index in 0..n_prof {
            let latitude = optional_element(latitudes.as_deref(), "LATITUDE", index)?;
            let longitude = optional_element(longitudes.as_deref(), "LONGITUDE", index)?;
            let date = optional_element(days.as_deref(), "JULD", index)?.and_then(argo_date);

            let mut measurements = Measurements::default();
            for (code, values, qc) in &parameters {
                let row = level_row(values, code, index, n_levels)?;
                let mask: Vec<bool> = row.iter().map(|v| is_valid_reading(*v)).collect();
                if !mask.contains(&true) {
                    continue;
                }

                let pressure_row = match pressure.as_deref() {
                    Some(pres) => apply_mask(level_row(pres, "PRES", index, n_levels)?, &mask),
                    None => Vec::new(),
                };

                let qc_flags = qc
                    .as_ref()
                    .or(profile_qc.as_ref())
                    .and_then(|rows| rows.get(index).cloned());

                measurements.insert(
                    *code,
                    Measurement {
                        values: apply_mask(row, &mask),
                        pressure: pressure_row,
                        qc_flags,
                    },
                );
            }

            profiles.push(ProfileRecord {
                profile_id: index,
                date,
                latitude,
                longitude,
                measurements,
            });
        }

        Ok(profiles)
    }

    /// Positions across all profiles, skipping invalid coordinates.
    pub fn trajectory<C: ArrayContainer>(
        &self,
        container: &mut C,
    ) -> ExtractResult<TrajectoryRecord> {
        let mut trajectory = TrajectoryRecord {
            float_id: first_row(container, "PLATFORM_NUMBER")?,
            ..TrajectoryRecord::default()
        };

        if !(container.has_variable("LATITUDE") && container.has_variable("LONGITUDE")) {
            return Ok(trajectory);
        }

        let latitudes = container.read_numeric("LATITUDE")?;
        let longitudes = container.read_numeric("LONGITUDE")?;
        if latitudes.len() != longitudes.len() {
            return Err(ExtractError::Shape {
                name: "LONGITUDE".to_string(),
                actual: longitudes.len(),
                expected: latitudes.len(),
            });
        }

        let valid: Vec<usize> = latitudes
            .iter()
            .zip(&longitudes)
            .enumerate()
            .filter(|(_, (lat, lon))| !lat.is_nan() && !lon.is_nan())
            .map(|(i, _)| i)
            .collect();

        trajectory.coordinates = valid
            .iter()
            .map(|&i| [longitudes[i], latitudes[i]])
            .collect();

        if let Some(days) = read_optional(container, "JULD")? {
            for &i in &valid {
                let day = element(&days, "JULD", i)?;
                if let Some(date) = argo_date(day) {
                    trajectory.dates.push(date);
                }
            }
        }

        Ok(trajectory)
    }
}

/// Replaces a failed stage with its empty value.
fn degrade<T: Default>(stage: &'static str, result: ExtractResult<T>) -> T {
    result.unwrap_or_else(|e| {
        let degraded = ExtractError::Stage {
            stage,
            reason: e.to_string(),
        };
        tracing::warn!(
            code = %degraded.status_code(),
            cause = %e.status_code(),
            "{degraded}"
        );
        T::default()
    })
}

fn read_optional<C: ArrayContainer>(
    container: &mut C,
    name: &str,
) -> ExtractResult<Option<Vec<f64>>> {
    if container.has_variable(name) {
        container.read_numeric(name).map(Some)
    } else {
        Ok(None)
    }
}

fn read_optional_text<C: ArrayContainer>(
    container: &mut C,
    name: &str,
) -> ExtractResult<Option<Vec<String>>> {
    if container.has_variable(name) {
        container.read_text_rows(name).map(Some)
    } else {
        Ok(None)
    }
}

fn first_row<C: ArrayContainer>(container: &mut C, name: &str) -> ExtractResult<Option<String>> {
    Ok(read_optional_text(container, name)?.and_then(|rows| rows.into_iter().next()))
}

fn element(values: &[f64], name: &str, index: usize) -> ExtractResult<f64> {
    values.get(index).copied().ok_or_else(|| ExtractError::Shape {
        name: name.to_string(),
        actual: values.len(),
        expected: index + 1,
    })
}

/// A per-profile scalar, `None` when the variable is absent or NaN.
fn optional_element(
    values: Option<&[f64]>,
    name: &str,
    index: usize,
) -> ExtractResult<Option<f64>> {
    match values {
        Some(values) => Ok(Some(element(values, name, index)?).filter(|v| !v.is_nan())),
        None => Ok(None),
    }
}

/// Row `index` of an `[N_PROF, N_LEVELS]` variable.
fn level_row<'a>(
    values: &'a [f64],
    name: &str,
    index: usize,
    n_levels: usize,
) -> ExtractResult<&'a [f64]> {
    let start = index * n_levels;
    values
        .get(start..start + n_levels)
        .ok_or_else(|| ExtractError::Shape {
            name: name.to_string(),
            actual: values.len(),
            expected: start + n_levels,
        })
}

fn apply_mask(row: &[f64], mask: &[bool]) -> Vec<f64> {
    row.iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(value, _)| *value)
        .collect()
}
