//! NetCDF classic files as an [`ArrayContainer`].

use netcdf3::{Attribute, DataSet, DataVector, FileReader};
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, ExtractResult};
use crate::profile::ArrayContainer;
use crate::profile::container::trim_padding;

/// Attribute marking missing values of a variable.
const FILL_VALUE_ATTR: &str = "_FillValue";

/// A NetCDF classic (CDF-1/CDF-2) file opened for reading.
///
/// Values equal to a variable's `_FillValue` are returned as NaN so the
/// extractor treats them like any other missing reading.
pub struct NetcdfContainer {
    reader: FileReader,
    path: PathBuf,
}

impl std::fmt::Debug for NetcdfContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetcdfContainer")
            .field("path", &self.path)
            .field("variables", &self.data_set().get_var_names().len())
            .finish()
    }
}

impl NetcdfContainer {
    /// Opens and decodes the header of `path`.
    pub fn open(path: impl AsRef<Path>) -> ExtractResult<Self> {
        let path = path.as_ref();
        let reader = FileReader::open(path).map_err(|e| ExtractError::Parse {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        })?;
        Ok(Self {
            reader,
            path: path.to_path_buf(),
        })
    }

    fn data_set(&self) -> &DataSet {
        self.reader.data_set()
    }

    fn read_error(&self, name: &str, reason: impl Into<String>) -> ExtractError {
        ExtractError::Read {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    fn read_raw(&mut self, name: &str) -> ExtractResult<DataVector> {
        if !self.has_variable(name) {
            return Err(self.read_error(name, "no such variable"));
        }
        self.reader
            .read_var(name)
            .map_err(|e| self.read_error(name, format!("{e:?}")))
    }

    fn fill_value(&self, name: &str) -> Option<f64> {
        self.data_set()
            .get_var_attr(name, FILL_VALUE_ATTR)
            .and_then(attribute_as_f64)
    }

    /// Number of bytes in one row of a character variable.
    fn row_len(&self, name: &str, total: usize) -> usize {
        let data_set = self.data_set();
        let dims: Vec<usize> = data_set
            .get_var(name)
            .map(|var| {
                var.dim_names()
                    .iter()
                    .filter_map(|dim| data_set.dim_size(dim))
                    .collect()
            })
            .unwrap_or_default();

        if dims.is_empty() {
            // Scalar text is a single row
            return total.max(1);
        }
        dims.iter().skip(1).product::<usize>().max(1)
    }
}

impl ArrayContainer for NetcdfContainer {
    fn dimension_len(&self, name: &str) -> Option<usize> {
        self.data_set().dim_size(name)
    }

    fn dimensions(&self) -> Vec<(String, usize)> {
        let data_set = self.data_set();
        data_set
            .dim_names()
            .into_iter()
            .filter_map(|name| data_set.dim_size(&name).map(|len| (name, len)))
            .collect()
    }

    fn variable_names(&self) -> Vec<String> {
        self.data_set().get_var_names()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.data_set().has_var(name)
    }

    fn global_attribute(&self, name: &str) -> Option<String> {
        self.data_set()
            .get_global_attr(name)
            .map(attribute_to_string)
    }

    fn read_numeric(&mut self, name: &str) -> ExtractResult<Vec<f64>> {
        let fill = self.fill_value(name);
        let mut values = match self.read_raw(name)? {
            DataVector::I8(v) => v.into_iter().map(f64::from).collect(),
            DataVector::U8(_) => {
                return Err(self.read_error(name, "character variable read as numeric"));
            }
            DataVector::I16(v) => v.into_iter().map(f64::from).collect(),
            DataVector::I32(v) => v.into_iter().map(f64::from).collect(),
            DataVector::F32(v) => v.into_iter().map(f64::from).collect(),
            DataVector::F64(v) => v,
        };

        if let Some(fill) = fill {
            for value in values.iter_mut().filter(|v| **v == fill) {
                *value = f64::NAN;
            }
        }
        Ok(values)
    }

    fn read_text_rows(&mut self, name: &str) -> ExtractResult<Vec<String>> {
        let rows = match self.read_raw(name)? {
            DataVector::U8(bytes) => {
                let row_len = self.row_len(name, bytes.len());
                bytes
                    .chunks(row_len)
                    .map(|row| trim_padding(&String::from_utf8_lossy(row)))
                    .collect()
            }
            DataVector::I8(v) => v.iter().map(ToString::to_string).collect(),
            DataVector::I16(v) => v.iter().map(ToString::to_string).collect(),
            DataVector::I32(v) => v.iter().map(ToString::to_string).collect(),
            DataVector::F32(v) => v.iter().map(ToString::to_string).collect(),
            DataVector::F64(v) => v.iter().map(ToString::to_string).collect(),
        };
        Ok(rows)
    }
}

/// Whether `path` opens as a NetCDF classic file.
pub fn validate(path: impl AsRef<Path>) -> bool {
    NetcdfContainer::open(path).is_ok()
}

fn attribute_as_f64(attr: &Attribute) -> Option<f64> {
    if let Some(v) = attr.get_f64() {
        return v.first().copied();
    }
    if let Some(v) = attr.get_f32() {
        return v.first().copied().map(f64::from);
    }
    if let Some(v) = attr.get_i32() {
        return v.first().copied().map(f64::from);
    }
    if let Some(v) = attr.get_i16() {
        return v.first().copied().map(f64::from);
    }
    attr.get_i8().and_then(|v| v.first().copied().map(f64::from))
}

fn attribute_to_string(attr: &Attribute) -> String {
    if let Some(text) = attr.get_as_string() {
        return trim_padding(&text);
    }

    fn join<T: ToString>(values: &[T]) -> String {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    attr.get_f64()
        .map(join)
        .or_else(|| attr.get_f32().map(join))
        .or_else(|| attr.get_i32().map(join))
        .or_else(|| attr.get_i16().map(join))
        .or_else(|| attr.get_i8().map(join))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileExtractor;
    use netcdf3::{FileWriter, Version};
    use tempfile::TempDir;

    const FILL: f32 = 99_999.0;

    /// Two profiles of three levels in CDF-1, covering f64, f32, i16 and
    /// char variables.
    ///
    /// Profile 0 TEMP holds the missing marker, a reading and NaN. Profile 1
    /// has a fill-valued latitude and one fill-valued TEMP level.
    fn write_float_file(path: &Path) {
        let mut data_set = DataSet::new();
        data_set.add_fixed_dim("N_PROF", 2).unwrap();
        data_set.add_fixed_dim("N_LEVELS", 3).unwrap();
        data_set.add_fixed_dim("STRING8", 8).unwrap();

        data_set.add_global_attr_string("platform_number", "2902746").unwrap();
        data_set.add_global_attr_string("institution", "INCOIS").unwrap();
        data_set.add_global_attr_i32("cycles", vec![12, 13]).unwrap();

        data_set.add_var_u8("PLATFORM_NUMBER", &["N_PROF", "STRING8"]).unwrap();
        data_set.add_var_f64("LATITUDE", &["N_PROF"]).unwrap();
        data_set
            .add_var_attr_f64("LATITUDE", FILL_VALUE_ATTR, vec![f64::from(FILL)])
            .unwrap();
        data_set.add_var_f64("LONGITUDE", &["N_PROF"]).unwrap();
        data_set.add_var_f64("JULD", &["N_PROF"]).unwrap();
        data_set.add_var_f32("PRES", &["N_PROF", "N_LEVELS"]).unwrap();
        data_set.add_var_f32("TEMP", &["N_PROF", "N_LEVELS"]).unwrap();
        data_set
            .add_var_attr_f32("TEMP", FILL_VALUE_ATTR, vec![FILL])
            .unwrap();
        data_set.add_var_u8("TEMP_QC", &["N_PROF", "N_LEVELS"]).unwrap();
        data_set.add_var_i16("DOXY", &["N_PROF", "N_LEVELS"]).unwrap();
        data_set
            .add_var_attr_i16("DOXY", FILL_VALUE_ATTR, vec![-1])
            .unwrap();

        let mut writer = FileWriter::open(path).unwrap();
        writer.set_def(&data_set, Version::Classic, 0).unwrap();
        writer
            .write_var_u8("PLATFORM_NUMBER", b"2902746 2902746 ")
            .unwrap();
        writer
            .write_var_f64("LATITUDE", &[-0.5, f64::from(FILL)])
            .unwrap();
        writer.write_var_f64("LONGITUDE", &[72.25, 73.0]).unwrap();
        writer.write_var_f64("JULD", &[26_722.5, 26_732.5]).unwrap();
        writer
            .write_var_f32("PRES", &[0.0, 10.0, 20.0, 0.0, 10.0, 20.0])
            .unwrap();
        writer
            .write_var_f32("TEMP", &[-999.0, 12.5, f32::NAN, 28.0, FILL, 27.5])
            .unwrap();
        writer.write_var_u8("TEMP_QC", b"114141").unwrap();
        writer
            .write_var_i16("DOXY", &[200, -1, 210, -1, -1, -1])
            .unwrap();
        writer.close().unwrap();
    }

    fn float_file() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("D2902746_012.nc");
        write_float_file(&path);
        (temp_dir, path)
    }

    #[test]
    fn test_open_rejects_non_netcdf() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("float.nc");
        std::fs::write(&path, b"definitely not a netcdf header").unwrap();

        let err = NetcdfContainer::open(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
        assert_eq!(err.status_code(), "PARSE_FAILURE");
        assert!(!validate(&path));
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!validate(temp_dir.path().join("absent.nc")));
    }

    #[test]
    fn test_char_variables_split_into_rows() {
        let (_dir, path) = float_file();
        let mut container = NetcdfContainer::open(&path).unwrap();

        assert_eq!(
            container.read_text_rows("PLATFORM_NUMBER").unwrap(),
            vec!["2902746", "2902746"]
        );
        assert_eq!(
            container.read_text_rows("TEMP_QC").unwrap(),
            vec!["114", "141"]
        );
        assert!(matches!(
            container.read_numeric("TEMP_QC"),
            Err(ExtractError::Read { .. })
        ));
    }

    #[test]
    fn test_fill_values_read_as_nan() {
        let (_dir, path) = float_file();
        let mut container = NetcdfContainer::open(&path).unwrap();

        let latitude = container.read_numeric("LATITUDE").unwrap();
        assert_eq!(latitude[0], -0.5);
        assert!(latitude[1].is_nan());

        let temp = container.read_numeric("TEMP").unwrap();
        assert_eq!(temp[0], -999.0);
        assert_eq!(temp[1], 12.5);
        assert!(temp[2].is_nan());
        assert!(temp[4].is_nan());

        let doxy = container.read_numeric("DOXY").unwrap();
        assert_eq!(doxy[0], 200.0);
        assert!(doxy[1].is_nan());
        assert_eq!(doxy[2], 210.0);

        // No _FillValue attribute: values pass through
        assert_eq!(
            container.read_numeric("LONGITUDE").unwrap(),
            vec![72.25, 73.0]
        );
    }

    #[test]
    fn test_layout_and_attributes() {
        let (_dir, path) = float_file();
        let container = NetcdfContainer::open(&path).unwrap();

        assert_eq!(container.dimension_len("N_PROF"), Some(2));
        assert_eq!(container.dimension_len("STRING8"), Some(8));
        assert!(container.has_variable("DOXY"));
        assert!(!container.has_variable("PSAL"));
        assert_eq!(
            container.global_attribute("institution").as_deref(),
            Some("INCOIS")
        );
        assert_eq!(container.global_attribute("cycles").as_deref(), Some("12 13"));
        assert_eq!(container.global_attribute("absent"), None);
    }

    #[test]
    fn test_extract_float_file_bytes() {
        let (_dir, path) = float_file();
        let bytes = std::fs::read(&path).unwrap();
        let extraction = ProfileExtractor::new().extract(&bytes).unwrap();

        assert_eq!(extraction.profiles.len(), 2);
        assert_eq!(extraction.metadata.float_id.as_deref(), Some("2902746"));
        assert_eq!(extraction.metadata.platform_number, "2902746");
        assert_eq!(extraction.metadata.dimensions.get("N_LEVELS"), Some(&3));

        let first = &extraction.profiles[0];
        assert_eq!(first.latitude, Some(-0.5));
        assert_eq!(
            first.measurements.codes().collect::<Vec<_>>(),
            vec!["TEMP", "PRES", "DOXY"]
        );
        let temp = first.measurements.get("TEMP").unwrap();
        assert_eq!(temp.values, vec![12.5]);
        assert_eq!(temp.pressure, vec![10.0]);
        assert_eq!(temp.qc_flags.as_deref(), Some("114"));
        let doxy = first.measurements.get("DOXY").unwrap();
        assert_eq!(doxy.values, vec![200.0, 210.0]);
        assert_eq!(doxy.pressure, vec![0.0, 20.0]);

        let second = &extraction.profiles[1];
        assert_eq!(second.latitude, None);
        assert_eq!(second.longitude, Some(73.0));
        let temp = second.measurements.get("TEMP").unwrap();
        assert_eq!(temp.values, vec![28.0, 27.5]);
        assert_eq!(temp.pressure, vec![0.0, 20.0]);
        assert!(second.measurements.get("DOXY").is_none());

        assert_eq!(extraction.trajectory.coordinates, vec![[72.25, -0.5]]);
        assert_eq!(extraction.trajectory.dates.len(), 1);
    }
}
