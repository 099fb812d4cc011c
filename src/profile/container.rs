//! Read access to a self-describing array file.
//!
//! The extractor only needs a handful of operations from a container, so
//! they are collected in [`ArrayContainer`]. NetCDF files implement it in
//! [`crate::profile::NetcdfContainer`]; [`MemoryContainer`] holds decoded
//! arrays directly.

use crate::error::{ExtractError, ExtractResult};

/// Operations the extractor performs on a container.
///
/// Multi-dimensional variables are read flattened in row-major order.
/// Numeric reads return NaN where the file marks a value as missing.
pub trait ArrayContainer {
    /// Length of a named dimension, if the container defines it.
    fn dimension_len(&self, name: &str) -> Option<usize>;

    /// Every dimension with its length.
    fn dimensions(&self) -> Vec<(String, usize)>;

    /// Names of every variable, in file order.
    fn variable_names(&self) -> Vec<String>;

    fn has_variable(&self, name: &str) -> bool;

    /// A global attribute rendered as a string.
    fn global_attribute(&self, name: &str) -> Option<String>;

    /// Reads a numeric variable as `f64`.
    fn read_numeric(&mut self, name: &str) -> ExtractResult<Vec<f64>>;

    /// Reads a character variable as one string per row of its first
    /// dimension, with padding trimmed.
    fn read_text_rows(&mut self, name: &str) -> ExtractResult<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq)]
enum MemoryVariable {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

/// Container built in memory.
///
/// ```
/// use floatrag::profile::{ArrayContainer, MemoryContainer};
///
/// let mut container = MemoryContainer::new()
///     .dimension("N_PROF", 1)
///     .attribute("institution", "AOML")
///     .numeric("LATITUDE", vec![12.5]);
///
/// assert_eq!(container.dimension_len("N_PROF"), Some(1));
/// assert_eq!(container.read_numeric("LATITUDE").unwrap(), vec![12.5]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryContainer {
    dimensions: Vec<(String, usize)>,
    attributes: Vec<(String, String)>,
    variables: Vec<(String, MemoryVariable)>,
}

impl MemoryContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dimension(mut self, name: impl Into<String>, len: usize) -> Self {
        self.dimensions.push((name.into(), len));
        self
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Adds a numeric variable, flattened row-major.
    #[must_use]
    pub fn numeric(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.variables
            .push((name.into(), MemoryVariable::Numeric(values)));
        self
    }

    /// Adds a character variable, one string per row.
    #[must_use]
    pub fn text<S: Into<String>>(mut self, name: impl Into<String>, rows: Vec<S>) -> Self {
        let rows = rows.into_iter().map(Into::into).collect();
        self.variables.push((name.into(), MemoryVariable::Text(rows)));
        self
    }

    fn variable(&self, name: &str) -> ExtractResult<&MemoryVariable> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| ExtractError::Read {
                name: name.to_string(),
                reason: "no such variable".to_string(),
            })
    }
}

impl ArrayContainer for MemoryContainer {
    fn dimension_len(&self, name: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, len)| *len)
    }

    fn dimensions(&self) -> Vec<(String, usize)> {
        self.dimensions.clone()
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|(n, _)| n.clone()).collect()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|(n, _)| n == name)
    }

    fn global_attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn read_numeric(&mut self, name: &str) -> ExtractResult<Vec<f64>> {
        match self.variable(name)? {
            MemoryVariable::Numeric(values) => Ok(values.clone()),
            MemoryVariable::Text(_) => Err(ExtractError::Read {
                name: name.to_string(),
                reason: "character variable read as numeric".to_string(),
            }),
        }
    }

    fn read_text_rows(&mut self, name: &str) -> ExtractResult<Vec<String>> {
        match self.variable(name)? {
            MemoryVariable::Text(rows) => Ok(rows.iter().map(|r| trim_padding(r)).collect()),
            MemoryVariable::Numeric(values) => {
                Ok(values.iter().map(ToString::to_string).collect())
            }
        }
    }
}

/// Strips the blank and NUL padding of fixed-width character rows.
pub(crate) fn trim_padding(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
