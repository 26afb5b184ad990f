//! In-memory model of a gridded NetCDF file.

use std::collections::BTreeMap;

use crate::error::{NetCdfError, NetCdfResult};

/// A 1-D coordinate variable (`latitude`, `valid_time`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateVariable {
    pub values: Vec<f64>,
    /// CF `units` attribute, if present.
    pub units: Option<String>,
}

/// An N-D data variable, values laid out row-major over `dims`.
///
/// Scale/offset are already applied and fill values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DataVariable {
    pub dims: Vec<String>,
    pub values: Vec<f32>,
}

/// Dimensions, coordinates and data variables of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GriddedDataset {
    /// Label used in errors, usually the source path.
    pub source: String,
    pub dimensions: Vec<(String, usize)>,
    pub coordinates: BTreeMap<String, CoordinateVariable>,
    pub variables: BTreeMap<String, DataVariable>,
}

impl GriddedDataset {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_dimension(mut self, name: impl Into<String>, len: usize) -> Self {
        self.dimensions.push((name.into(), len));
        self
    }

    /// Add a coordinate; also registers a dimension of the same name if none exists.
    pub fn with_coordinate(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
        units: Option<&str>,
    ) -> Self {
        let name = name.into();
        if self.dimension_len(&name).is_none() {
            self.dimensions.push((name.clone(), values.len()));
        }
        self.coordinates.insert(
            name,
            CoordinateVariable {
                values,
                units: units.map(str::to_string),
            },
        );
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, dims: &[&str], values: Vec<f32>) -> Self {
        self.variables.insert(
            name.into(),
            DataVariable {
                dims: dims.iter().map(|d| d.to_string()).collect(),
                values,
            },
        );
        self
    }

    pub fn dimension_len(&self, name: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, len)| *len)
    }

    pub fn has_dimension_or_coordinate(&self, name: &str) -> bool {
        self.dimension_len(name).is_some() || self.coordinates.contains_key(name)
    }

    pub fn coordinate(&self, name: &str) -> NetCdfResult<&CoordinateVariable> {
        self.coordinates
            .get(name)
            .ok_or_else(|| NetCdfError::missing(&self.source, format!("coordinate '{name}'")))
    }

    pub fn variable(&self, name: &str) -> NetCdfResult<&DataVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| NetCdfError::missing(&self.source, format!("variable '{name}'")))
    }

    /// Check a variable's layout matches its dimension lengths.
    pub fn validate_variable(&self, name: &str) -> NetCdfResult<&DataVariable> {
        let var = self.variable(name)?;
        let mut expected = 1usize;
        for dim in &var.dims {
            let len = self
                .dimension_len(dim)
                .ok_or_else(|| NetCdfError::missing(&self.source, format!("dimension '{dim}'")))?;
            expected *= len;
        }
        if expected != var.values.len() {
            return Err(NetCdfError::invalid(
                &self.source,
                format!(
                    "variable '{name}' has {} values, dimensions {:?} need {expected}",
                    var.values.len(),
                    var.dims
                ),
            ));
        }
        Ok(var)
    }
}
