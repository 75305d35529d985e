//! Descriptive metadata shared by coordinates and the factories that derive them.

use crate::units::Unit;
use indexmap::IndexMap;

/// Name, unit and attribute metadata of a coordinate.
///
/// Attributes keep insertion order so that metadata round-trips through
/// writers in the order it was declared.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoordMetadata {
    /// CF standard name, e.g. `"air_pressure"`.
    pub standard_name: Option<String>,
    /// Free-form descriptive name.
    pub long_name: Option<String>,
    /// Variable name used when the coordinate is written to file.
    pub var_name: Option<String>,
    /// Physical unit of the points and bounds.
    pub units: Unit,
    /// Additional string attributes.
    pub attributes: IndexMap<String, String>,
    /// Name of the coordinate reference system, if any.
    pub coord_system: Option<String>,
}

impl CoordMetadata {
    /// Metadata with only a standard name and unit set.
    pub fn standard(standard_name: impl Into<String>, units: Unit) -> Self {
        Self {
            standard_name: Some(standard_name.into()),
            units,
            ..Self::default()
        }
    }

    /// The most descriptive available name: standard name, then long
    /// name, then variable name, then `"unknown"`.
    pub fn name(&self) -> &str {
        self.standard_name
            .as_deref()
            .or(self.long_name.as_deref())
            .or(self.var_name.as_deref())
            .unwrap_or("unknown")
    }
}
