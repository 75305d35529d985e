//! Test utilities and mock types for Isobar development.
//!
//! Provides a [`MockCoord`] that carries only a unit and a bound count
//! (enough for dependency validation, which never reads values), a
//! name-keyed [`DimTable`] standing in for a grid's dimension mapping,
//! and reusable coordinate [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use indexmap::IndexMap;
use isobar_core::{Coordinate, Dims, Unit};
use ndarray::{ArrayD, IxDyn};

/// Coordinate stand-in for validation tests.
///
/// Has no point or bound values: `points()` is an empty array and
/// `bounds()` is `None`, but `nbounds()` reports whatever the mock was
/// given so bound-count rules can be exercised.
#[derive(Debug)]
pub struct MockCoord {
    name: String,
    units: Unit,
    nbounds: usize,
    points: ArrayD<f64>,
}

impl MockCoord {
    pub fn new(name: impl Into<String>, units: Unit, nbounds: usize) -> Self {
        Self {
            name: name.into(),
            units,
            nbounds,
            points: ArrayD::zeros(IxDyn(&[0])),
        }
    }

    /// Shared mock parsed from a unit spelling.
    ///
    /// Panics on an unparseable spelling; test input only.
    pub fn shared(name: &str, units: &str, nbounds: usize) -> Arc<dyn Coordinate> {
        let units = Unit::parse(units).unwrap_or_else(|e| panic!("bad test unit: {e}"));
        Arc::new(Self::new(name, units, nbounds))
    }
}

impl Coordinate for MockCoord {
    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &Unit {
        &self.units
    }

    fn points(&self) -> &ArrayD<f64> {
        &self.points
    }

    fn bounds(&self) -> Option<&ArrayD<f64>> {
        None
    }

    fn nbounds(&self) -> usize {
        self.nbounds
    }
}

/// Dimension mapping keyed by coordinate name.
///
/// Mirrors what a grid answers for the coordinates it owns, without
/// needing a grid. Coordinates whose name is not in the table map to
/// `None`.
#[derive(Clone, Debug, Default)]
pub struct DimTable {
    dims: IndexMap<String, Dims>,
}

impl DimTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping from `name` to `dims`.
    pub fn with(mut self, name: impl Into<String>, dims: &[usize]) -> Self {
        self.dims.insert(name.into(), Dims::from_slice(dims));
        self
    }

    /// The grid dimensions of `coord`, looked up by name.
    pub fn dims_of(&self, coord: &dyn Coordinate) -> Option<Dims> {
        self.dims.get(coord.name()).cloned()
    }
}

/// Whether two dependency maps hold the same coordinates, by `Arc`
/// identity, under the same role names in the same order.
pub fn same_dependencies(
    a: &IndexMap<&'static str, Option<Arc<dyn Coordinate>>>,
    b: &IndexMap<&'static str, Option<Arc<dyn Coordinate>>>,
) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
            ka == kb
                && match (va, vb) {
                    (Some(x), Some(y)) => Arc::ptr_eq(x, y),
                    (None, None) => true,
                    _ => false,
                }
        })
}
