//! The read-only coordinate abstraction consumed by derived-coordinate factories.

use crate::units::Unit;
use ndarray::ArrayD;
use std::fmt;

/// Read-only view of a coordinate.
///
/// Factories hold dependencies as `Arc<dyn Coordinate>` and never mutate
/// them. Identity, when a factory matches a dependency to replace, is
/// pointer identity of that `Arc`, not value equality.
///
/// Implemented by [`AuxCoord`](crate::AuxCoord); test code implements it
/// on mocks that carry only a unit and a bound count.
pub trait Coordinate: fmt::Debug + Send + Sync {
    /// Most descriptive name of the coordinate.
    fn name(&self) -> &str;

    /// Unit of the points and bounds.
    fn units(&self) -> &Unit;

    /// Point values, one per cell.
    fn points(&self) -> &ArrayD<f64>;

    /// Cell bounds: the points shape plus a trailing axis of length
    /// [`nbounds`](Self::nbounds). `None` when unbounded.
    fn bounds(&self) -> Option<&ArrayD<f64>>;

    /// Number of bounds per cell, 0 when unbounded.
    fn nbounds(&self) -> usize {
        self.bounds()
            .and_then(|b| b.shape().last().copied())
            .unwrap_or(0)
    }

    /// Shape of the points array.
    fn shape(&self) -> &[usize] {
        self.points().shape()
    }
}
