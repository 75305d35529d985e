//! The concrete auxiliary coordinate value and the [`Dims`] alias.

use crate::error::CoordError;
use crate::metadata::CoordMetadata;
use crate::traits::Coordinate;
use crate::units::Unit;
use indexmap::IndexMap;
use ndarray::{Array, Array2, ArrayD, Axis, Dimension, IxDyn};
use smallvec::SmallVec;

/// Ordered grid-dimension indices spanned by a coordinate, one per axis
/// of its points array (empty for scalar coordinates).
///
/// Inline storage covers the usual time/level/latitude/longitude grids
/// without allocating.
pub type Dims = SmallVec<[usize; 4]>;

/// A coordinate whose points (and optional bounds) are stored explicitly.
///
/// Points are always at least one-dimensional; a zero-dimensional input
/// is stored with shape `(1,)`. When present, bounds have the points
/// shape plus one trailing axis holding the bounds of each cell.
///
/// # Examples
///
/// ```
/// use isobar_core::{AuxCoord, Coordinate, Unit};
/// use ndarray::array;
///
/// let sigma = AuxCoord::builder(array![1.0, 0.9, 0.8])
///     .long_name("sigma")
///     .units(Unit::dimensionless())
///     .build()
///     .unwrap();
/// assert_eq!(sigma.name(), "sigma");
/// assert_eq!(sigma.nbounds(), 0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AuxCoord {
    points: ArrayD<f64>,
    bounds: Option<ArrayD<f64>>,
    metadata: CoordMetadata,
}

impl AuxCoord {
    /// Start building a coordinate from its points.
    pub fn builder<D: Dimension>(points: Array<f64, D>) -> AuxCoordBuilder {
        AuxCoordBuilder {
            points: points.into_dyn(),
            bounds: None,
            metadata: CoordMetadata::default(),
        }
    }

    /// Descriptive metadata.
    pub fn metadata(&self) -> &CoordMetadata {
        &self.metadata
    }

    /// CF standard name.
    pub fn standard_name(&self) -> Option<&str> {
        self.metadata.standard_name.as_deref()
    }

    /// Long name.
    pub fn long_name(&self) -> Option<&str> {
        self.metadata.long_name.as_deref()
    }

    /// Variable name.
    pub fn var_name(&self) -> Option<&str> {
        self.metadata.var_name.as_deref()
    }

    /// String attributes in declaration order.
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.metadata.attributes
    }

    /// Coordinate reference system name.
    pub fn coord_system(&self) -> Option<&str> {
        self.metadata.coord_system.as_deref()
    }

    /// Whether the coordinate carries bounds.
    pub fn has_bounds(&self) -> bool {
        self.bounds.is_some()
    }

    /// Give an unbounded 1-D coordinate contiguous bounds estimated from
    /// the spacing of its points.
    ///
    /// `bound_position` places each point within its cell: `0.0` puts the
    /// point on the lower edge, `0.5` in the middle, `1.0` on the upper
    /// edge. The first and last cells reuse the spacing of their only
    /// neighbour.
    ///
    /// # Errors
    ///
    /// Returns `Err(CoordError::GuessBounds)` if the coordinate already
    /// has bounds, is not 1-D, has fewer than two points, or
    /// `bound_position` is outside `[0, 1]`.
    pub fn guess_bounds(&mut self, bound_position: f64) -> Result<(), CoordError> {
        if self.bounds.is_some() {
            return Err(CoordError::GuessBounds {
                reason: format!("coordinate '{}' already has bounds", self.name()),
            });
        }
        if !(0.0..=1.0).contains(&bound_position) {
            return Err(CoordError::GuessBounds {
                reason: format!("bound_position must lie in [0, 1], got {bound_position}"),
            });
        }
        if self.points.ndim() != 1 {
            return Err(CoordError::GuessBounds {
                reason: format!(
                    "coordinate '{}' is {}-D, only 1-D coordinates are supported",
                    self.name(),
                    self.points.ndim()
                ),
            });
        }
        let n = self.points.len();
        if n < 2 {
            return Err(CoordError::GuessBounds {
                reason: format!(
                    "coordinate '{}' needs at least two points, has {n}",
                    self.name()
                ),
            });
        }

        let pts: Vec<f64> = self.points.iter().copied().collect();
        // steps[i] is the spacing below cell i; steps[i + 1] the spacing above.
        let mut steps = Vec::with_capacity(n + 1);
        steps.push(pts[1] - pts[0]);
        steps.extend(pts.windows(2).map(|w| w[1] - w[0]));
        steps.push(pts[n - 1] - pts[n - 2]);

        let mut bounds = Array2::<f64>::zeros((n, 2));
        for (i, mut row) in bounds.axis_iter_mut(Axis(0)).enumerate() {
            row[0] = pts[i] - steps[i] * bound_position;
            row[1] = pts[i] + steps[i + 1] * (1.0 - bound_position);
        }
        self.bounds = Some(bounds.into_dyn());
        Ok(())
    }
}

impl Coordinate for AuxCoord {
    fn name(&self) -> &str {
        self.metadata.name()
    }

    fn units(&self) -> &Unit {
        &self.metadata.units
    }

    fn points(&self) -> &ArrayD<f64> {
        &self.points
    }

    fn bounds(&self) -> Option<&ArrayD<f64>> {
        self.bounds.as_ref()
    }
}

/// Builder for [`AuxCoord`].
///
/// Only the points are required. Unset names are `None`, the unit
/// defaults to dimensionless, and there are no bounds or attributes.
#[derive(Clone, Debug)]
pub struct AuxCoordBuilder {
    points: ArrayD<f64>,
    bounds: Option<ArrayD<f64>>,
    metadata: CoordMetadata,
}

impl AuxCoordBuilder {
    /// Set the cell bounds.
    pub fn bounds<D: Dimension>(mut self, bounds: Array<f64, D>) -> Self {
        self.bounds = Some(bounds.into_dyn());
        self
    }

    /// Set bounds from an already type-erased array, or clear them.
    pub fn bounds_opt(mut self, bounds: Option<ArrayD<f64>>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the CF standard name.
    pub fn standard_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.standard_name = Some(name.into());
        self
    }

    /// Set the long name.
    pub fn long_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.long_name = Some(name.into());
        self
    }

    /// Set the variable name.
    pub fn var_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.var_name = Some(name.into());
        self
    }

    /// Set the unit (default: dimensionless).
    pub fn units(mut self, units: Unit) -> Self {
        self.metadata.units = units;
        self
    }

    /// Add one string attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the coordinate reference system name.
    pub fn coord_system(mut self, name: impl Into<String>) -> Self {
        self.metadata.coord_system = Some(name.into());
        self
    }

    /// Replace all metadata at once.
    pub fn metadata(mut self, metadata: CoordMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Build the coordinate, validating array shapes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - the points array is empty (`CoordError::EmptyPoints`)
    /// - the bounds shape is not the points shape plus one trailing axis
    ///   (`CoordError::BoundsShapeMismatch`)
    pub fn build(self) -> Result<AuxCoord, CoordError> {
        if self.points.is_empty() {
            return Err(CoordError::EmptyPoints);
        }
        let points = if self.points.ndim() == 0 {
            self.points
                .into_shape_with_order(IxDyn(&[1]))
                .map_err(|_| CoordError::EmptyPoints)?
        } else {
            self.points
        };

        if let Some(bounds) = &self.bounds {
            let shape = bounds.shape();
            let extends_points = shape.len() == points.ndim() + 1
                && &shape[..points.ndim()] == points.shape()
                && shape[points.ndim()] > 0;
            if !extends_points {
                return Err(CoordError::BoundsShapeMismatch {
                    points: points.shape().to_vec(),
                    bounds: shape.to_vec(),
                });
            }
        }

        Ok(AuxCoord {
            points,
            bounds: self.bounds,
            metadata: self.metadata,
        })
    }
}
