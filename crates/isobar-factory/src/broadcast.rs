//! Broadcasting dependency arrays across the grid dimensions they span.
//!
//! Dependencies of a derived coordinate live on different subsets of the
//! owning grid's dimensions. [`Alignment`] reconciles them: it computes the
//! derived dimensions (the sorted union of every dependency's dimensions),
//! the output shape, and for each dependency a zero-copy view whose axes
//! follow increasing grid-dimension order with size-1 stand-ins for the
//! dimensions it does not span. Those views combine elementwise under the
//! usual broadcasting rule without replicating data.
//!
//! # Example
//!
//! `delta` on dimension 0 (length 3) and `surface_air_pressure` on
//! dimensions 1 and 2 (2 x 2) align as `(3, 1, 1)` and `(1, 2, 2)` onto
//! the output shape `(3, 2, 2)`.

use crate::error::FactoryError;
use isobar_core::{Coordinate, Dims};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// A present dependency paired with the grid dimensions it spans.
#[derive(Clone, Debug)]
pub struct Mapped<'a> {
    /// Role name of the dependency within its factory.
    pub role: &'static str,
    /// The dependency itself.
    pub coord: &'a dyn Coordinate,
    /// Grid dimensions of its points axes, in the coordinate's own axis order.
    pub dims: Dims,
}

/// The derived dimensions and output shape for a set of mapped dependencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    dims: Dims,
    shape: Vec<usize>,
}

impl Alignment {
    /// Compute the alignment of `mapped`, checking the mapping as it goes.
    ///
    /// A dependency with an empty mapping is a scalar coordinate and must
    /// hold exactly one point.
    ///
    /// # Errors
    ///
    /// Returns `Err(FactoryError::BroadcastShape)` if a dependency's
    /// mapping does not have one distinct grid dimension per points axis,
    /// or if two dependencies disagree on the length of a shared grid
    /// dimension.
    pub fn new(mapped: &[Mapped<'_>]) -> Result<Self, FactoryError> {
        // grid dimension -> (length, first role seen on it)
        let mut sizes: BTreeMap<usize, (usize, &'static str)> = BTreeMap::new();

        for m in mapped {
            let shape = m.coord.shape();
            if m.dims.is_empty() {
                if m.coord.points().len() != 1 {
                    return Err(FactoryError::BroadcastShape {
                        reason: format!(
                            "'{}' maps to no grid dimension but has shape {shape:?}",
                            m.role
                        ),
                    });
                }
                continue;
            }
            if m.dims.len() != shape.len() {
                return Err(FactoryError::BroadcastShape {
                    reason: format!(
                        "'{}' has shape {shape:?} but maps to grid dimensions {:?}",
                        m.role, m.dims
                    ),
                });
            }
            let mut sorted = m.dims.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                return Err(FactoryError::BroadcastShape {
                    reason: format!(
                        "'{}' maps more than one axis to the same grid dimension: {:?}",
                        m.role, m.dims
                    ),
                });
            }

            for (&dim, &len) in m.dims.iter().zip(shape) {
                match sizes.entry(dim) {
                    Entry::Occupied(seen) => {
                        let (seen_len, seen_role) = *seen.get();
                        if seen_len != len {
                            return Err(FactoryError::BroadcastShape {
                                reason: format!(
                                    "grid dimension {dim} has length {seen_len} in \
                                     '{seen_role}' but {len} in '{}'",
                                    m.role
                                ),
                            });
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((len, m.role));
                    }
                }
            }
        }

        let dims: Dims = sizes.keys().copied().collect();
        let mut shape: Vec<usize> = sizes.values().map(|&(len, _)| len).collect();
        // Coordinates are at least 1-D, even when nothing spans the grid.
        if shape.is_empty() {
            shape.push(1);
        }
        Ok(Self { dims, shape })
    }

    /// Derived grid dimensions, ascending.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Shape of the derived points array.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Shape of the derived bounds array for `nbounds` bounds per cell.
    pub fn bounds_shape(&self, nbounds: usize) -> Vec<usize> {
        let mut shape = self.shape.clone();
        shape.push(nbounds);
        shape
    }

    /// View of a dependency's points aligned onto [`shape`](Self::shape).
    ///
    /// # Errors
    ///
    /// Returns `Err(FactoryError::BroadcastShape)` if `m` was not part of
    /// the set this alignment was computed from.
    pub fn points<'a>(&self, m: &Mapped<'a>) -> Result<ArrayViewD<'a, f64>, FactoryError> {
        let coord: &'a dyn Coordinate = m.coord;
        self.align(m.role, coord.points().view(), &m.dims, false)
    }

    /// View of a dependency's bounds aligned onto
    /// [`bounds_shape`](Self::bounds_shape).
    ///
    /// An unbounded dependency contributes its points with a trailing
    /// size-1 axis, which broadcasts across every bound of the cell.
    pub fn bounds<'a>(&self, m: &Mapped<'a>) -> Result<ArrayViewD<'a, f64>, FactoryError> {
        let coord: &'a dyn Coordinate = m.coord;
        match coord.bounds() {
            Some(bounds) if coord.nbounds() > 0 => {
                self.align(m.role, bounds.view(), &m.dims, true)
            }
            _ => {
                let points = self.points(m)?;
                let trailing = points.ndim();
                Ok(points.insert_axis(Axis(trailing)))
            }
        }
    }

    fn align<'a>(
        &self,
        role: &'static str,
        mut view: ArrayViewD<'a, f64>,
        dims: &[usize],
        trailing: bool,
    ) -> Result<ArrayViewD<'a, f64>, FactoryError> {
        let keep = usize::from(trailing);

        if dims.is_empty() {
            // Scalar coordinate: drop its unit axes so it broadcasts as a value.
            while view.ndim() > keep {
                if view.shape()[0] != 1 {
                    return Err(FactoryError::BroadcastShape {
                        reason: format!(
                            "'{role}' maps to no grid dimension but has shape {:?}",
                            view.shape()
                        ),
                    });
                }
                view = view.index_axis_move(Axis(0), 0);
            }
        } else {
            if view.ndim() != dims.len() + keep || dims.iter().any(|d| !self.dims.contains(d)) {
                return Err(FactoryError::BroadcastShape {
                    reason: format!(
                        "'{role}' with shape {:?} and grid dimensions {dims:?} does not \
                         belong to alignment over {:?}",
                        view.shape(),
                        self.dims
                    ),
                });
            }
            // Transpose into ascending grid order; the bounds axis stays last.
            let mut order: Vec<usize> = (0..dims.len()).collect();
            order.sort_by_key(|&axis| dims[axis]);
            if trailing {
                order.push(dims.len());
            }
            view = view.permuted_axes(order);
        }

        for (pos, dim) in self.dims.iter().enumerate() {
            if !dims.contains(dim) {
                view = view.insert_axis(Axis(pos));
            }
        }
        if self.dims.is_empty() {
            view = view.insert_axis(Axis(0));
        }
        Ok(view)
    }
}

/// One term of a derived-coordinate formula.
///
/// `Absent` stands for a dependency that is not set; what it means
/// numerically is decided by [`affine`], not by the caller.
#[derive(Clone, Debug)]
pub enum Term<'a> {
    /// Aligned data of a present dependency.
    Present(ArrayViewD<'a, f64>),
    /// The dependency is not set.
    Absent,
}

impl<'a> Term<'a> {
    /// Returns `true` for [`Term::Present`].
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl<'a> From<Option<ArrayViewD<'a, f64>>> for Term<'a> {
    fn from(view: Option<ArrayViewD<'a, f64>>) -> Self {
        view.map_or(Self::Absent, Self::Present)
    }
}

/// Evaluate `offset + factor * field` over an output of `shape`.
///
/// Absent terms take their identity: an absent `offset` contributes 0,
/// and the product contributes 0 when either `factor` or `field` is
/// absent. Present terms must broadcast to `shape`.
///
/// # Errors
///
/// Returns `Err(FactoryError::BroadcastShape)` if a present term does not
/// broadcast to `shape`.
pub fn affine(
    shape: &[usize],
    offset: &Term<'_>,
    factor: &Term<'_>,
    field: &Term<'_>,
) -> Result<ArrayD<f64>, FactoryError> {
    let mut out = ArrayD::<f64>::zeros(IxDyn(shape));

    if let Term::Present(offset) = offset {
        let offset = broadcast_to(offset, shape)?;
        out.zip_mut_with(&offset, |o, &x| *o += x);
    }

    if let (Term::Present(factor), Term::Present(field)) = (factor, field) {
        let factor = broadcast_to(factor, shape)?;
        let field = broadcast_to(field, shape)?;
        Zip::from(&mut out)
            .and(&factor)
            .and(&field)
            .for_each(|o, &a, &b| *o += a * b);
    }

    Ok(out)
}

fn broadcast_to<'b>(
    view: &'b ArrayViewD<'_, f64>,
    shape: &[usize],
) -> Result<ArrayViewD<'b, f64>, FactoryError> {
    view.broadcast(shape)
        .ok_or_else(|| FactoryError::BroadcastShape {
            reason: format!("shape {:?} does not broadcast to {shape:?}", view.shape()),
        })
}
