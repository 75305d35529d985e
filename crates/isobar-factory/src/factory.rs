//! The [`AuxCoordFactory`] trait shared by derived-coordinate families.

use crate::broadcast::Mapped;
use crate::error::FactoryError;
use indexmap::IndexMap;
use isobar_core::{AuxCoord, CoordMetadata, Coordinate, Dims, Unit};
use std::fmt;
use std::sync::Arc;

/// Dimension mapping supplied by the owner of the grid: the grid
/// dimensions a coordinate spans, one per points axis, or `None` if the
/// coordinate does not belong to the grid.
pub type DimsOf<'a> = dyn Fn(&dyn Coordinate) -> Option<Dims> + 'a;

/// A derived coordinate computed on demand from dependency coordinates.
///
/// # Contract
///
/// - Dependencies are validated as a set when the factory is built and
///   on every [`update`](Self::update); a factory that exists always
///   holds a valid set.
/// - [`make_coord`](Self::make_coord) never mutates the factory and
///   returns a fresh coordinate each call.
/// - Dependencies are matched by `Arc` identity, never by value.
///
/// # Object safety
///
/// This trait is object-safe; a grid may hold its factories as
/// `Vec<Box<dyn AuxCoordFactory>>`.
pub trait AuxCoordFactory: fmt::Debug + Send + Sync {
    /// Metadata the derived coordinate will carry.
    fn metadata(&self) -> &CoordMetadata;

    /// Named dependency slots in a fixed role order. Absent slots are `None`.
    fn dependencies(&self) -> IndexMap<&'static str, Option<Arc<dyn Coordinate>>>;

    /// Synthesize the derived coordinate over the grid described by `dims_of`.
    fn make_coord(&self, dims_of: &DimsOf<'_>) -> Result<AuxCoord, FactoryError>;

    /// Replace the dependency `old` with `new` (or remove it with `None`).
    ///
    /// A no-op when `old` is not a current dependency. On error the
    /// factory is left unchanged.
    fn update(
        &mut self,
        old: &Arc<dyn Coordinate>,
        new: Option<Arc<dyn Coordinate>>,
    ) -> Result<(), FactoryError>;

    /// CF standard name of the derived coordinate.
    fn standard_name(&self) -> Option<&str> {
        self.metadata().standard_name.as_deref()
    }

    /// Long name of the derived coordinate.
    fn long_name(&self) -> Option<&str> {
        self.metadata().long_name.as_deref()
    }

    /// Variable name of the derived coordinate.
    fn var_name(&self) -> Option<&str> {
        self.metadata().var_name.as_deref()
    }

    /// Unit of the derived coordinate.
    fn units(&self) -> &Unit {
        &self.metadata().units
    }

    /// Coordinate system of the derived coordinate.
    fn coord_system(&self) -> Option<&str> {
        self.metadata().coord_system.as_deref()
    }

    /// Attributes of the derived coordinate.
    fn attributes(&self) -> &IndexMap<String, String> {
        &self.metadata().attributes
    }

    /// Most descriptive name of the derived coordinate.
    fn name(&self) -> &str {
        self.metadata().name()
    }

    /// Whether `coord` is one of the current dependencies.
    fn depends_on(&self, coord: &Arc<dyn Coordinate>) -> bool {
        self.dependencies()
            .values()
            .flatten()
            .any(|dep| Arc::ptr_eq(dep, coord))
    }

    /// Grid dimensions the derived coordinate spans: the sorted union of
    /// the dimensions of every present dependency.
    ///
    /// # Errors
    ///
    /// Returns `Err(FactoryError::UnmappedDependency)` if `dims_of` has no
    /// mapping for a present dependency.
    fn derived_dims(&self, dims_of: &DimsOf<'_>) -> Result<Dims, FactoryError> {
        let mut dims: Dims = Dims::new();
        for (role, dep) in self.dependencies() {
            if let Some(dep) = dep {
                let mapped = dims_of(&*dep).ok_or(FactoryError::UnmappedDependency { role })?;
                dims.extend(mapped);
            }
        }
        dims.sort_unstable();
        dims.dedup();
        Ok(dims)
    }
}

/// Pair a present dependency with its grid dimensions.
pub(crate) fn map_dependency<'a>(
    role: &'static str,
    coord: &'a dyn Coordinate,
    dims_of: &DimsOf<'_>,
) -> Result<Mapped<'a>, FactoryError> {
    let dims = dims_of(coord).ok_or(FactoryError::UnmappedDependency { role })?;
    Ok(Mapped { role, coord, dims })
}
