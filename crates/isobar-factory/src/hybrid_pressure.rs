//! Atmospheric hybrid-pressure derived coordinate.
//!
//! ```text
//! pressure = delta + sigma * surface_air_pressure
//! ```
//!
//! `delta` is the level pressure offset, `sigma` the dimensionless
//! level coefficient, and `surface_air_pressure` the (usually 2-D)
//! surface pressure field. Each may be absent: a missing `delta`
//! contributes nothing to the sum, and the product term vanishes when
//! either `sigma` or `surface_air_pressure` is missing. The formula
//! stays defined as long as `delta` is present or both `sigma` and
//! `surface_air_pressure` are.

use crate::broadcast::{affine, Alignment, Mapped, Term};
use crate::error::{DependencyError, FactoryError};
use crate::factory::{map_dependency, AuxCoordFactory, DimsOf};
use indexmap::IndexMap;
use isobar_core::{AuxCoord, CoordMetadata, Coordinate, Unit};
use ndarray::ArrayViewD;
use std::fmt;
use std::sync::Arc;

/// CF standard name of the derived coordinate.
pub const STANDARD_NAME: &str = "air_pressure";

/// Most bounds a dependency may carry per cell.
const MAX_NBOUNDS: usize = 2;

/// Dependency slots of the hybrid-pressure formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Level pressure offset, in a pressure unit.
    Delta,
    /// Dimensionless level coefficient.
    Sigma,
    /// Surface air pressure, in the same unit as `delta`.
    SurfaceAirPressure,
}

impl Role {
    /// All roles in formula order.
    pub const ALL: [Role; 3] = [Role::Delta, Role::Sigma, Role::SurfaceAirPressure];

    /// Role name as used in dependency maps and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Sigma => "sigma",
            Self::SurfaceAirPressure => "surface_air_pressure",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three dependency slots, each present or absent.
///
/// Validation runs on a whole value of this type, so an update is
/// applied to a copy, validated, and only then swapped in.
#[derive(Clone, Debug, Default)]
pub struct HybridPressureDeps {
    /// Level pressure offset.
    pub delta: Option<Arc<dyn Coordinate>>,
    /// Level coefficient.
    pub sigma: Option<Arc<dyn Coordinate>>,
    /// Surface air pressure.
    pub surface_air_pressure: Option<Arc<dyn Coordinate>>,
}

impl HybridPressureDeps {
    /// The dependency in `role`'s slot.
    pub fn get(&self, role: Role) -> Option<&Arc<dyn Coordinate>> {
        match role {
            Role::Delta => self.delta.as_ref(),
            Role::Sigma => self.sigma.as_ref(),
            Role::SurfaceAirPressure => self.surface_air_pressure.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<Arc<dyn Coordinate>> {
        match role {
            Role::Delta => &mut self.delta,
            Role::Sigma => &mut self.sigma,
            Role::SurfaceAirPressure => &mut self.surface_air_pressure,
        }
    }

    /// The first slot (in formula order) holding exactly `coord`.
    pub fn role_of(&self, coord: &Arc<dyn Coordinate>) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|&role| self.get(role).is_some_and(|dep| Arc::ptr_eq(dep, coord)))
    }

    /// Check the set and return the unit of the derived coordinate.
    ///
    /// Metadata only: point and bound values are never read.
    ///
    /// # Errors
    ///
    /// - [`DependencyError::Insufficient`] if `delta` is absent and either
    ///   `sigma` or `surface_air_pressure` is absent
    /// - [`DependencyError::TooManyBounds`] if any dependency has more
    ///   than two bounds per cell
    /// - [`DependencyError::IncompatibleUnits`] if `delta` or
    ///   `surface_air_pressure` is not in a pressure unit, or `sigma` is
    ///   not dimensionless
    /// - [`DependencyError::MismatchedPressureUnits`] if `delta` and
    ///   `surface_air_pressure` units are not identical
    pub fn validate(&self) -> Result<Unit, DependencyError> {
        let (delta, sigma, surface) = (
            self.delta.as_deref(),
            self.sigma.as_deref(),
            self.surface_air_pressure.as_deref(),
        );

        if delta.is_none() && (sigma.is_none() || surface.is_none()) {
            return Err(DependencyError::Insufficient);
        }

        for role in Role::ALL {
            if let Some(dep) = self.get(role) {
                let nbounds = dep.nbounds();
                if nbounds > MAX_NBOUNDS {
                    return Err(DependencyError::TooManyBounds {
                        role: role.as_str(),
                        nbounds,
                    });
                }
            }
        }

        for (role, dep) in [(Role::Delta, delta), (Role::SurfaceAirPressure, surface)] {
            if let Some(dep) = dep {
                if !dep.units().is_pressure() {
                    return Err(DependencyError::IncompatibleUnits {
                        role: role.as_str(),
                        units: dep.units().to_string(),
                        expected: "Pa",
                    });
                }
            }
        }
        if let Some(sigma) = sigma {
            if !sigma.units().is_dimensionless() {
                return Err(DependencyError::IncompatibleUnits {
                    role: Role::Sigma.as_str(),
                    units: sigma.units().to_string(),
                    expected: "1",
                });
            }
        }

        match (delta, surface) {
            (Some(d), Some(s)) if d.units() != s.units() => {
                Err(DependencyError::MismatchedPressureUnits {
                    delta: d.units().to_string(),
                    surface_air_pressure: s.units().to_string(),
                })
            }
            (Some(d), _) => Ok(d.units().clone()),
            (None, Some(s)) => Ok(s.units().clone()),
            (None, None) => Err(DependencyError::Insufficient),
        }
    }
}

/// Factory for the hybrid-pressure derived coordinate.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use isobar_core::{AuxCoord, Coordinate, Dims, Unit};
/// use isobar_factory::{AuxCoordFactory, HybridPressureFactory};
/// use ndarray::array;
/// use smallvec::smallvec;
///
/// let delta: Arc<dyn Coordinate> = Arc::new(
///     AuxCoord::builder(array![0.0, 1.0, 2.0])
///         .long_name("level_pressure")
///         .units(Unit::pascal())
///         .build()
///         .unwrap(),
/// );
/// let factory = HybridPressureFactory::builder()
///     .delta(delta)
///     .build()
///     .unwrap();
/// assert_eq!(factory.standard_name(), Some("air_pressure"));
///
/// let pressure = factory
///     .make_coord(&|_: &dyn Coordinate| -> Option<Dims> { Some(smallvec![0]) })
///     .unwrap();
/// assert_eq!(pressure.shape(), &[3]);
/// ```
#[derive(Clone, Debug)]
pub struct HybridPressureFactory {
    deps: HybridPressureDeps,
    metadata: CoordMetadata,
}

impl HybridPressureFactory {
    /// Create a factory from a dependency set, validating it.
    ///
    /// # Errors
    ///
    /// Returns `Err(FactoryError::InvalidDependencies)` under the rules of
    /// [`HybridPressureDeps::validate`].
    pub fn new(deps: HybridPressureDeps) -> Result<Self, FactoryError> {
        let units = deps.validate()?;
        log::debug!(
            "hybrid pressure factory: delta={}, sigma={}, surface_air_pressure={}, units={units}",
            slot_name(&deps.delta),
            slot_name(&deps.sigma),
            slot_name(&deps.surface_air_pressure),
        );
        Ok(Self {
            deps,
            metadata: CoordMetadata::standard(STANDARD_NAME, units),
        })
    }

    /// Create a new builder with every slot absent.
    pub fn builder() -> HybridPressureFactoryBuilder {
        HybridPressureFactoryBuilder {
            deps: HybridPressureDeps::default(),
        }
    }

    /// Current level pressure offset.
    pub fn delta(&self) -> Option<&Arc<dyn Coordinate>> {
        self.deps.delta.as_ref()
    }

    /// Current level coefficient.
    pub fn sigma(&self) -> Option<&Arc<dyn Coordinate>> {
        self.deps.sigma.as_ref()
    }

    /// Current surface air pressure.
    pub fn surface_air_pressure(&self) -> Option<&Arc<dyn Coordinate>> {
        self.deps.surface_air_pressure.as_ref()
    }

    /// The current dependency set.
    pub fn deps(&self) -> &HybridPressureDeps {
        &self.deps
    }

    /// A copy of this factory with every present dependency swapped for
    /// `remap(dep)`.
    ///
    /// Used when the owning grid is copied along with its coordinates.
    ///
    /// # Errors
    ///
    /// Returns `Err(FactoryError::UnmappedDependency)` if `remap` returns
    /// `None` for a present dependency, or `Err(InvalidDependencies)` if
    /// the remapped set fails validation.
    pub fn updated<F>(&self, remap: F) -> Result<Self, FactoryError>
    where
        F: Fn(&Arc<dyn Coordinate>) -> Option<Arc<dyn Coordinate>>,
    {
        let mut deps = HybridPressureDeps::default();
        for role in Role::ALL {
            if let Some(dep) = self.deps.get(role) {
                let new = remap(dep).ok_or(FactoryError::UnmappedDependency {
                    role: role.as_str(),
                })?;
                *deps.slot_mut(role) = Some(new);
            }
        }
        Self::new(deps)
    }

    /// Aligned terms for every slot, in formula order.
    fn terms<'a>(
        mapped: &[Option<Mapped<'a>>; 3],
        align: impl Fn(&Mapped<'a>) -> Result<ArrayViewD<'a, f64>, FactoryError>,
    ) -> Result<[Term<'a>; 3], FactoryError> {
        let term = |m: &Option<Mapped<'a>>| -> Result<Term<'a>, FactoryError> {
            Ok(match m {
                Some(m) => Term::Present(align(m)?),
                None => Term::Absent,
            })
        };
        Ok([term(&mapped[0])?, term(&mapped[1])?, term(&mapped[2])?])
    }
}

impl AuxCoordFactory for HybridPressureFactory {
    fn metadata(&self) -> &CoordMetadata {
        &self.metadata
    }

    fn dependencies(&self) -> IndexMap<&'static str, Option<Arc<dyn Coordinate>>> {
        Role::ALL
            .into_iter()
            .map(|role| (role.as_str(), self.deps.get(role).cloned()))
            .collect()
    }

    fn make_coord(&self, dims_of: &DimsOf<'_>) -> Result<AuxCoord, FactoryError> {
        let mut mapped: [Option<Mapped<'_>>; 3] = [None, None, None];
        for (slot, role) in mapped.iter_mut().zip(Role::ALL) {
            if let Some(dep) = self.deps.get(role) {
                *slot = Some(map_dependency(role.as_str(), &**dep, dims_of)?);
            }
        }
        let present: Vec<Mapped<'_>> = mapped.iter().flatten().cloned().collect();
        let alignment = Alignment::new(&present)?;

        let [delta, sigma, surface] = Self::terms(&mapped, |m| alignment.points(m))?;
        let points = affine(alignment.shape(), &delta, &sigma, &surface)?;

        let nbounds = present.iter().map(|m| m.coord.nbounds()).max().unwrap_or(0);
        let bounds = if nbounds > 0 {
            let [delta, sigma, surface] = Self::terms(&mapped, |m| alignment.bounds(m))?;
            Some(affine(
                &alignment.bounds_shape(nbounds),
                &delta,
                &sigma,
                &surface,
            )?)
        } else {
            None
        };

        log::debug!(
            "hybrid pressure make_coord: derived dims {:?}, shape {:?}, nbounds {nbounds}",
            alignment.dims(),
            points.shape(),
        );

        Ok(AuxCoord::builder(points)
            .bounds_opt(bounds)
            .metadata(self.metadata.clone())
            .build()?)
    }

    fn update(
        &mut self,
        old: &Arc<dyn Coordinate>,
        new: Option<Arc<dyn Coordinate>>,
    ) -> Result<(), FactoryError> {
        let Some(role) = self.deps.role_of(old) else {
            log::debug!(
                "hybrid pressure update: '{}' is not a dependency, ignoring",
                old.name()
            );
            return Ok(());
        };

        let mut candidate = self.deps.clone();
        *candidate.slot_mut(role) = new;
        let units = candidate.validate().map_err(|e| {
            log::warn!("hybrid pressure update of {role} rejected: {e}");
            e
        })?;

        log::debug!(
            "hybrid pressure update: {role} '{}' -> {}",
            old.name(),
            candidate.get(role).map_or("None", |c| c.name()),
        );
        self.deps = candidate;
        self.metadata.units = units;
        Ok(())
    }
}

fn slot_name(slot: &Option<Arc<dyn Coordinate>>) -> &str {
    slot.as_deref().map_or("None", |c| c.name())
}

impl fmt::Display for HybridPressureFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HybridPressureFactory(delta={}, sigma={}, surface_air_pressure={})",
            slot_name(&self.deps.delta),
            slot_name(&self.deps.sigma),
            slot_name(&self.deps.surface_air_pressure),
        )
    }
}

/// Builder for [`HybridPressureFactory`].
///
/// Every slot starts absent; [`build`](Self::build) validates the set.
#[derive(Clone, Debug)]
pub struct HybridPressureFactoryBuilder {
    deps: HybridPressureDeps,
}

impl HybridPressureFactoryBuilder {
    /// Set the level pressure offset.
    pub fn delta(mut self, coord: Arc<dyn Coordinate>) -> Self {
        self.deps.delta = Some(coord);
        self
    }

    /// Set the level coefficient.
    pub fn sigma(mut self, coord: Arc<dyn Coordinate>) -> Self {
        self.deps.sigma = Some(coord);
        self
    }

    /// Set the surface air pressure.
    pub fn surface_air_pressure(mut self, coord: Arc<dyn Coordinate>) -> Self {
        self.deps.surface_air_pressure = Some(coord);
        self
    }

    /// Build the factory, validating the dependency set.
    ///
    /// # Errors
    ///
    /// Returns `Err(FactoryError::InvalidDependencies)` under the rules of
    /// [`HybridPressureDeps::validate`].
    pub fn build(self) -> Result<HybridPressureFactory, FactoryError> {
        HybridPressureFactory::new(self.deps)
    }
}
