//! Error types for factory construction, update and coordinate synthesis.

use isobar_core::CoordError;
use std::error::Error;
use std::fmt;

/// Why a set of dependencies cannot define the derived coordinate.
///
/// Raised at construction and update time only; a factory that holds a
/// valid set never produces one of these during synthesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DependencyError {
    /// Too few dependencies are present for the formula to be defined.
    Insufficient,
    /// A dependency's unit is not convertible to the unit its role needs.
    IncompatibleUnits {
        /// Role of the offending dependency.
        role: &'static str,
        /// The unit it carries.
        units: String,
        /// The unit it must be convertible to.
        expected: &'static str,
    },
    /// `delta` and `surface_air_pressure` are convertible but not identical.
    MismatchedPressureUnits {
        /// Unit of `delta`.
        delta: String,
        /// Unit of `surface_air_pressure`.
        surface_air_pressure: String,
    },
    /// A dependency carries more than two bounds per cell.
    TooManyBounds {
        /// Role of the offending dependency.
        role: &'static str,
        /// Its bound count.
        nbounds: usize,
    },
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insufficient => write!(
                f,
                "insufficient source coordinates: need delta, or both sigma \
                 and surface_air_pressure"
            ),
            Self::IncompatibleUnits {
                role,
                units,
                expected,
            } => write!(
                f,
                "{role} has unit '{units}', which is not convertible to '{expected}'"
            ),
            Self::MismatchedPressureUnits {
                delta,
                surface_air_pressure,
            } => write!(
                f,
                "delta ('{delta}') and surface_air_pressure ('{surface_air_pressure}') \
                 must have identical units"
            ),
            Self::TooManyBounds { role, nbounds } => {
                write!(f, "{role} has {nbounds} bounds per cell, at most 2 allowed")
            }
        }
    }
}

impl Error for DependencyError {}

/// Errors from a derived-coordinate factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactoryError {
    /// The dependency set failed validation.
    InvalidDependencies(DependencyError),
    /// The dimension mapping yields shapes that cannot be aligned.
    ///
    /// This indicates an inconsistent mapping from the caller, not a
    /// recoverable condition.
    BroadcastShape {
        /// What could not be aligned.
        reason: String,
    },
    /// The dimension mapping (or a remap table) has no entry for a
    /// present dependency.
    UnmappedDependency {
        /// Role of the dependency that could not be mapped.
        role: &'static str,
    },
    /// The synthesized arrays were rejected by the coordinate constructor.
    Coord(CoordError),
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDependencies(e) => write!(f, "invalid dependencies: {e}"),
            Self::BroadcastShape { reason } => write!(f, "cannot broadcast: {reason}"),
            Self::UnmappedDependency { role } => {
                write!(f, "dependency '{role}' has no dimension mapping")
            }
            Self::Coord(e) => write!(f, "cannot build derived coordinate: {e}"),
        }
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDependencies(e) => Some(e),
            Self::Coord(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DependencyError> for FactoryError {
    fn from(e: DependencyError) -> Self {
        Self::InvalidDependencies(e)
    }
}

impl From<CoordError> for FactoryError {
    fn from(e: CoordError) -> Self {
        Self::Coord(e)
    }
}
