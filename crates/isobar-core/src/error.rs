//! Error types for unit parsing and coordinate construction.

use std::error::Error;
use std::fmt;

/// Errors from parsing a unit spelling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitError {
    /// The spelling is not a known unit symbol, optionally SI-prefixed.
    Unrecognised {
        /// The spelling that failed to parse.
        spelling: String,
    },
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognised { spelling } => write!(f, "unrecognised unit '{spelling}'"),
        }
    }
}

impl Error for UnitError {}

/// Errors arising from coordinate construction or bounds estimation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordError {
    /// The points array has no elements.
    EmptyPoints,
    /// The bounds array is not the points shape plus one trailing axis.
    BoundsShapeMismatch {
        /// Shape of the points array.
        points: Vec<usize>,
        /// Shape of the offending bounds array.
        bounds: Vec<usize>,
    },
    /// Bounds could not be guessed for this coordinate.
    GuessBounds {
        /// What prevented the guess.
        reason: String,
    },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPoints => write!(f, "coordinate must have at least one point"),
            Self::BoundsShapeMismatch { points, bounds } => {
                write!(
                    f,
                    "bounds shape {bounds:?} does not extend points shape {points:?} \
                     by one trailing axis"
                )
            }
            Self::GuessBounds { reason } => write!(f, "cannot guess bounds: {reason}"),
        }
    }
}

impl Error for CoordError {}
