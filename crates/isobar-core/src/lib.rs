//! Core types and traits for Isobar derived coordinates.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared across the workspace: physical
//! units, the [`Coordinate`] trait that derived-coordinate factories
//! consume, the concrete [`AuxCoord`] value they produce, coordinate
//! metadata, and the core error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coord;
pub mod error;
pub mod metadata;
pub mod traits;
pub mod units;

pub use coord::{AuxCoord, AuxCoordBuilder, Dims};
pub use error::{CoordError, UnitError};
pub use metadata::CoordMetadata;
pub use traits::Coordinate;
pub use units::Unit;
