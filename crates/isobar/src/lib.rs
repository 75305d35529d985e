//! Isobar: derived vertical coordinates for gridded climate data.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Isobar sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use isobar::prelude::*;
//! use ndarray::array;
//!
//! let delta: Arc<dyn Coordinate> = Arc::new(
//!     AuxCoord::builder(array![0.0, 1.0, 2.0])
//!         .long_name("level_pressure")
//!         .units(Unit::pascal())
//!         .build()
//!         .unwrap(),
//! );
//! let sigma: Arc<dyn Coordinate> = Arc::new(
//!     AuxCoord::builder(array![1.0, 0.9, 0.8])
//!         .long_name("sigma")
//!         .build()
//!         .unwrap(),
//! );
//! let surface: Arc<dyn Coordinate> = Arc::new(
//!     AuxCoord::builder(array![[1000.0, 1010.0], [990.0, 1005.0]])
//!         .standard_name("surface_air_pressure")
//!         .units(Unit::pascal())
//!         .build()
//!         .unwrap(),
//! );
//!
//! let factory = HybridPressureFactory::builder()
//!     .delta(delta)
//!     .sigma(sigma)
//!     .surface_air_pressure(surface)
//!     .build()
//!     .unwrap();
//!
//! // (level, y, x): delta and sigma on the levels, surface on y and x.
//! let dims_of = |c: &dyn Coordinate| -> Option<Dims> {
//!     match c.name() {
//!         "level_pressure" | "sigma" => Some(Dims::from_slice(&[0])),
//!         "surface_air_pressure" => Some(Dims::from_slice(&[1, 2])),
//!         _ => None,
//!     }
//! };
//! let pressure = factory.make_coord(&dims_of).unwrap();
//! assert_eq!(pressure.shape(), &[3, 2, 2]);
//! assert_eq!(pressure.points()[[2, 1, 1]], 2.0 + 0.8 * 1005.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`coords`] | `isobar-core` | Units, coordinate metadata, the `Coordinate` trait, `AuxCoord` |
//! | [`factory`] | `isobar-factory` | The `AuxCoordFactory` trait, broadcasting, hybrid pressure |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Units, coordinate metadata and stored coordinates (`isobar-core`).
///
/// The [`coords::Coordinate`] trait is what factories consume;
/// [`coords::AuxCoord`] is what they produce.
pub use isobar_core as coords;

/// Derived-coordinate factories (`isobar-factory`).
///
/// [`factory::HybridPressureFactory`] computes
/// `delta + sigma * surface_air_pressure` over a grid.
pub use isobar_factory as factory;

/// Common imports for typical Isobar usage.
///
/// ```rust
/// use isobar::prelude::*;
/// ```
pub mod prelude {
    // Coordinates and units
    pub use isobar_core::{AuxCoord, CoordMetadata, Coordinate, Dims, Unit};

    // Factories
    pub use isobar_factory::{
        AuxCoordFactory, DimsOf, HybridPressureDeps, HybridPressureFactory, Role,
    };

    // Errors
    pub use isobar_core::{CoordError, UnitError};
    pub use isobar_factory::{DependencyError, FactoryError};
}
