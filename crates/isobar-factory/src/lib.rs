//! Derived-coordinate factories for Isobar.
//!
//! A factory holds references to the coordinates a formula depends on,
//! validates them as a set, and on request synthesizes the derived
//! coordinate by broadcasting each dependency across the grid dimensions
//! it spans.
//!
//! - [`AuxCoordFactory`]: the contract every derived-coordinate family
//!   implements.
//! - [`HybridPressureFactory`]: `pressure = delta + sigma * surface_air_pressure`.
//! - [`broadcast`]: the shape-alignment routine shared by all families.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod broadcast;
pub mod error;
pub mod factory;
pub mod hybrid_pressure;

pub use broadcast::{Alignment, Mapped, Term};
pub use error::{DependencyError, FactoryError};
pub use factory::{AuxCoordFactory, DimsOf};
pub use hybrid_pressure::{
    HybridPressureDeps, HybridPressureFactory, HybridPressureFactoryBuilder, Role,
};
